use anyhow::{Context, Result};
use regex::Regex;

use crate::model::{CertificationCode, NameParts, ParsedRow, UnresolvedRow};
use crate::util::normalize_whitespace;

pub const COMMA_NAME_CONFIDENCE: f64 = 0.95;
pub const TWO_TOKEN_CONFIDENCE: f64 = 0.85;
pub const SHORT_MIDDLE_CONFIDENCE: f64 = 0.75;
pub const LONG_MIDDLE_CONFIDENCE: f64 = 0.60;
pub const MIN_RESOLVED_CONFIDENCE: f64 = 0.70;

pub const REASON_UNPARSEABLE: &str = "Could not parse this name.";
pub const REASON_TOO_FEW_TOKENS: &str = "Name requires at least first and last.";
pub const REASON_LOW_CONFIDENCE: &str = "Low confidence parse. Please confirm first/middle/last.";

#[derive(Debug, Clone, PartialEq)]
pub enum RowOutcome {
    Resolved(ParsedRow),
    Unresolved(UnresolvedRow),
}

impl RowOutcome {
    pub fn with_raw(self, raw: &str) -> Self {
        match self {
            Self::Resolved(row) => Self::Resolved(ParsedRow {
                raw: raw.to_string(),
                ..row
            }),
            Self::Unresolved(row) => Self::Unresolved(UnresolvedRow {
                raw: raw.to_string(),
                ..row
            }),
        }
    }

    pub fn with_confidence(self, confidence: f64) -> Self {
        match self {
            Self::Resolved(row) => Self::Resolved(ParsedRow { confidence, ..row }),
            unresolved => unresolved,
        }
    }
}

#[derive(Debug)]
pub struct NameTokenizer {
    name_noise: Regex,
    suggestion_noise: Regex,
    apostrophe_run: Regex,
}

impl NameTokenizer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            name_noise: Regex::new(r"[^A-Za-z' -]").context("failed to compile name noise regex")?,
            suggestion_noise: Regex::new(r"[^A-Za-z0-9' -]")
                .context("failed to compile suggestion noise regex")?,
            apostrophe_run: Regex::new(r"'+").context("failed to compile apostrophe regex")?,
        })
    }

    pub fn clean_token(&self, input: &str) -> String {
        self.name_noise
            .replace_all(input, "")
            .split_whitespace()
            .filter(|token| token.chars().any(|ch| ch.is_ascii_alphabetic()))
            .collect::<Vec<&str>>()
            .join(" ")
    }

    pub fn title_case(&self, input: &str) -> String {
        let lowered = input.to_lowercase();
        let mut out = String::with_capacity(lowered.len());
        let mut segment_start = true;

        for ch in lowered.chars() {
            if ch == ' ' || ch == '-' {
                out.push(ch);
                segment_start = true;
            } else if segment_start {
                out.extend(ch.to_uppercase());
                segment_start = false;
            } else {
                out.push(ch);
            }
        }

        self.apostrophe_run.replace_all(&out, "'").into_owned()
    }

    pub fn token_count(&self, input: &str) -> usize {
        self.clean_token(input).split_whitespace().count()
    }

    pub fn parse_freeform_name(
        &self,
        raw: &str,
        required_cert_codes: &[CertificationCode],
    ) -> Option<RowOutcome> {
        if raw.trim().is_empty() {
            return None;
        }

        let compact = normalize_whitespace(raw);

        if let Some((last_part, first_part)) = compact.split_once(',') {
            let cleaned_first = self.clean_token(first_part);
            let first_tokens = cleaned_first.split_whitespace().collect::<Vec<&str>>();
            let last_name = self.title_case(&self.clean_token(last_part));

            let Some((first_token, middle_tokens)) = first_tokens.split_first() else {
                return Some(self.fallback(raw, REASON_UNPARSEABLE, required_cert_codes));
            };
            if last_name.is_empty() {
                return Some(self.fallback(raw, REASON_UNPARSEABLE, required_cert_codes));
            }

            let name = NameParts {
                first_name: self.title_case(first_token),
                middle_name: non_empty(self.title_case(&middle_tokens.join(" "))),
                last_name,
            };
            return Some(resolved(raw, name, required_cert_codes, COMMA_NAME_CONFIDENCE));
        }

        let cleaned = self.clean_token(&compact);
        let tokens = cleaned.split_whitespace().collect::<Vec<&str>>();

        let outcome = match tokens.as_slice() {
            [] | [_] => self.fallback(raw, REASON_TOO_FEW_TOKENS, required_cert_codes),
            [first, last] => {
                let name = NameParts {
                    first_name: self.title_case(first),
                    middle_name: None,
                    last_name: self.title_case(last),
                };
                resolved(raw, name, required_cert_codes, TWO_TOKEN_CONFIDENCE)
            }
            [first, middle @ .., last] => {
                let name = NameParts {
                    first_name: self.title_case(first),
                    middle_name: non_empty(self.title_case(&middle.join(" "))),
                    last_name: self.title_case(last),
                };
                let confidence = if tokens.len() <= 4 {
                    SHORT_MIDDLE_CONFIDENCE
                } else {
                    LONG_MIDDLE_CONFIDENCE
                };

                if confidence < MIN_RESOLVED_CONFIDENCE {
                    RowOutcome::Unresolved(UnresolvedRow {
                        raw: raw.to_string(),
                        reason: REASON_LOW_CONFIDENCE.to_string(),
                        suggestion: name,
                        required_cert_codes: required_cert_codes.to_vec(),
                    })
                } else {
                    resolved(raw, name, required_cert_codes, confidence)
                }
            }
        };

        Some(outcome)
    }

    pub fn fallback(
        &self,
        raw: &str,
        reason: &str,
        required_cert_codes: &[CertificationCode],
    ) -> RowOutcome {
        RowOutcome::Unresolved(UnresolvedRow {
            raw: raw.to_string(),
            reason: reason.to_string(),
            suggestion: self.fallback_suggestion(raw),
            required_cert_codes: required_cert_codes.to_vec(),
        })
    }

    pub fn fallback_suggestion(&self, raw: &str) -> NameParts {
        let relaxed = normalize_whitespace(&self.suggestion_noise.replace_all(raw, " "));
        let tokens = relaxed.split(' ').filter(|token| !token.is_empty()).collect::<Vec<&str>>();

        match tokens.as_slice() {
            [] => NameParts {
                first_name: String::new(),
                middle_name: None,
                last_name: String::new(),
            },
            [only] => NameParts {
                first_name: self.title_case(only),
                middle_name: None,
                last_name: String::new(),
            },
            [first, middle @ .., last] => NameParts {
                first_name: self.title_case(first),
                middle_name: non_empty(self.title_case(&middle.join(" "))),
                last_name: self.title_case(last),
            },
        }
    }
}

pub fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

fn resolved(
    raw: &str,
    name: NameParts,
    required_cert_codes: &[CertificationCode],
    confidence: f64,
) -> RowOutcome {
    RowOutcome::Resolved(ParsedRow {
        raw: raw.to_string(),
        name,
        required_cert_codes: required_cert_codes.to_vec(),
        confidence,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokenizer() -> NameTokenizer {
        NameTokenizer::new().expect("tokenizer regexes compile")
    }

    fn expect_resolved(outcome: Option<RowOutcome>) -> ParsedRow {
        match outcome {
            Some(RowOutcome::Resolved(row)) => row,
            other => panic!("expected resolved row, got {other:?}"),
        }
    }

    fn expect_unresolved(outcome: Option<RowOutcome>) -> UnresolvedRow {
        match outcome {
            Some(RowOutcome::Unresolved(row)) => row,
            other => panic!("expected unresolved row, got {other:?}"),
        }
    }

    #[test]
    fn clean_token_strips_digits_and_punctuation() {
        let tokenizer = tokenizer();
        assert_eq!(tokenizer.clean_token("  Mary-Ann  O'Neil (RN) #42 "), "Mary-Ann O'Neil RN");
        assert_eq!(tokenizer.clean_token("\t123\t"), "");
    }

    #[test]
    fn clean_token_drops_tokens_without_letters() {
        let tokenizer = tokenizer();
        assert_eq!(tokenizer.clean_token("- ' Jane -- Doe"), "Jane Doe");
        assert_eq!(tokenizer.clean_token("--"), "");
    }

    #[test]
    fn bullet_marker_is_not_taken_as_first_name() {
        let row = expect_resolved(tokenizer().parse_freeform_name("- Jane Doe", &[]));
        assert_eq!(row.name.first_name, "Jane");
        assert_eq!(row.name.middle_name, None);
        assert_eq!(row.name.last_name, "Doe");
        assert_eq!(row.confidence, TWO_TOKEN_CONFIDENCE);

        let comma = expect_resolved(tokenizer().parse_freeform_name("Doe, - Jane", &[]));
        assert_eq!(comma.name.first_name, "Jane");
        assert_eq!(comma.name.middle_name, None);

        let bare = expect_unresolved(tokenizer().parse_freeform_name("- ' -", &[]));
        assert_eq!(bare.reason, REASON_TOO_FEW_TOKENS);
    }

    #[test]
    fn title_case_handles_hyphens_and_apostrophe_runs() {
        let tokenizer = tokenizer();
        assert_eq!(tokenizer.title_case("mARY-ann smith"), "Mary-Ann Smith");
        assert_eq!(tokenizer.title_case("o''neil"), "O'neil");
        assert_eq!(tokenizer.title_case(""), "");
    }

    #[test]
    fn comma_name_maps_last_then_first_and_middle() {
        let row = expect_resolved(
            tokenizer().parse_freeform_name("lopez,  maria elena", &[CertificationCode::Bls]),
        );
        assert_eq!(row.name.first_name, "Maria");
        assert_eq!(row.name.middle_name.as_deref(), Some("Elena"));
        assert_eq!(row.name.last_name, "Lopez");
        assert_eq!(row.confidence, COMMA_NAME_CONFIDENCE);
        assert_eq!(row.required_cert_codes, vec![CertificationCode::Bls]);
    }

    #[test]
    fn comma_name_without_first_part_is_unresolved() {
        let row = expect_unresolved(tokenizer().parse_freeform_name("Lopez,", &[]));
        assert_eq!(row.reason, REASON_UNPARSEABLE);
        assert_eq!(row.suggestion.first_name, "Lopez");
    }

    #[test]
    fn single_token_requires_first_and_last() {
        let row = expect_unresolved(tokenizer().parse_freeform_name("Madonna", &[]));
        assert_eq!(row.reason, REASON_TOO_FEW_TOKENS);
    }

    #[test]
    fn token_count_drives_confidence() {
        let tokenizer = tokenizer();

        let two = expect_resolved(tokenizer.parse_freeform_name("amy chen", &[]));
        assert_eq!(two.confidence, TWO_TOKEN_CONFIDENCE);
        assert_eq!(two.name.middle_name, None);

        let four = expect_resolved(tokenizer.parse_freeform_name("Mary Ann Lee Smith", &[]));
        assert_eq!(four.confidence, SHORT_MIDDLE_CONFIDENCE);
        assert_eq!(four.name.middle_name.as_deref(), Some("Ann Lee"));
        assert_eq!(four.name.last_name, "Smith");
    }

    #[test]
    fn long_names_keep_suggestion_but_stay_unresolved() {
        let row = expect_unresolved(
            tokenizer().parse_freeform_name("Juan Carlos de la Cruz", &[CertificationCode::Pals]),
        );
        assert_eq!(row.reason, REASON_LOW_CONFIDENCE);
        assert_eq!(row.suggestion.first_name, "Juan");
        assert_eq!(row.suggestion.middle_name.as_deref(), Some("Carlos De La"));
        assert_eq!(row.suggestion.last_name, "Cruz");
        assert_eq!(row.required_cert_codes, vec![CertificationCode::Pals]);
    }

    #[test]
    fn blank_input_produces_nothing() {
        assert!(tokenizer().parse_freeform_name("   ", &[]).is_none());
    }
}
