use std::collections::HashSet;

use thiserror::Error;

use crate::import::collision::{first_last_key, normalize_name};
use crate::model::{
    CertificationCode, CommitRow, CommitRowDraft, DuplicateDecision, DuplicateDecisions,
};

pub const MAX_NAME_CHARS: usize = 80;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommitError {
    #[error("Missing first/last name in selected row(s): {}", join_indexes(.indexes))]
    MissingNames { indexes: Vec<usize> },

    #[error("Confirmed duplicate {name} requires middle initial/name for each selected row.")]
    DuplicateMissingMiddle { name: String },

    #[error("Confirmed duplicate {name} requires unique middle values for each selected row.")]
    DuplicateMiddleNotUnique { name: String },

    #[error("No staff rows to import.")]
    NoRows,

    #[error("Row {row}: {field} must be at most {} characters.", MAX_NAME_CHARS)]
    FieldTooLong { row: usize, field: &'static str },

    #[error("Row {row}: {field} is required.")]
    FieldRequired { row: usize, field: &'static str },

    #[error("Row {row}: select at least one certification.")]
    NoCertifications { row: usize },
}

fn join_indexes(indexes: &[usize]) -> String {
    indexes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<String>>()
        .join(", ")
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectedRows {
    pub rows: Vec<CommitRow>,
    pub invalid_included_indexes: Vec<usize>,
}

impl CollectedRows {
    pub fn into_rows(self) -> Result<Vec<CommitRow>, CommitError> {
        if self.invalid_included_indexes.is_empty() {
            Ok(self.rows)
        } else {
            Err(CommitError::MissingNames {
                indexes: self.invalid_included_indexes,
            })
        }
    }
}

pub fn collect_commit_rows(drafts: &[CommitRowDraft]) -> CollectedRows {
    let mut collected = CollectedRows::default();

    for (index, draft) in drafts.iter().enumerate() {
        if !draft.include {
            continue;
        }

        let first_name = draft.first_name.trim();
        let middle_name = draft.middle_name.trim();
        let last_name = draft.last_name.trim();
        if first_name.is_empty() || last_name.is_empty() {
            collected.invalid_included_indexes.push(index + 1);
            continue;
        }

        let selected = draft
            .certs
            .iter()
            .filter_map(|value| value.parse::<CertificationCode>().ok())
            .collect::<Vec<CertificationCode>>();

        collected.rows.push(CommitRow {
            first_name: first_name.to_string(),
            middle_name: (!middle_name.is_empty()).then(|| middle_name.to_string()),
            last_name: last_name.to_string(),
            required_cert_codes: CertificationCode::canonical_set(&selected),
        });
    }

    collected
}

pub fn validate_confirmed_duplicates(
    rows: &[CommitRow],
    decisions: &DuplicateDecisions,
) -> Result<(), CommitError> {
    for (key, decision) in decisions {
        if *decision != DuplicateDecision::Yes {
            continue;
        }

        let wanted = normalize_decision_key(key);
        let middles = rows
            .iter()
            .filter(|row| first_last_key(&row.first_name, &row.last_name) == wanted)
            .map(|row| normalize_name(row.middle_name.as_deref().unwrap_or("")))
            .collect::<Vec<String>>();
        if middles.len() < 2 {
            continue;
        }

        if middles.iter().any(String::is_empty) {
            return Err(CommitError::DuplicateMissingMiddle {
                name: display_name_from_key(&wanted),
            });
        }

        let unique = middles.iter().collect::<HashSet<&String>>();
        if unique.len() != middles.len() {
            return Err(CommitError::DuplicateMiddleNotUnique {
                name: display_name_from_key(&wanted),
            });
        }
    }

    Ok(())
}

pub fn validate_commit_rows(rows: &[CommitRow]) -> Result<(), CommitError> {
    if rows.is_empty() {
        return Err(CommitError::NoRows);
    }

    for (index, row) in rows.iter().enumerate() {
        let position = index + 1;
        for (field, value, required) in [
            ("first name", row.first_name.as_str(), true),
            ("middle name", row.middle_name.as_deref().unwrap_or(""), false),
            ("last name", row.last_name.as_str(), true),
        ] {
            let trimmed = value.trim();
            if required && trimmed.is_empty() {
                return Err(CommitError::FieldRequired {
                    row: position,
                    field,
                });
            }
            if trimmed.chars().count() > MAX_NAME_CHARS {
                return Err(CommitError::FieldTooLong {
                    row: position,
                    field,
                });
            }
        }

        if row.required_cert_codes.is_empty() {
            return Err(CommitError::NoCertifications { row: position });
        }
    }

    Ok(())
}

fn normalize_decision_key(key: &str) -> String {
    match key.split_once('|') {
        Some((first, last)) => first_last_key(first, last),
        None => normalize_name(key),
    }
}

fn display_name_from_key(key: &str) -> String {
    let (first, last) = key.split_once('|').unwrap_or((key, ""));
    let title = |value: &str| {
        value
            .split_whitespace()
            .map(|part| {
                let mut chars = part.chars();
                match chars.next() {
                    Some(head) => head.to_uppercase().chain(chars).collect::<String>(),
                    None => String::new(),
                }
            })
            .collect::<Vec<String>>()
            .join(" ")
    };

    format!("{} {}", title(first), title(last)).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(include: bool, first: &str, middle: &str, last: &str, certs: &[&str]) -> CommitRowDraft {
        CommitRowDraft {
            include,
            first_name: first.to_string(),
            middle_name: middle.to_string(),
            last_name: last.to_string(),
            certs: certs.iter().map(|cert| cert.to_string()).collect(),
        }
    }

    fn commit_row(first: &str, middle: Option<&str>, last: &str) -> CommitRow {
        CommitRow {
            first_name: first.to_string(),
            middle_name: middle.map(ToOwned::to_owned),
            last_name: last.to_string(),
            required_cert_codes: vec![CertificationCode::Bls],
        }
    }

    fn confirmed(key: &str) -> DuplicateDecisions {
        let mut decisions = DuplicateDecisions::new();
        decisions.insert(key.to_string(), DuplicateDecision::Yes);
        decisions
    }

    #[test]
    fn collect_keeps_submitted_order_and_selected_rows() {
        let collected = collect_commit_rows(&[
            draft(true, " Sam ", "J", "Hill", &["BLS"]),
            draft(false, "Skip", "", "Me", &["BLS"]),
            draft(true, "Alex", "", "King", &["pals", "ACLS", "CPR"]),
        ]);

        assert!(collected.invalid_included_indexes.is_empty());
        assert_eq!(
            collected.rows,
            vec![
                CommitRow {
                    first_name: "Sam".to_string(),
                    middle_name: Some("J".to_string()),
                    last_name: "Hill".to_string(),
                    required_cert_codes: vec![CertificationCode::Bls],
                },
                CommitRow {
                    first_name: "Alex".to_string(),
                    middle_name: None,
                    last_name: "King".to_string(),
                    required_cert_codes: vec![CertificationCode::Acls, CertificationCode::Pals],
                },
            ]
        );
    }

    #[test]
    fn collect_reports_included_rows_missing_names() {
        let collected = collect_commit_rows(&[
            draft(false, "", "", "", &[]),
            draft(true, "", "", "", &["BLS"]),
        ]);

        assert!(collected.rows.is_empty());
        assert_eq!(collected.invalid_included_indexes, vec![2]);
        assert_eq!(
            collected.into_rows().unwrap_err().to_string(),
            "Missing first/last name in selected row(s): 2"
        );
    }

    #[test]
    fn confirmed_duplicates_need_a_middle_on_every_row() {
        let rows = vec![
            commit_row("James", Some("A"), "Jackson"),
            commit_row("james", None, "JACKSON"),
        ];

        let err = validate_confirmed_duplicates(&rows, &confirmed("james|jackson")).unwrap_err();
        assert_eq!(
            err,
            CommitError::DuplicateMissingMiddle {
                name: "James Jackson".to_string()
            }
        );
        assert!(err.to_string().contains("Confirmed duplicate James Jackson"));
    }

    #[test]
    fn confirmed_duplicates_need_distinct_middles() {
        let rows = vec![
            commit_row("James", Some("A"), "Jackson"),
            commit_row("James", Some("a"), "Jackson"),
        ];

        let err = validate_confirmed_duplicates(&rows, &confirmed("James|Jackson")).unwrap_err();
        assert!(matches!(err, CommitError::DuplicateMiddleNotUnique { .. }));
    }

    #[test]
    fn unconfirmed_or_single_rows_are_not_checked() {
        let rows = vec![
            commit_row("James", None, "Jackson"),
            commit_row("James", None, "Jackson"),
            commit_row("Amy", None, "Chen"),
        ];

        let mut decisions = confirmed("amy|chen");
        decisions.insert("james|jackson".to_string(), DuplicateDecision::No);
        assert_eq!(validate_confirmed_duplicates(&rows, &decisions), Ok(()));
    }

    #[test]
    fn distinct_middles_pass() {
        let rows = vec![
            commit_row("James", Some("A"), "Jackson"),
            commit_row("James", Some("B"), "Jackson"),
        ];
        assert_eq!(
            validate_confirmed_duplicates(&rows, &confirmed("james|jackson")),
            Ok(())
        );
    }

    #[test]
    fn row_validation_enforces_limits_and_certs() {
        assert_eq!(validate_commit_rows(&[]), Err(CommitError::NoRows));

        let long = "a".repeat(MAX_NAME_CHARS + 1);
        assert_eq!(
            validate_commit_rows(&[commit_row("Amy", Some(&long), "Chen")]),
            Err(CommitError::FieldTooLong {
                row: 1,
                field: "middle name"
            })
        );

        let mut no_certs = commit_row("Amy", None, "Chen");
        no_certs.required_cert_codes.clear();
        assert_eq!(
            validate_commit_rows(&[commit_row("Sam", None, "Hill"), no_certs]),
            Err(CommitError::NoCertifications { row: 2 })
        );

        assert_eq!(validate_commit_rows(&[commit_row("Amy", None, "Chen")]), Ok(()));
    }
}
