use std::collections::HashSet;

use super::table::{ColumnMapping, cell_at, has_letters};
use super::tokenize::NameTokenizer;
use crate::model::{DecisionOption, NameOrderDecision, PatternDecisions, PendingPatternDecision};
use crate::util::sha256_hex;

const PATTERN_QUESTION: &str = "Which name order is correct for rows in this format?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellShape {
    Empty,
    CommaOne,
    CommaTwo,
    CommaThreePlus,
    PlainOne,
    PlainTwo,
    PlainThreePlus,
}

impl CellShape {
    pub fn classify(value: &str, tokenizer: &NameTokenizer) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Self::Empty;
        }

        let tokens = tokenizer.token_count(trimmed);
        match (trimmed.contains(','), tokens) {
            (true, 0 | 1) => Self::CommaOne,
            (true, 2) => Self::CommaTwo,
            (true, _) => Self::CommaThreePlus,
            (false, 0 | 1) => Self::PlainOne,
            (false, 2) => Self::PlainTwo,
            (false, _) => Self::PlainThreePlus,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Empty => "empty",
            Self::CommaOne => "comma_1",
            Self::CommaTwo => "comma_2",
            Self::CommaThreePlus => "comma_3plus",
            Self::PlainOne => "plain_1",
            Self::PlainTwo => "plain_2",
            Self::PlainThreePlus => "plain_3plus",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowPattern {
    pub first_index: usize,
    pub middle_index: Option<usize>,
    pub last_index: usize,
    pub first_shape: CellShape,
    pub second_shape: CellShape,
}

impl RowPattern {
    pub fn fingerprint(&self) -> String {
        let middle = self
            .middle_index
            .map(|index| index.to_string())
            .unwrap_or_else(|| "none".to_string());

        format!(
            "table_tsv:{}:{}:{}:{}:{}",
            self.first_index,
            middle,
            self.last_index,
            self.first_shape.as_str(),
            self.second_shape.as_str()
        )
    }

    pub fn id(&self) -> String {
        let digest = sha256_hex(&self.fingerprint());
        format!("pattern-{}", &digest[..16])
    }
}

#[derive(Debug, Clone, Default)]
pub struct PatternScan {
    pub row_patterns: Vec<Option<String>>,
    pub pending: Vec<PendingPatternDecision>,
}

impl PatternScan {
    pub fn decision_for(
        &self,
        row_index: usize,
        decisions: Option<&PatternDecisions>,
    ) -> Option<NameOrderDecision> {
        let pattern_id = self.row_patterns.get(row_index)?.as_ref()?;
        decisions?.get(pattern_id).copied()
    }
}

pub fn is_pattern_candidate(first_cell: &str, second_cell: &str) -> bool {
    !first_cell.is_empty()
        && !second_cell.is_empty()
        && has_letters(first_cell)
        && has_letters(second_cell)
        && !first_cell.contains(',')
        && !second_cell.contains(',')
}

pub fn scan_row_patterns(
    rows: &[Vec<String>],
    mapping: ColumnMapping,
    decisions: Option<&PatternDecisions>,
    tokenizer: &NameTokenizer,
) -> PatternScan {
    let mut scan = PatternScan {
        row_patterns: Vec::with_capacity(rows.len()),
        pending: Vec::new(),
    };
    let mut seen = HashSet::<String>::new();

    for cells in rows {
        let first_cell = cell_at(cells, mapping.first_index);
        let second_cell = cell_at(cells, mapping.last_index);
        if !is_pattern_candidate(first_cell, second_cell) {
            scan.row_patterns.push(None);
            continue;
        }

        let pattern = RowPattern {
            first_index: mapping.first_index,
            middle_index: mapping.middle_index,
            last_index: mapping.last_index,
            first_shape: CellShape::classify(first_cell, tokenizer),
            second_shape: CellShape::classify(second_cell, tokenizer),
        };
        let pattern_id = pattern.id();

        let decided = decisions
            .map(|known| known.contains_key(&pattern_id))
            .unwrap_or(false);
        if !decided && seen.insert(pattern_id.clone()) {
            scan.pending.push(pending_decision(&pattern_id, first_cell, second_cell));
        }

        scan.row_patterns.push(Some(pattern_id));
    }

    scan
}

fn pending_decision(
    pattern_id: &str,
    sample_first: &str,
    sample_second: &str,
) -> PendingPatternDecision {
    PendingPatternDecision {
        pattern_id: pattern_id.to_string(),
        sample_first_token: sample_first.to_string(),
        sample_second_token: sample_second.to_string(),
        question: PATTERN_QUESTION.to_string(),
        options: vec![
            DecisionOption {
                value: NameOrderDecision::FirstLast,
                label: "First token then second token".to_string(),
            },
            DecisionOption {
                value: NameOrderDecision::LastFirst,
                label: "Second token then first token".to_string(),
            },
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::table::split_table_rows;

    const MAPPING: ColumnMapping = ColumnMapping {
        first_index: 0,
        middle_index: None,
        last_index: 1,
    };

    fn tokenizer() -> NameTokenizer {
        NameTokenizer::new().expect("tokenizer regexes compile")
    }

    #[test]
    fn cell_shapes_bucket_by_comma_and_tokens() {
        let tokenizer = tokenizer();
        assert_eq!(CellShape::classify("", &tokenizer), CellShape::Empty);
        assert_eq!(CellShape::classify("Amy", &tokenizer), CellShape::PlainOne);
        assert_eq!(CellShape::classify("Mary Ann", &tokenizer), CellShape::PlainTwo);
        assert_eq!(CellShape::classify("A B C", &tokenizer), CellShape::PlainThreePlus);
        assert_eq!(CellShape::classify("Lopez,", &tokenizer), CellShape::CommaOne);
        assert_eq!(CellShape::classify("Lopez, Maria", &tokenizer), CellShape::CommaTwo);
    }

    #[test]
    fn pattern_id_depends_only_on_structure() {
        let tokenizer = tokenizer();
        let left = scan_row_patterns(&split_table_rows("James\tJackson"), MAPPING, None, &tokenizer);
        let right = scan_row_patterns(&split_table_rows("Amy\tChen"), MAPPING, None, &tokenizer);

        assert_eq!(left.pending[0].pattern_id, right.pending[0].pattern_id);
        assert!(left.pending[0].pattern_id.starts_with("pattern-"));
        assert_eq!(left.pending[0].pattern_id.len(), "pattern-".len() + 16);
    }

    #[test]
    fn fingerprint_lists_indexes_and_shapes() {
        let pattern = RowPattern {
            first_index: 0,
            middle_index: Some(2),
            last_index: 1,
            first_shape: CellShape::PlainTwo,
            second_shape: CellShape::PlainOne,
        };
        assert_eq!(pattern.fingerprint(), "table_tsv:0:2:1:plain_2:plain_1");
    }

    #[test]
    fn one_pending_decision_per_distinct_pattern() {
        let rows = split_table_rows("James\tJackson\nMary Ann\tChen\nAria\tLopez\nLopez, Maria\tx");
        let scan = scan_row_patterns(&rows, MAPPING, None, &tokenizer());

        assert_eq!(scan.pending.len(), 2);
        assert_eq!(scan.pending[0].sample_first_token, "James");
        assert_eq!(scan.pending[1].sample_first_token, "Mary Ann");
        assert_eq!(scan.row_patterns[0], scan.row_patterns[2]);
        assert_eq!(scan.row_patterns[3], None);
    }

    #[test]
    fn known_decisions_suppress_pending_entries() {
        let tokenizer = tokenizer();
        let rows = split_table_rows("James\tJackson\nAmy\tChen");
        let first_pass = scan_row_patterns(&rows, MAPPING, None, &tokenizer);

        let mut decisions = PatternDecisions::new();
        decisions.insert(
            first_pass.pending[0].pattern_id.clone(),
            NameOrderDecision::LastFirst,
        );

        let second_pass = scan_row_patterns(&rows, MAPPING, Some(&decisions), &tokenizer);
        assert!(second_pass.pending.is_empty());
        assert_eq!(
            second_pass.decision_for(1, Some(&decisions)),
            Some(NameOrderDecision::LastFirst)
        );
    }
}
