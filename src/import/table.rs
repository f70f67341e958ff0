use anyhow::{Context, Result};
use regex::Regex;

use super::classify::non_blank_lines;

pub const HEADER_CONFIDENCE: f64 = 0.95;
pub const INFERRED_CONFIDENCE: f64 = 0.80;
pub const SINGLE_CELL_COMMA_CONFIDENCE: f64 = 0.92;

const MIDDLE_SINGLE_TOKEN_RATIO: f64 = 0.75;

const HEADER_FIRST_ALIASES: [&str; 4] = ["first", "first name", "fname", "given name"];
const HEADER_MIDDLE_ALIASES: [&str; 4] = ["middle", "middle name", "mi", "m i"];
const HEADER_LAST_ALIASES: [&str; 5] = ["last", "last name", "lname", "surname", "family name"];

// Generational suffixes and credentials that show up as their own column.
const SUFFIX_TOKENS: [&str; 16] = [
    "jr", "sr", "ii", "iii", "iv", "rn", "lpn", "cna", "md", "np", "pa", "emt", "phd", "dds",
    "bsn", "msn",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnMapping {
    pub first_index: usize,
    pub middle_index: Option<usize>,
    pub last_index: usize,
}

#[derive(Debug)]
pub struct TableColumnResolver {
    header_noise: Regex,
}

impl TableColumnResolver {
    pub fn new() -> Result<Self> {
        Ok(Self {
            header_noise: Regex::new(r"[^a-z0-9]+").context("failed to compile header regex")?,
        })
    }

    pub fn normalize_header_cell(&self, cell: &str) -> String {
        self.header_noise
            .replace_all(&cell.to_lowercase(), " ")
            .trim()
            .to_string()
    }

    pub fn detect_header_mapping(&self, first_row: &[String]) -> Option<ColumnMapping> {
        let mut first_index = None;
        let mut middle_index = None;
        let mut last_index = None;

        for (index, cell) in first_row.iter().enumerate() {
            let normalized = self.normalize_header_cell(cell);
            let normalized = normalized.as_str();

            if first_index.is_none() && HEADER_FIRST_ALIASES.contains(&normalized) {
                first_index = Some(index);
                continue;
            }
            if last_index.is_none() && HEADER_LAST_ALIASES.contains(&normalized) {
                last_index = Some(index);
                continue;
            }
            if middle_index.is_none() && HEADER_MIDDLE_ALIASES.contains(&normalized) {
                middle_index = Some(index);
            }
        }

        match (first_index, last_index) {
            (Some(first_index), Some(last_index)) if first_index != last_index => {
                Some(ColumnMapping {
                    first_index,
                    middle_index,
                    last_index,
                })
            }
            _ => None,
        }
    }
}

pub fn split_table_rows(raw_text: &str) -> Vec<Vec<String>> {
    non_blank_lines(raw_text)
        .map(|line| {
            line.split('\t')
                .map(|cell| cell.trim().to_string())
                .collect::<Vec<String>>()
        })
        .collect()
}

pub fn cell_at(cells: &[String], index: usize) -> &str {
    cells.get(index).map(String::as_str).unwrap_or("")
}

pub fn has_letters(value: &str) -> bool {
    value.chars().any(|ch| ch.is_ascii_alphabetic())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ColumnScore {
    index: usize,
    non_empty: usize,
    text_like: usize,
}

pub fn rank_candidate_columns(rows: &[Vec<String>]) -> Vec<usize> {
    let column_count = rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut scored = Vec::<ColumnScore>::new();

    for index in 0..column_count {
        let mut non_empty = 0usize;
        let mut text_like = 0usize;
        for row in rows {
            let value = cell_at(row, index);
            if value.is_empty() {
                continue;
            }
            non_empty += 1;
            if has_letters(value) {
                text_like += 1;
            }
        }

        if text_like > 0 {
            scored.push(ColumnScore {
                index,
                non_empty,
                text_like,
            });
        }
    }

    scored.sort_by(|left, right| {
        right
            .text_like
            .cmp(&left.text_like)
            .then(right.non_empty.cmp(&left.non_empty))
            .then(left.index.cmp(&right.index))
    });

    scored.into_iter().map(|score| score.index).collect()
}

pub fn estimate_middle_column(rows: &[Vec<String>], ranked: &[usize]) -> Option<usize> {
    ranked.iter().skip(2).copied().find(|&index| {
        let values = rows
            .iter()
            .map(|row| cell_at(row, index))
            .filter(|value| !value.is_empty())
            .collect::<Vec<&str>>();
        if values.is_empty() {
            return false;
        }

        let single_token = values
            .iter()
            .filter(|value| value.split_whitespace().count() <= 1)
            .count();
        let suffix_like = values.iter().filter(|value| is_suffix_token(value)).count();

        single_token as f64 / values.len() as f64 >= MIDDLE_SINGLE_TOKEN_RATIO
            && suffix_like * 2 <= values.len()
    })
}

fn is_suffix_token(value: &str) -> bool {
    let normalized = value
        .trim()
        .trim_end_matches('.')
        .replace('.', "")
        .to_ascii_lowercase();
    SUFFIX_TOKENS.contains(&normalized.as_str())
}

pub fn infer_column_mapping(rows: &[Vec<String>]) -> Option<ColumnMapping> {
    let ranked = rank_candidate_columns(rows);
    let [top, runner_up, ..] = ranked.as_slice() else {
        return None;
    };

    Some(ColumnMapping {
        first_index: *top.min(runner_up),
        middle_index: estimate_middle_column(rows, &ranked),
        last_index: *top.max(runner_up),
    })
}
