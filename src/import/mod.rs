use anyhow::Result;
use tracing::debug;

use crate::model::{
    CertificationCode, ImportRequest, ImportSourceType, NameOrderDecision, NameParts, ParsedRow,
    PendingPatternDecision, StaffImportPreview, UnresolvedRow,
};

pub mod classify;
pub mod collision;
pub mod pattern;
pub mod split;
pub mod table;
pub mod tokenize;

pub use classify::detect_source_type;
pub use collision::{apply_collision_guard, dedupe_exact, first_last_key, full_name_key};
pub use pattern::{CellShape, RowPattern};
pub use split::split_raw_rows;
pub use table::{ColumnMapping, TableColumnResolver};
pub use tokenize::{NameTokenizer, RowOutcome};

use pattern::{PatternScan, scan_row_patterns};
use table::{
    HEADER_CONFIDENCE, INFERRED_CONFIDENCE, SINGLE_CELL_COMMA_CONFIDENCE, cell_at, has_letters,
    infer_column_mapping, split_table_rows,
};
use tokenize::{REASON_UNPARSEABLE, non_empty};

pub const REASON_MISSING_MAPPED_NAME: &str = "Missing first or last name from mapped columns.";
pub const REASON_MULTIPLE_COMMA_NAMES: &str =
    "Multiple comma-separated names in one row. Split them before importing.";

#[derive(Debug, Default)]
struct RowBatch {
    resolved: Vec<ParsedRow>,
    unresolved: Vec<UnresolvedRow>,
    pending: Vec<PendingPatternDecision>,
}

impl RowBatch {
    fn awaiting(pending: Vec<PendingPatternDecision>) -> Self {
        Self {
            pending,
            ..Self::default()
        }
    }

    fn push(&mut self, outcome: RowOutcome) {
        match outcome {
            RowOutcome::Resolved(row) => self.resolved.push(row),
            RowOutcome::Unresolved(row) => self.unresolved.push(row),
        }
    }
}

#[derive(Debug)]
pub struct StaffImportParser {
    tokenizer: NameTokenizer,
    columns: TableColumnResolver,
}

impl StaffImportParser {
    pub fn new() -> Result<Self> {
        Ok(Self {
            tokenizer: NameTokenizer::new()?,
            columns: TableColumnResolver::new()?,
        })
    }

    pub fn parse(&self, request: &ImportRequest<'_>) -> StaffImportPreview {
        let detected_source_type = detect_source_type(request.raw_text);
        let batch = match detected_source_type {
            ImportSourceType::TableTsv => self.parse_table(request),
            ImportSourceType::ListText => self.parse_list(request),
        };

        if !batch.pending.is_empty() {
            debug!(
                source_type = detected_source_type.as_str(),
                pending = batch.pending.len(),
                "import awaiting pattern decisions"
            );
            return StaffImportPreview {
                pending_pattern_decisions: batch.pending,
                ..StaffImportPreview::empty(detected_source_type)
            };
        }

        let deduped = dedupe_exact(batch.resolved);
        let guarded = apply_collision_guard(deduped, request.existing_staff);

        let mut unresolved = batch.unresolved;
        unresolved.extend(guarded.demoted);

        debug!(
            source_type = detected_source_type.as_str(),
            resolved = guarded.resolved.len(),
            unresolved = unresolved.len(),
            "import rows resolved"
        );

        StaffImportPreview {
            resolved: guarded.resolved,
            unresolved,
            pending_pattern_decisions: Vec::new(),
            detected_source_type,
        }
    }

    fn parse_list(&self, request: &ImportRequest<'_>) -> RowBatch {
        let mut batch = RowBatch::default();
        for row in split_raw_rows(request.raw_text) {
            if let Some(outcome) = self
                .tokenizer
                .parse_freeform_name(&row, request.required_cert_codes)
            {
                batch.push(outcome);
            }
        }
        batch
    }

    fn parse_table(&self, request: &ImportRequest<'_>) -> RowBatch {
        let rows = split_table_rows(request.raw_text);
        let certs = request.required_cert_codes;
        let Some(first_row) = rows.first() else {
            return RowBatch::default();
        };

        let mut batch = RowBatch::default();

        if let Some(mapping) = self.columns.detect_header_mapping(first_row) {
            for cells in &rows[1..] {
                batch.push(self.resolve_header_row(cells, mapping, certs));
            }
            return batch;
        }

        let Some(mapping) = infer_column_mapping(&rows) else {
            for cells in &rows {
                batch.push(self.resolve_unmapped_row(cells, certs));
            }
            return batch;
        };

        let scan: PatternScan =
            scan_row_patterns(&rows, mapping, request.pattern_decisions, &self.tokenizer);
        if !scan.pending.is_empty() {
            return RowBatch::awaiting(scan.pending);
        }

        for (row_index, cells) in rows.iter().enumerate() {
            let decision = scan.decision_for(row_index, request.pattern_decisions);
            batch.push(self.resolve_inferred_row(cells, mapping, decision, certs));
        }
        batch
    }

    fn resolve_header_row(
        &self,
        cells: &[String],
        mapping: ColumnMapping,
        certs: &[CertificationCode],
    ) -> RowOutcome {
        self.mapped_outcome(
            &cells.join("\t"),
            cell_at(cells, mapping.first_index),
            self.middle_name(cells, mapping),
            cell_at(cells, mapping.last_index),
            certs,
            HEADER_CONFIDENCE,
        )
    }

    fn resolve_inferred_row(
        &self,
        cells: &[String],
        mapping: ColumnMapping,
        decision: Option<NameOrderDecision>,
        certs: &[CertificationCode],
    ) -> RowOutcome {
        let raw_row = cells.join("\t");
        let first_cell = cell_at(cells, mapping.first_index);
        let second_cell = cell_at(cells, mapping.last_index);

        match (!has_letters(first_cell), !has_letters(second_cell)) {
            (false, true) => return self.parse_single_cell(first_cell, &raw_row, certs),
            (true, false) => return self.parse_single_cell(second_cell, &raw_row, certs),
            (true, true) => {
                return self.mapped_outcome(
                    &raw_row,
                    "",
                    self.middle_name(cells, mapping),
                    "",
                    certs,
                    INFERRED_CONFIDENCE,
                );
            }
            (false, false) => {}
        }

        match (first_cell.contains(','), second_cell.contains(',')) {
            (true, true) => {
                return self
                    .tokenizer
                    .fallback(first_cell, REASON_MULTIPLE_COMMA_NAMES, certs)
                    .with_raw(&raw_row);
            }
            (true, false) => {
                return self
                    .parse_single_cell(first_cell, &raw_row, certs)
                    .with_confidence(SINGLE_CELL_COMMA_CONFIDENCE);
            }
            (false, true) => {
                return self
                    .parse_single_cell(second_cell, &raw_row, certs)
                    .with_confidence(SINGLE_CELL_COMMA_CONFIDENCE);
            }
            (false, false) => {}
        }

        let (mapped_first, mapped_last) = match decision {
            Some(NameOrderDecision::LastFirst) => (second_cell, first_cell),
            Some(NameOrderDecision::FirstLast) | None => (first_cell, second_cell),
        };

        self.mapped_outcome(
            &raw_row,
            mapped_first,
            self.middle_name(cells, mapping),
            mapped_last,
            certs,
            INFERRED_CONFIDENCE,
        )
    }

    fn resolve_unmapped_row(&self, cells: &[String], certs: &[CertificationCode]) -> RowOutcome {
        let raw_row = cells.join("\t");
        let name_text = cells
            .iter()
            .map(String::as_str)
            .filter(|cell| has_letters(cell))
            .collect::<Vec<&str>>()
            .join(" ");

        match self.tokenizer.parse_freeform_name(&name_text, certs) {
            Some(outcome) => outcome.with_raw(&raw_row),
            None => self.tokenizer.fallback(&raw_row, REASON_UNPARSEABLE, certs),
        }
    }

    fn parse_single_cell(
        &self,
        cell: &str,
        raw_row: &str,
        certs: &[CertificationCode],
    ) -> RowOutcome {
        match self.tokenizer.parse_freeform_name(cell, certs) {
            Some(outcome) => outcome.with_raw(raw_row),
            None => self.tokenizer.fallback(raw_row, REASON_UNPARSEABLE, certs),
        }
    }

    fn middle_name(&self, cells: &[String], mapping: ColumnMapping) -> Option<String> {
        let index = mapping.middle_index?;
        let cleaned = self.tokenizer.clean_token(cell_at(cells, index));
        non_empty(self.tokenizer.title_case(&cleaned))
    }

    fn mapped_outcome(
        &self,
        raw_row: &str,
        first_raw: &str,
        middle_name: Option<String>,
        last_raw: &str,
        certs: &[CertificationCode],
        confidence: f64,
    ) -> RowOutcome {
        let name = NameParts {
            first_name: self.tokenizer.title_case(&self.tokenizer.clean_token(first_raw)),
            middle_name,
            last_name: self.tokenizer.title_case(&self.tokenizer.clean_token(last_raw)),
        };

        if name.first_name.is_empty() || name.last_name.is_empty() {
            return RowOutcome::Unresolved(UnresolvedRow {
                raw: raw_row.to_string(),
                reason: REASON_MISSING_MAPPED_NAME.to_string(),
                suggestion: name,
                required_cert_codes: certs.to_vec(),
            });
        }

        RowOutcome::Resolved(ParsedRow {
            raw: raw_row.to_string(),
            name,
            required_cert_codes: certs.to_vec(),
            confidence,
        })
    }
}

pub fn parse_staff_import(request: &ImportRequest<'_>) -> Result<StaffImportPreview> {
    let parser = StaffImportParser::new()?;
    Ok(parser.parse(request))
}
