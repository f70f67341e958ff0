use std::collections::{HashMap, HashSet};

use crate::model::{ExistingStaffName, NameParts, ParsedRow, UnresolvedRow};

pub const REASON_DUPLICATE_FIRST_LAST: &str =
    "Duplicate first+last requires middle name or initial.";

pub fn normalize_name(value: &str) -> String {
    value.trim().to_lowercase()
}

pub fn first_last_key(first_name: &str, last_name: &str) -> String {
    format!("{}|{}", normalize_name(first_name), normalize_name(last_name))
}

pub fn full_name_key(name: &NameParts) -> String {
    format!(
        "{}|{}|{}",
        normalize_name(&name.first_name),
        normalize_name(name.middle_name.as_deref().unwrap_or("")),
        normalize_name(&name.last_name)
    )
}

pub fn dedupe_exact(rows: Vec<ParsedRow>) -> Vec<ParsedRow> {
    let mut seen = HashSet::<String>::new();
    rows.into_iter()
        .filter(|row| seen.insert(full_name_key(&row.name)))
        .collect()
}

#[derive(Debug, Default, Clone, Copy)]
struct NameGroup {
    members: usize,
    missing_middle: bool,
}

impl NameGroup {
    fn add(&mut self, name: &NameParts) {
        self.members += 1;
        self.missing_middle |= !name.has_middle();
    }

    fn is_collision(self) -> bool {
        self.members > 1 && self.missing_middle
    }
}

#[derive(Debug, Default)]
pub struct GuardedRows {
    pub resolved: Vec<ParsedRow>,
    pub demoted: Vec<UnresolvedRow>,
}

pub fn apply_collision_guard(
    rows: Vec<ParsedRow>,
    existing_staff: &[ExistingStaffName],
) -> GuardedRows {
    let mut groups = HashMap::<String, NameGroup>::new();
    for name in existing_staff
        .iter()
        .chain(rows.iter().map(|row| &row.name))
    {
        groups
            .entry(first_last_key(&name.first_name, &name.last_name))
            .or_default()
            .add(name);
    }

    let mut guarded = GuardedRows::default();
    for row in rows {
        let key = first_last_key(&row.name.first_name, &row.name.last_name);
        let collides = groups
            .get(&key)
            .map(|group| group.is_collision())
            .unwrap_or(false);

        if collides {
            guarded.demoted.push(UnresolvedRow {
                raw: row.raw,
                reason: REASON_DUPLICATE_FIRST_LAST.to_string(),
                suggestion: row.name,
                required_cert_codes: row.required_cert_codes,
            });
        } else {
            guarded.resolved.push(row);
        }
    }

    guarded
}
