use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CertificationCode {
    Acls,
    Bls,
    Pals,
}

impl CertificationCode {
    pub const ALL: [CertificationCode; 3] = [Self::Acls, Self::Bls, Self::Pals];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Acls => "ACLS",
            Self::Bls => "BLS",
            Self::Pals => "PALS",
        }
    }

    pub fn canonical_set(codes: &[CertificationCode]) -> Vec<CertificationCode> {
        Self::ALL
            .into_iter()
            .filter(|code| codes.contains(code))
            .collect()
    }
}

impl fmt::Display for CertificationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CertificationCode {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        Self::ALL
            .into_iter()
            .find(|code| code.as_str().eq_ignore_ascii_case(normalized))
            .ok_or_else(|| format!("unknown certification code: {normalized}"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NameParts {
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
}

impl NameParts {
    pub fn has_middle(&self) -> bool {
        self.middle_name
            .as_deref()
            .map(|value| !value.trim().is_empty())
            .unwrap_or(false)
    }
}

pub type ExistingStaffName = NameParts;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedRow {
    pub raw: String,
    #[serde(flatten)]
    pub name: NameParts,
    pub required_cert_codes: Vec<CertificationCode>,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnresolvedRow {
    pub raw: String,
    pub reason: String,
    pub suggestion: NameParts,
    pub required_cert_codes: Vec<CertificationCode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportSourceType {
    TableTsv,
    ListText,
}

impl ImportSourceType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TableTsv => "table_tsv",
            Self::ListText => "list_text",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NameOrderDecision {
    FirstLast,
    LastFirst,
}

impl NameOrderDecision {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FirstLast => "first_last",
            Self::LastFirst => "last_first",
        }
    }
}

pub type PatternDecisions = BTreeMap<String, NameOrderDecision>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionOption {
    pub value: NameOrderDecision,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingPatternDecision {
    pub pattern_id: String,
    pub sample_first_token: String,
    pub sample_second_token: String,
    pub question: String,
    pub options: Vec<DecisionOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaffImportPreview {
    pub resolved: Vec<ParsedRow>,
    pub unresolved: Vec<UnresolvedRow>,
    pub pending_pattern_decisions: Vec<PendingPatternDecision>,
    pub detected_source_type: ImportSourceType,
}

impl StaffImportPreview {
    pub fn empty(detected_source_type: ImportSourceType) -> Self {
        Self {
            resolved: Vec::new(),
            unresolved: Vec::new(),
            pending_pattern_decisions: Vec::new(),
            detected_source_type,
        }
    }

    pub fn needs_decisions(&self) -> bool {
        !self.pending_pattern_decisions.is_empty()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ImportRequest<'a> {
    pub raw_text: &'a str,
    pub required_cert_codes: &'a [CertificationCode],
    pub existing_staff: &'a [ExistingStaffName],
    pub pattern_decisions: Option<&'a PatternDecisions>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommitRowDraft {
    pub include: bool,
    pub first_name: String,
    pub middle_name: String,
    pub last_name: String,
    pub certs: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRow {
    pub first_name: String,
    pub middle_name: Option<String>,
    pub last_name: String,
    pub required_cert_codes: Vec<CertificationCode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuplicateDecision {
    Yes,
    No,
}

pub type DuplicateDecisions = BTreeMap<String, DuplicateDecision>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome {
    pub inserted_count: usize,
    pub matched_count: usize,
}
