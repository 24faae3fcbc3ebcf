//! Domain models for InChI resolution.
//!
//! This module contains the core data structures used throughout the pipeline:
//!
//! - [`Identifier`] - A validated, non-missing identifier value
//! - [`Inchi`] - A validated InChI structure string
//! - [`Row`] - The identifiers available for one compound
//! - [`FieldMapping`] - Which dataset columns hold which identifier
//! - [`AdapterOutcome`] - Normalized result of one external lookup
//! - [`StructureResult`] - Final per-row result (resolved or the `false` sentinel)
//! - [`PriorityOrder`] - Order in which identifier fields are tried
//! - [`Dataset`] - Ordered headers and records

pub mod dataset;

pub use dataset::Dataset;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// Substring every valid structure string must contain.
pub const INCHI_MARKER: &str = "InChI";

/// Cell values treated as "no value" (compared case-insensitively).
const MISSING_LITERALS: &[&str] = &["nan", "na", "n/a", "none", "null"];

// =============================================================================
// Identifier
// =============================================================================

/// An identifier that is actually present.
///
/// Construction is the input-validation step: empty cells and missing-value
/// literals such as `nan` never become an `Identifier`, so they never reach
/// a remote service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    /// Validate a raw cell value. Returns `None` for missing values.
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        let lower = trimmed.to_lowercase();
        if MISSING_LITERALS.contains(&lower.as_str()) {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    /// Validate a JSON cell. Strings and numbers are accepted.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Self::new(s),
            Value::Number(n) => Self::new(&n.to_string()),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// InChI
// =============================================================================

/// A structure string that passed the marker test.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Inchi(String);

impl Inchi {
    /// Accept a single value if it carries the `InChI` marker.
    pub fn new(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        if trimmed.contains(INCHI_MARKER) {
            Some(Self(trimmed.to_string()))
        } else {
            None
        }
    }

    /// Extract the structure from a plain-text response body.
    ///
    /// Services may answer with several lines; the first non-empty one is
    /// the structure.
    pub fn from_body(body: &str) -> Option<Self> {
        body.lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .and_then(Self::new)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Inchi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Sources and Fields
// =============================================================================

/// External service an adapter talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// NCI/CADD Chemical Identifier Resolver (names, CAS numbers, notations).
    Cactus,
    /// DrugBank structure downloads (DrugBank IDs).
    DrugBank,
    /// PubChem compound database (names).
    PubChem,
}

impl Source {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Cactus => "CACTUS",
            Self::DrugBank => "DrugBank",
            Self::PubChem => "PubChem",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cactus" => Ok(Self::Cactus),
            "drugbank" => Ok(Self::DrugBank),
            "pubchem" => Ok(Self::PubChem),
            other => Err(format!(
                "unknown source '{}' (expected cactus, drugbank or pubchem)",
                other
            )),
        }
    }
}

/// Identifier field of a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum IdentifierField {
    Name,
    Cas,
    DrugBankId,
}

impl IdentifierField {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Cas => "CAS",
            Self::DrugBankId => "DrugBank ID",
        }
    }
}

impl fmt::Display for IdentifierField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Priority Order
// =============================================================================

/// Order in which the identifier fields of a row are tried.
///
/// Names always come last and are tried against CACTUS before PubChem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PriorityOrder {
    /// DrugBank ID, then CAS, then name.
    #[default]
    #[serde(rename = "drugbank-first")]
    DrugBankFirst,
    /// CAS, then DrugBank ID, then name.
    #[serde(rename = "cas-first")]
    CasFirst,
}

const DRUGBANK_FIRST: &[(IdentifierField, Source)] = &[
    (IdentifierField::DrugBankId, Source::DrugBank),
    (IdentifierField::Cas, Source::Cactus),
    (IdentifierField::Name, Source::Cactus),
    (IdentifierField::Name, Source::PubChem),
];

const CAS_FIRST: &[(IdentifierField, Source)] = &[
    (IdentifierField::Cas, Source::Cactus),
    (IdentifierField::DrugBankId, Source::DrugBank),
    (IdentifierField::Name, Source::Cactus),
    (IdentifierField::Name, Source::PubChem),
];

impl PriorityOrder {
    /// The (field, source) lookups in the order they are attempted.
    pub fn steps(&self) -> &'static [(IdentifierField, Source)] {
        match self {
            Self::DrugBankFirst => DRUGBANK_FIRST,
            Self::CasFirst => CAS_FIRST,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DrugBankFirst => "drugbank-first",
            Self::CasFirst => "cas-first",
        }
    }
}

impl fmt::Display for PriorityOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PriorityOrder {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('_', "-").as_str() {
            "drugbank-first" | "drugbank" => Ok(Self::DrugBankFirst),
            "cas-first" | "cas" => Ok(Self::CasFirst),
            other => Err(ConfigError::InvalidPriority(other.to_string())),
        }
    }
}

// =============================================================================
// Field Mapping and Row
// =============================================================================

/// Which dataset columns hold the name, CAS number and DrugBank ID.
///
/// Omitted fields are never consulted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMapping {
    pub name: Option<String>,
    pub cas: Option<String>,
    pub drugbank_id: Option<String>,
}

impl FieldMapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, column: impl Into<String>) -> Self {
        self.name = Some(column.into());
        self
    }

    pub fn with_cas(mut self, column: impl Into<String>) -> Self {
        self.cas = Some(column.into());
        self
    }

    pub fn with_drugbank_id(mut self, column: impl Into<String>) -> Self {
        self.drugbank_id = Some(column.into());
        self
    }

    /// Mapped (field, column) pairs.
    pub fn columns(&self) -> Vec<(IdentifierField, &str)> {
        [
            (IdentifierField::Name, self.name.as_deref()),
            (IdentifierField::Cas, self.cas.as_deref()),
            (IdentifierField::DrugBankId, self.drugbank_id.as_deref()),
        ]
        .into_iter()
        .filter_map(|(field, column)| column.map(|c| (field, c)))
        .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.columns().is_empty()
    }
}

/// Identifiers available for one compound.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    pub name: Option<Identifier>,
    pub cas: Option<Identifier>,
    pub drugbank_id: Option<Identifier>,
}

impl Row {
    /// Pull the mapped identifier columns out of a record.
    pub fn from_record(record: &Map<String, Value>, mapping: &FieldMapping) -> Self {
        let cell = |column: &Option<String>| {
            column
                .as_deref()
                .and_then(|c| record.get(c))
                .and_then(Identifier::from_value)
        };

        Self {
            name: cell(&mapping.name),
            cas: cell(&mapping.cas),
            drugbank_id: cell(&mapping.drugbank_id),
        }
    }

    pub fn get(&self, field: IdentifierField) -> Option<&Identifier> {
        match field {
            IdentifierField::Name => self.name.as_ref(),
            IdentifierField::Cas => self.cas.as_ref(),
            IdentifierField::DrugBankId => self.drugbank_id.as_ref(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.cas.is_none() && self.drugbank_id.is_none()
    }
}

// =============================================================================
// Outcomes
// =============================================================================

/// Normalized result of a single adapter call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum AdapterOutcome {
    /// The service returned a structure.
    Success(Inchi),
    /// The service definitively does not know the identifier.
    NotFound,
    /// The request failed or timed out.
    TransportError(String),
    /// The service answered with something we could not interpret.
    MalformedResponse(String),
}

impl AdapterOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn inchi(&self) -> Option<&Inchi> {
        match self {
            Self::Success(inchi) => Some(inchi),
            _ => None,
        }
    }

    /// Short description for logs.
    pub fn summary(&self) -> String {
        match self {
            Self::Success(_) => "resolved".to_string(),
            Self::NotFound => "not found".to_string(),
            Self::TransportError(e) => format!("transport error: {}", e),
            Self::MalformedResponse(e) => format!("malformed response: {}", e),
        }
    }
}

/// Why a row ended up unresolved. Diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum UnresolvedReason {
    /// The row had no usable identifier.
    NoIdentifiers,
    /// Every available identifier was tried and failed.
    Exhausted,
    /// Resolution of the row panicked.
    Aborted,
}

/// Final result for one row.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum StructureResult {
    #[serde(rename_all = "camelCase")]
    Resolved {
        inchi: Inchi,
        source: Source,
        field: IdentifierField,
    },
    Unresolved { reason: UnresolvedReason },
}

impl StructureResult {
    pub fn unresolved(reason: UnresolvedReason) -> Self {
        Self::Unresolved { reason }
    }

    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved { .. })
    }

    pub fn inchi(&self) -> Option<&Inchi> {
        match self {
            Self::Resolved { inchi, .. } => Some(inchi),
            Self::Unresolved { .. } => None,
        }
    }

    pub fn source(&self) -> Option<Source> {
        match self {
            Self::Resolved { source, .. } => Some(*source),
            Self::Unresolved { .. } => None,
        }
    }

    /// Column value: the InChI string, or `false` when unresolved.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Resolved { inchi, .. } => Value::String(inchi.as_str().to_string()),
            Self::Unresolved { .. } => Value::Bool(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_identifier_rejects_missing_values() {
        assert!(Identifier::new("").is_none());
        assert!(Identifier::new("   ").is_none());
        assert!(Identifier::new("nan").is_none());
        assert!(Identifier::new("NaN").is_none());
        assert!(Identifier::new("N/A").is_none());
        assert!(Identifier::new("null").is_none());
    }

    #[test]
    fn test_identifier_trims() {
        let id = Identifier::new("  50-00-0 ").unwrap();
        assert_eq!(id.as_str(), "50-00-0");
    }

    #[test]
    fn test_identifier_from_number() {
        let id = Identifier::from_value(&json!(1234)).unwrap();
        assert_eq!(id.as_str(), "1234");
        assert!(Identifier::from_value(&json!(null)).is_none());
        assert!(Identifier::from_value(&json!(true)).is_none());
    }

    #[test]
    fn test_inchi_from_body_takes_first_line() {
        let body = "\nInChI=1S/CH2O/c1-2/h1H2\nInChI=1S/other\n";
        let inchi = Inchi::from_body(body).unwrap();
        assert_eq!(inchi.as_str(), "InChI=1S/CH2O/c1-2/h1H2");
    }

    #[test]
    fn test_inchi_requires_marker() {
        assert!(Inchi::new("C1=CC=CC=C1").is_none());
        assert!(Inchi::from_body("").is_none());
    }

    #[test]
    fn test_priority_steps() {
        let steps = PriorityOrder::DrugBankFirst.steps();
        assert_eq!(steps[0], (IdentifierField::DrugBankId, Source::DrugBank));
        assert_eq!(steps[1], (IdentifierField::Cas, Source::Cactus));

        let steps = PriorityOrder::CasFirst.steps();
        assert_eq!(steps[0], (IdentifierField::Cas, Source::Cactus));
        assert_eq!(steps[1], (IdentifierField::DrugBankId, Source::DrugBank));

        // Names last, CACTUS before PubChem, in both orders.
        for order in [PriorityOrder::DrugBankFirst, PriorityOrder::CasFirst] {
            let tail = &order.steps()[2..];
            assert_eq!(tail[0], (IdentifierField::Name, Source::Cactus));
            assert_eq!(tail[1], (IdentifierField::Name, Source::PubChem));
        }
    }

    #[test]
    fn test_priority_from_str() {
        assert_eq!("cas-first".parse::<PriorityOrder>().unwrap(), PriorityOrder::CasFirst);
        assert_eq!("DRUGBANK_FIRST".parse::<PriorityOrder>().unwrap(), PriorityOrder::DrugBankFirst);
        assert!("name-first".parse::<PriorityOrder>().is_err());
        assert_eq!(serde_json::to_value(PriorityOrder::DrugBankFirst).unwrap(), json!("drugbank-first"));
    }

    #[test]
    fn test_row_from_record() {
        let record = json!({
            "name": "toluene",
            "CAS": "nan",
            "DrugbankID": "",
            "other": "ignored"
        });
        let mapping = FieldMapping::new()
            .with_name("name")
            .with_cas("CAS")
            .with_drugbank_id("DrugbankID");

        let row = Row::from_record(record.as_object().unwrap(), &mapping);
        assert_eq!(row.name.as_ref().map(Identifier::as_str), Some("toluene"));
        assert!(row.cas.is_none());
        assert!(row.drugbank_id.is_none());
        assert!(!row.is_empty());
    }

    #[test]
    fn test_row_ignores_unmapped_columns() {
        let record = json!({ "name": "toluene", "CAS": "108-88-3" });
        let mapping = FieldMapping::new().with_cas("CAS");

        let row = Row::from_record(record.as_object().unwrap(), &mapping);
        assert!(row.name.is_none());
        assert_eq!(row.get(IdentifierField::Cas).map(Identifier::as_str), Some("108-88-3"));
    }

    #[test]
    fn test_structure_result_column_value() {
        let resolved = StructureResult::Resolved {
            inchi: Inchi::new("InChI=1S/CH4/h1H4").unwrap(),
            source: Source::Cactus,
            field: IdentifierField::Cas,
        };
        assert_eq!(resolved.to_value(), json!("InChI=1S/CH4/h1H4"));

        let unresolved = StructureResult::unresolved(UnresolvedReason::Exhausted);
        assert_eq!(unresolved.to_value(), json!(false));
        assert_eq!(
            StructureResult::unresolved(UnresolvedReason::NoIdentifiers).to_value(),
            unresolved.to_value()
        );
    }
}
