//! Result assembler: write per-row results into a dataset column.

use crate::error::BatchResult;
use crate::models::{Dataset, StructureResult};

/// Column name used when none is given.
pub const DEFAULT_RESULT_COLUMN: &str = "InChI";

/// Store one result per row under `column`.
///
/// Resolved rows get their InChI string, unresolved rows get `false`. An
/// existing column of the same name is overwritten.
pub fn attach_results(
    dataset: &mut Dataset,
    results: &[StructureResult],
    column: &str,
) -> BatchResult<()> {
    let values = results.iter().map(StructureResult::to_value).collect();
    dataset.set_column(column, values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BatchError;
    use crate::models::{IdentifierField, Inchi, Source, UnresolvedReason};
    use serde_json::json;

    fn resolved(inchi: &str) -> StructureResult {
        StructureResult::Resolved {
            inchi: Inchi::new(inchi).unwrap(),
            source: Source::Cactus,
            field: IdentifierField::Name,
        }
    }

    #[test]
    fn test_attach_positional() {
        let mut ds = Dataset::from_values(
            vec!["name".into()],
            vec![json!({ "name": "toluene" }), json!({ "name": "unknown" })],
        );
        let results = vec![
            resolved("InChI=1S/C7H8"),
            StructureResult::unresolved(UnresolvedReason::Exhausted),
        ];

        attach_results(&mut ds, &results, DEFAULT_RESULT_COLUMN).unwrap();

        assert_eq!(ds.headers, vec!["name", "InChI"]);
        assert_eq!(ds.records[0]["InChI"], "InChI=1S/C7H8");
        assert_eq!(ds.records[1]["InChI"], json!(false));
    }

    #[test]
    fn test_attach_overwrites_existing_column() {
        let mut ds = Dataset::from_values(
            vec!["name".into(), "InChI".into()],
            vec![json!({ "name": "toluene", "InChI": "stale" })],
        );

        attach_results(&mut ds, &[resolved("InChI=1S/C7H8")], "InChI").unwrap();

        assert_eq!(ds.headers, vec!["name", "InChI"]);
        assert_eq!(ds.records[0]["InChI"], "InChI=1S/C7H8");
    }

    #[test]
    fn test_attach_length_mismatch() {
        let mut ds = Dataset::from_values(vec!["name".into()], vec![json!({ "name": "a" })]);
        let err = attach_results(&mut ds, &[], "InChI").unwrap_err();
        assert!(matches!(err, BatchError::LengthMismatch { rows: 1, results: 0 }));
    }
}
