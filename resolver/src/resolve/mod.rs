//! Resolution pipeline.
//!
//! - [`orchestrator`] - Per-row fallback chain over the adapters
//! - [`batch`] - In-order driver over a whole dataset
//! - [`assembler`] - Writes results back as a column
//!
//! # Example
//!
//! ```rust,ignore
//! use inchi_resolver::{resolve_file, FieldMapping, ResolveOptions, Resolver, ResolverConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let resolver = Resolver::from_config(&ResolverConfig::from_env()?)?;
//!     let options = ResolveOptions::new(
//!         FieldMapping::new().with_name("name").with_cas("CAS").with_drugbank_id("DrugbankID"),
//!     );
//!     let output = resolve_file("compounds.tsv", None, &options, &resolver).await?;
//!     println!("{} of {} rows resolved", output.report.stats.resolved, output.dataset.len());
//!     Ok(())
//! }
//! ```

pub mod assembler;
pub mod batch;
pub mod orchestrator;

pub use assembler::{attach_results, DEFAULT_RESULT_COLUMN};
pub use batch::{resolve_all, validate_mapping, BatchReport, BatchStats};
pub use orchestrator::{Attempt, Resolver, RowResolution};

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::api::logs::{log_info, log_success};
use crate::error::{AppResult, BatchResult};
use crate::models::{Dataset, FieldMapping};
use crate::parser::{parse_bytes, parse_file, ParseResult};

/// What to read and where to write the result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveOptions {
    pub mapping: FieldMapping,
    /// Output column, created or overwritten
    pub column: String,
}

impl ResolveOptions {
    pub fn new(mapping: FieldMapping) -> Self {
        Self {
            mapping,
            column: DEFAULT_RESULT_COLUMN.to_string(),
        }
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = column.into();
        self
    }
}

/// Source file information
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvInfo {
    pub encoding: String,
    pub delimiter: char,
    pub headers: Vec<String>,
    pub row_count: usize,
}

/// Annotated dataset plus the batch report.
#[derive(Debug, Clone, Serialize)]
pub struct ResolveOutput {
    pub dataset: Dataset,
    pub report: BatchReport,
    /// Present when the input came from delimited text
    pub csv_info: Option<CsvInfo>,
}

/// Resolve all rows and attach the result column.
pub async fn resolve_dataset(
    mut dataset: Dataset,
    options: &ResolveOptions,
    resolver: &Resolver,
) -> BatchResult<ResolveOutput> {
    let report = resolve_all(&dataset, &options.mapping, resolver).await?;
    attach_results(&mut dataset, &report.results(), &options.column)?;

    Ok(ResolveOutput {
        dataset,
        report,
        csv_info: None,
    })
}

/// Read a delimited file, resolve it, and attach the result column.
pub async fn resolve_file<P: AsRef<Path>>(
    path: P,
    delimiter: Option<char>,
    options: &ResolveOptions,
    resolver: &Resolver,
) -> AppResult<ResolveOutput> {
    log_info(format!("📖 Reading {}", path.as_ref().display()));
    let parsed = parse_file(path, delimiter)?;
    resolve_parsed(parsed, options, resolver).await
}

/// Same as [`resolve_file`] for in-memory bytes.
pub async fn resolve_bytes(
    bytes: &[u8],
    delimiter: Option<char>,
    options: &ResolveOptions,
    resolver: &Resolver,
) -> AppResult<ResolveOutput> {
    let parsed = parse_bytes(bytes, delimiter)?;
    resolve_parsed(parsed, options, resolver).await
}

async fn resolve_parsed(
    parsed: ParseResult,
    options: &ResolveOptions,
    resolver: &Resolver,
) -> AppResult<ResolveOutput> {
    log_success(format!("Detected encoding: {}", parsed.encoding));
    log_success(format!("Detected separator: '{}'", format_delimiter(parsed.delimiter)));
    log_success(format!("Read {} rows", parsed.dataset.len()));

    let csv_info = CsvInfo {
        encoding: parsed.encoding,
        delimiter: parsed.delimiter,
        headers: parsed.dataset.headers.clone(),
        row_count: parsed.dataset.len(),
    };

    let mut output = resolve_dataset(parsed.dataset, options, resolver).await?;
    output.csv_info = Some(csv_info);
    Ok(output)
}

/// Format delimiter for display
pub fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ResolverConfig;
    use crate::error::{AppError, BatchError};
    use crate::fetch::testing::ScriptedFetcher;
    use crate::models::PriorityOrder;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    const FIXTURE: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/compounds.tsv");

    fn resolver(fetcher: Arc<ScriptedFetcher>) -> Resolver {
        let config = ResolverConfig {
            cactus_url: "https://cactus.test/structure".into(),
            drugbank_url: "https://drugbank.test/drugs".into(),
            pubchem_url: "https://pubchem.test/rest/pug".into(),
            timeout: Duration::from_millis(50),
            retries: 0,
            retry_delay: Duration::from_millis(0),
            priority: PriorityOrder::DrugBankFirst,
        };
        Resolver::with_fetcher(&config, fetcher).unwrap()
    }

    fn options() -> ResolveOptions {
        ResolveOptions::new(
            FieldMapping::new()
                .with_name("name")
                .with_cas("CAS")
                .with_drugbank_id("DrugbankID"),
        )
    }

    #[tokio::test]
    async fn test_fixture_keeps_cardinality() {
        let fetcher = Arc::new(
            ScriptedFetcher::new()
                .ok("/DB00945.inchi", "InChI=1S/C9H8O4/c1-6(10)13-8-5-3-2-4-7(8)9(11)12/h2-5H,1H3,(H,11,12)")
                .ok("/108-88-3/inchi", "InChI=1S/C7H8/c1-7-5-3-2-4-6-7/h2-6H,1H3")
                .ok("/benzoic/inchi", "InChI=1S/C7H6O2/c8-7(9)6-4-2-1-3-5-6/h1-5H,(H,8,9)"),
        );

        let output = resolve_file(FIXTURE, None, &options(), &resolver(fetcher))
            .await
            .unwrap();

        let info = output.csv_info.as_ref().unwrap();
        assert_eq!(info.delimiter, '\t');
        assert!(output.dataset.len() > 10);
        assert_eq!(output.dataset.len(), info.row_count);
        assert_eq!(output.report.len(), output.dataset.len());
        assert_eq!(output.dataset.headers.last().map(String::as_str), Some("InChI"));

        // Every row gained exactly one value: a structure or `false`.
        for record in &output.dataset.records {
            let value = &record["InChI"];
            assert!(value.as_str().is_some_and(|s| s.contains("InChI")) || value == &json!(false));
        }

        // aspirin (DrugBank), toluene (CAS), benzoic acid (acid retry)
        assert_eq!(output.report.stats.resolved, 3);
        assert_eq!(output.dataset.records[0]["InChI"].as_str().map(|s| &s[..14]), Some("InChI=1S/C9H8O"));
    }

    #[tokio::test]
    async fn test_resolve_dataset_missing_mapped_column() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let ds = Dataset::from_values(vec!["name".into()], vec![json!({ "name": "x" })]);

        let output = resolve_dataset(ds, &options(), &resolver(fetcher))
            .await;
        // CAS and DrugbankID are mapped but absent
        assert!(matches!(output, Err(BatchError::MissingColumn { .. })));
    }

    #[tokio::test]
    async fn test_resolve_bytes() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let options = ResolveOptions::new(FieldMapping::new().with_name("name")).with_column("structure");

        let output = resolve_bytes(b"name;note\nunknown;x\n", None, &options, &resolver(fetcher))
            .await
            .unwrap();

        assert_eq!(output.dataset.headers, vec!["name", "note", "structure"]);
        assert_eq!(output.dataset.records[0]["structure"], json!(false));
    }

    #[tokio::test]
    async fn test_blank_identifier_row_keeps_its_place() {
        let fetcher = Arc::new(ScriptedFetcher::new().ok("/toluene/inchi", "InChI=1S/C7H8/c1-7-5-3-2-4-6-7/h2-6H,1H3"));
        let input = b"name\tCAS\tDrugbankID\ntoluene\t\t\n\t\t\nunknown\t\t\n";

        let output = resolve_bytes(input, None, &options(), &resolver(fetcher.clone()))
            .await
            .unwrap();

        assert_eq!(output.dataset.len(), 3);
        assert_eq!(output.report.len(), 3);
        assert!(output.dataset.records[0]["InChI"].is_string());
        assert_eq!(output.dataset.records[1]["InChI"], json!(false));
        assert_eq!(output.dataset.records[2]["InChI"], json!(false));
        assert_eq!(output.report.stats.no_identifiers, 1);
        // toluene once, unknown against CACTUS and PubChem, blank row never
        assert_eq!(fetcher.request_count(), 3);
    }

    #[tokio::test]
    async fn test_empty_file_is_error() {
        let fetcher = Arc::new(ScriptedFetcher::new());
        let err = resolve_bytes(b"", None, &options(), &resolver(fetcher)).await.unwrap_err();
        assert!(matches!(err, AppError::Csv(_)));
    }

    #[test]
    fn test_format_delimiter() {
        assert_eq!(format_delimiter('\t'), "\\t");
        assert_eq!(format_delimiter(';'), ";");
    }
}
