//! REST API types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::models::{FieldMapping, PriorityOrder};
use crate::resolve::{format_delimiter, BatchStats, ResolveOutput, RowResolution};

/// Response sent after a CSV upload has been resolved.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveResponse {
    /// Unique job identifier
    pub job_id: String,

    /// "ready" when every row resolved, "warning" otherwise
    pub status: String,

    /// Input rows with the result column added, in input order
    pub records: Vec<Value>,

    /// Per-row attempt traces, same order as `records`
    pub resolutions: Vec<RowResolution>,

    pub metadata: ResponseMetadata,
}

/// Metadata about the batch
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMetadata {
    pub processed_at: DateTime<Utc>,
    pub priority: PriorityOrder,
    pub column: String,
    pub mapping: FieldMapping,
    pub csv_info: Option<CsvMetadata>,
    pub stats: BatchStats,
}

/// CSV file metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CsvMetadata {
    pub encoding: String,
    pub delimiter: String,
    pub row_count: usize,
    pub columns: Vec<String>,
}

impl ResolveResponse {
    pub fn new(
        output: ResolveOutput,
        priority: PriorityOrder,
        column: String,
        mapping: FieldMapping,
    ) -> Self {
        let stats = output.report.stats.clone();
        let status = if stats.unresolved == 0 { "ready" } else { "warning" };

        Self {
            job_id: Uuid::new_v4().to_string(),
            status: status.to_string(),
            records: output.dataset.to_json_records(),
            resolutions: output.report.rows,
            metadata: ResponseMetadata {
                processed_at: Utc::now(),
                priority,
                column,
                mapping,
                csv_info: output.csv_info.map(|info| CsvMetadata {
                    encoding: info.encoding,
                    delimiter: format_delimiter(info.delimiter),
                    row_count: info.row_count,
                    columns: info.headers,
                }),
                stats,
            },
        }
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
        "records": [],
        "resolutions": []
    })
}
