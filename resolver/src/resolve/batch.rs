//! Batch driver: resolve every row of a dataset, in order.
//!
//! Rows are processed one at a time; a row's lookups finish before the
//! next row starts. Lookup failures are per-row data, and even a panic
//! while resolving row *i* only marks row *i* unresolved.

use futures::FutureExt;
use serde::Serialize;
use std::any::Any;
use std::panic::AssertUnwindSafe;

use super::orchestrator::{Resolver, RowResolution};
use crate::api::logs::{log_error, log_info, log_success, log_warning, LogEntry, LOG_BROADCASTER};
use crate::error::{BatchError, BatchResult};
use crate::models::{Dataset, FieldMapping, Row, Source, StructureResult, UnresolvedReason};

/// Counts over a finished batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchStats {
    pub total: usize,
    pub resolved: usize,
    pub unresolved: usize,
    pub no_identifiers: usize,
    pub aborted: usize,
    pub via_cactus: usize,
    pub via_drugbank: usize,
    pub via_pubchem: usize,
}

impl BatchStats {
    fn record(&mut self, result: &StructureResult) {
        self.total += 1;
        match result {
            StructureResult::Resolved { source, .. } => {
                self.resolved += 1;
                match source {
                    Source::Cactus => self.via_cactus += 1,
                    Source::DrugBank => self.via_drugbank += 1,
                    Source::PubChem => self.via_pubchem += 1,
                }
            }
            StructureResult::Unresolved { reason } => {
                self.unresolved += 1;
                match reason {
                    UnresolvedReason::NoIdentifiers => self.no_identifiers += 1,
                    UnresolvedReason::Aborted => self.aborted += 1,
                    UnresolvedReason::Exhausted => {}
                }
            }
        }
    }
}

/// Per-row resolutions, in input order, plus summary counts.
#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub rows: Vec<RowResolution>,
    pub stats: BatchStats,
}

impl BatchReport {
    pub fn results(&self) -> Vec<StructureResult> {
        self.rows.iter().map(|r| r.result.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Check that every mapped column exists.
pub fn validate_mapping(dataset: &Dataset, mapping: &FieldMapping) -> BatchResult<()> {
    for (field, column) in mapping.columns() {
        if !dataset.has_column(column) {
            return Err(BatchError::MissingColumn {
                field: field.label(),
                column: column.to_string(),
                available: dataset.headers.join(", "),
            });
        }
    }
    Ok(())
}

/// Resolve every row of `dataset` using the identifier columns named in
/// `mapping`.
///
/// The report always has exactly one entry per input row, in input order.
/// The only error is a mapping that names a column the dataset lacks.
pub async fn resolve_all(
    dataset: &Dataset,
    mapping: &FieldMapping,
    resolver: &Resolver,
) -> BatchResult<BatchReport> {
    validate_mapping(dataset, mapping)?;

    let total = dataset.len();
    if mapping.is_empty() {
        log_warning("No identifier columns mapped; every row will be unresolved");
    }
    log_info(format!(
        "🔎 Resolving {} rows (priority: {})",
        total,
        resolver.priority()
    ));

    let mut rows = Vec::with_capacity(total);
    let mut stats = BatchStats::default();

    for (i, record) in dataset.records.iter().enumerate() {
        let row = Row::from_record(record, mapping);

        let resolution = match AssertUnwindSafe(resolver.resolve_row(&row)).catch_unwind().await {
            Ok(resolution) => resolution,
            Err(payload) => {
                log_error(format!(
                    "[{}/{}] resolution aborted: {}",
                    i + 1,
                    total,
                    panic_message(payload.as_ref())
                ));
                RowResolution::unresolved(UnresolvedReason::Aborted, Vec::new())
            }
        };

        report_progress(i, total, &row, &resolution);
        stats.record(&resolution.result);
        rows.push(resolution);
    }

    log_success(format!(
        "Resolved {}/{} rows ({} CACTUS, {} DrugBank, {} PubChem)",
        stats.resolved, stats.total, stats.via_cactus, stats.via_drugbank, stats.via_pubchem
    ));
    if stats.unresolved > 0 {
        log_warning(format!("{} rows unresolved", stats.unresolved));
    }

    Ok(BatchReport { rows, stats })
}

fn report_progress(index: usize, total: usize, row: &Row, resolution: &RowResolution) {
    LOG_BROADCASTER.log(progress_entry(index, total, row, resolution));
}

/// Per-row progress line. Rows without identifiers are expected input and
/// log at info level; failed lookups are warnings.
fn progress_entry(index: usize, total: usize, row: &Row, resolution: &RowResolution) -> LogEntry {
    let prefix = format!("[{}/{}] {}", index + 1, total, row_label(row));
    let entry = match &resolution.result {
        StructureResult::Resolved { source, field, .. } => {
            LogEntry::success(format!("{} → {} (by {})", prefix, source, field))
        }
        StructureResult::Unresolved {
            reason: UnresolvedReason::NoIdentifiers,
        } => LogEntry::info(format!("{} → skipped (no identifiers)", prefix)),
        StructureResult::Unresolved {
            reason: UnresolvedReason::Aborted,
        } => LogEntry::warning(format!("{} → unresolved (aborted)", prefix)),
        StructureResult::Unresolved {
            reason: UnresolvedReason::Exhausted,
        } => {
            let why = resolution
                .attempts
                .iter()
                .map(|a| format!("{}: {}", a.source, a.outcome.summary()))
                .collect::<Vec<_>>()
                .join("; ");
            LogEntry::warning(format!("{} → unresolved ({})", prefix, why))
        }
    };
    entry.with_indent(1)
}

/// Human-readable label for progress lines.
fn row_label(row: &Row) -> String {
    row.name
        .as_ref()
        .or(row.cas.as_ref())
        .or(row.drugbank_id.as_ref())
        .map(|id| id.to_string())
        .unwrap_or_else(|| "(empty row)".to_string())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
