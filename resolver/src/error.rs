//! Error types for the InChI resolution pipeline.
//!
//! Lookup failures are *not* errors here: adapters turn every upstream
//! problem into an [`crate::models::AdapterOutcome`]. The types below cover
//! what can genuinely abort an operation:
//!
//! - [`FetchError`] - HTTP capability failures (converted at the adapter boundary)
//! - [`CsvError`] - Reading or writing delimited files
//! - [`ConfigError`] - Invalid configuration values
//! - [`BatchError`] - Malformed input to the batch driver
//! - [`AppError`] - Top-level errors for the CLI and server
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// HTTP Fetch Errors
// =============================================================================

/// Errors from the HTTP capability.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request did not complete in time.
    #[error("Request timed out after {0} ms")]
    Timeout(u64),

    /// Connection, DNS or protocol failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The body could not be read as text.
    #[error("Failed to read response body: {0}")]
    Body(String),
}

// =============================================================================
// CSV Errors
// =============================================================================

/// Errors while reading or writing delimited files.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read or write a file.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to decode file bytes.
    #[error("Failed to decode content as {0}")]
    Encoding(String),

    /// Invalid delimited format.
    #[error("Line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in CSV")]
    NoHeaders,

    /// Writer failure.
    #[error("CSV write error: {0}")]
    Write(String),
}

impl From<csv::Error> for CsvError {
    fn from(err: csv::Error) -> Self {
        let line = err
            .position()
            .map(|p| p.line() as usize)
            .unwrap_or(0);
        CsvError::Parse {
            line,
            message: err.to_string(),
        }
    }
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors in resolver configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A service base URL could not be parsed.
    #[error("Invalid URL for {name}: {value}")]
    InvalidUrl { name: String, value: String },

    /// A numeric setting could not be parsed.
    #[error("Invalid value for {name}: {value}")]
    InvalidNumber { name: String, value: String },

    /// Unknown priority order.
    #[error("Unknown priority order: {0} (expected drugbank-first or cas-first)")]
    InvalidPriority(String),

    /// The HTTP client could not be built.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

// =============================================================================
// Batch Errors
// =============================================================================

/// Fatal errors of the batch driver.
///
/// Per-row lookup failures never show up here; only input that makes the
/// whole batch meaningless does.
#[derive(Debug, Error)]
pub enum BatchError {
    /// A column named in the field mapping is not in the dataset.
    #[error("Column '{column}' mapped as {field} is not in the dataset (columns: {available})")]
    MissingColumn {
        field: &'static str,
        column: String,
        available: String,
    },

    /// Result count does not match the dataset length.
    #[error("Cannot attach {results} results to {rows} rows")]
    LengthMismatch { rows: usize, results: usize },
}

// =============================================================================
// Application Errors (top-level)
// =============================================================================

/// Top-level errors returned by the CLI commands and the server.
#[derive(Debug, Error)]
pub enum AppError {
    /// CSV error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Batch error.
    #[error("Batch error: {0}")]
    Batch(#[from] BatchError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for batch operations.
pub type BatchResult<T> = Result<T, BatchError>;

/// Result type for application-level operations.
pub type AppResult<T> = Result<T, AppError>;
