//! # InChI Resolver - structure lookup for compound tables
//!
//! Annotates each row of a compound table with an InChI string, looked up
//! from the row's DrugBank ID, CAS number or name against three public
//! services. Rows nothing resolves get `false`.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────────────┐     ┌─────────────┐
//! │  CSV / TSV  │────▶│   Parser    │────▶│  Resolver (per row) │────▶│  Assembler  │
//! │  (ISO/UTF8) │     │  (auto-enc) │     │ DrugBank→CAS→name   │     │ (+ column)  │
//! └─────────────┘     └─────────────┘     └──────────┬──────────┘     └─────────────┘
//!                                                    │
//!                                   ┌────────────────┼────────────────┐
//!                                   ▼                ▼                ▼
//!                              ┌─────────┐     ┌──────────┐     ┌─────────┐
//!                              │ CACTUS  │     │ DrugBank │     │ PubChem │
//!                              └─────────┘     └──────────┘     └─────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use inchi_resolver::{resolve_file, FieldMapping, ResolveOptions, Resolver, ResolverConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let resolver = Resolver::from_config(&ResolverConfig::default()).unwrap();
//!     let options = ResolveOptions::new(FieldMapping::new().with_name("name").with_cas("CAS"));
//!     let output = resolve_file("compounds.tsv", None, &options, &resolver).await.unwrap();
//!     println!("Resolved {} rows", output.report.stats.resolved);
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types per layer
//! - [`models`] - Identifiers, outcomes, results and the [`Dataset`] table
//! - [`parser`] - Delimited text parsing with auto-detection
//! - [`config`] - Service URLs, timeouts and priority
//! - [`fetch`] - HTTP capability used by the adapters
//! - [`adapters`] - CACTUS, DrugBank and PubChem lookups
//! - [`resolve`] - Orchestrator, batch driver and assembler
//! - [`api`] - HTTP API server and log streaming

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Lookups
pub mod adapters;
pub mod fetch;

// Resolution
pub mod resolve;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{AppError, AppResult, BatchError, ConfigError, CsvError, FetchError};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    AdapterOutcome, Dataset, FieldMapping, Identifier, IdentifierField, Inchi, PriorityOrder,
    Row, Source, StructureResult, UnresolvedReason,
};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, parse_bytes, parse_bytes_auto,
    parse_file, parse_file_auto, parse_str, ParseResult,
};

// =============================================================================
// Re-exports - Config & adapters
// =============================================================================

pub use adapters::{CactusAdapter, DrugBankAdapter, LookupAdapter, PubChemAdapter};
pub use config::ResolverConfig;
pub use fetch::{HttpFetch, HttpResponse, ReqwestFetcher};

// =============================================================================
// Re-exports - Resolution
// =============================================================================

pub use resolve::{
    attach_results, format_delimiter, resolve_all, resolve_bytes, resolve_dataset, resolve_file,
    Attempt, BatchReport, BatchStats, CsvInfo, ResolveOptions, ResolveOutput, Resolver,
    RowResolution, DEFAULT_RESULT_COLUMN,
};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{error_response, CsvMetadata, ResolveResponse, ResponseMetadata};

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
