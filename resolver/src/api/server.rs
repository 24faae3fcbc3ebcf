//! HTTP server for the resolver API.
//!
//! # API Endpoints
//!
//! | Method | Path              | Description                          |
//! |--------|-------------------|--------------------------------------|
//! | GET    | `/health`         | Health check                         |
//! | POST   | `/api/resolve`    | Upload a table and resolve it        |
//! | GET    | `/api/logs`       | SSE stream for real-time logs        |
//!
//! `/api/resolve` takes a multipart body with a `file` part and optional
//! text parts `name`, `cas`, `drugbank` (column names), `priority` and
//! `column`.

use axum::{
    extract::{Multipart, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, Json, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_error, log_info, LOG_BROADCASTER};
use super::types::{error_response, ResolveResponse};
use crate::config::ResolverConfig;
use crate::error::{AppError, ConfigError};
use crate::models::{FieldMapping, PriorityOrder};
use crate::resolve::{resolve_bytes, ResolveOptions, Resolver, DEFAULT_RESULT_COLUMN};

type ApiError = (StatusCode, Json<Value>);

/// Start the HTTP server
pub async fn start_server(port: u16, config: ResolverConfig) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;

    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    let app = Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/resolve", post(resolve_upload))
        .route("/api/logs", get(sse_logs))
        .layer(cors)
        .with_state(Arc::new(config));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 InChI resolver running on http://localhost:{}", port);
    println!("   POST /api/resolve - Upload a compound table");
    println!("   GET  /api/logs    - SSE log stream");
    println!("   GET  /health      - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health(State(config): State<Arc<ResolverConfig>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "inchi-resolver",
        "version": env!("CARGO_PKG_VERSION"),
        "priority": config.priority,
        "endpoints": {
            "resolve": "POST /api/resolve",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    // Lagged receivers just skip what they missed
    let stream = BroadcastStream::new(rx).filter_map(|result| {
        let entry = result.ok()?;
        let json = serde_json::to_string(&entry).ok()?;
        Some(Ok(Event::default().data(json)))
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Fields collected from a `/api/resolve` multipart body.
#[derive(Debug, Default)]
struct ResolveForm {
    file: Option<Vec<u8>>,
    file_name: Option<String>,
    name: Option<String>,
    cas: Option<String>,
    drugbank: Option<String>,
    priority: Option<String>,
    column: Option<String>,
}

impl ResolveForm {
    /// Record a text part. Blank values count as not sent.
    fn set_text(&mut self, field: &str, value: String) {
        let value = value.trim();
        if value.is_empty() {
            return;
        }
        let slot = match field {
            "name" => &mut self.name,
            "cas" => &mut self.cas,
            "drugbank" => &mut self.drugbank,
            "priority" => &mut self.priority,
            "column" => &mut self.column,
            _ => return,
        };
        *slot = Some(value.to_string());
    }

    fn mapping(&self) -> FieldMapping {
        FieldMapping {
            name: self.name.clone(),
            cas: self.cas.clone(),
            drugbank_id: self.drugbank.clone(),
        }
    }

    fn priority(&self, default: PriorityOrder) -> Result<PriorityOrder, ConfigError> {
        match self.priority.as_deref() {
            Some(value) => value.parse(),
            None => Ok(default),
        }
    }

    fn column(&self) -> String {
        self.column
            .clone()
            .unwrap_or_else(|| DEFAULT_RESULT_COLUMN.to_string())
    }
}

async fn read_form(mut multipart: Multipart) -> Result<ResolveForm, ApiError> {
    let mut form = ResolveForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(&format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        if name == "file" {
            form.file_name = field.file_name().map(|s| s.to_string());
            let bytes = field
                .bytes()
                .await
                .map_err(|e| bad_request(&format!("Read error: {}", e)))?;
            form.file = Some(bytes.to_vec());
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| bad_request(&format!("Read error: {}", e)))?;
            form.set_text(&name, text);
        }
    }

    Ok(form)
}

/// Upload and resolve endpoint
async fn resolve_upload(
    State(config): State<Arc<ResolverConfig>>,
    multipart: Multipart,
) -> Result<Json<ResolveResponse>, ApiError> {
    let form = read_form(multipart).await?;

    let bytes = form
        .file
        .as_deref()
        .ok_or_else(|| bad_request("No file provided"))?;

    let mapping = form.mapping();
    if mapping.is_empty() {
        return Err(bad_request("Map at least one of name, cas or drugbank to a column"));
    }

    let priority = form
        .priority(config.priority)
        .map_err(|e| bad_request(&e.to_string()))?;
    let column = form.column();

    log_info(format!(
        "📄 New upload: {} ({} bytes, {})",
        form.file_name.as_deref().unwrap_or("unknown"),
        bytes.len(),
        priority
    ));

    let resolver = Resolver::from_config(&config.as_ref().clone().with_priority(priority))
        .map_err(|e| internal_error(&AppError::from(e)))?;
    let options = ResolveOptions::new(mapping.clone()).with_column(column.clone());

    let output = resolve_bytes(bytes, None, &options, &resolver)
        .await
        .map_err(|e| {
            log_error(format!("Resolve error: {}", e));
            (error_status(&e), Json(error_response(&e.to_string())))
        })?;

    Ok(Json(ResolveResponse::new(output, priority, column, mapping)))
}

/// Caller mistakes are 400, everything else 500.
fn error_status(error: &AppError) -> StatusCode {
    match error {
        AppError::Csv(_) | AppError::Batch(_) => StatusCode::BAD_REQUEST,
        AppError::Config(_) | AppError::Json(_) | AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn bad_request(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(error_response(message)))
}

fn internal_error(error: &AppError) -> ApiError {
    (error_status(error), Json(error_response(&error.to_string())))
}
