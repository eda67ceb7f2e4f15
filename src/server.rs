//! HTTP relay server.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET`  | `/api/health` | Health check |
//! | `POST` | `/api/upload` | Extract text from a `.txt` or `.pdf` upload (multipart field `file`) |
//! | `POST` | `/api/summarize` | Summarize `{ text, style? }` through the remote model |
//!
//! # Error Contract
//!
//! Every failure returns a JSON object with a human-readable `error` and a
//! machine-readable `code`:
//!
//! ```json
//! { "error": "Text must be at least 50 characters long", "code": "bad_request" }
//! ```
//!
//! Codes: `bad_request` (400), `unauthorized` (401), `quota_exceeded` (429),
//! `extraction_failed` (500), `provider_error` (500).
//!
//! # CORS
//!
//! All origins, methods, and headers are permitted so the browser client can
//! be served from a different origin.

use axum::{
    extract::{
        multipart::{Field, Multipart, MultipartRejection},
        rejection::JsonRejection,
        DefaultBodyLimit, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::Config;
use crate::extract::{self, BoundedBuffer, DocumentKind, UploadError};
use crate::models::{text_len, HealthResponse, SummarizeRequest, SummarizeResponse, UploadResponse};
use crate::provider::{GeminiProvider, ProviderErrorKind, SummaryProvider};
use crate::summarize::{self, SummarizeError};

/// JSON body limit for `/api/summarize`.
const JSON_BODY_LIMIT: usize = 10 * 1024 * 1024;
/// Bytes of a rejected upload read and discarded before giving up.
const UPLOAD_DRAIN_LIMIT: usize = 16 * 1024 * 1024;

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub provider: Arc<dyn SummaryProvider>,
}

impl AppState {
    pub fn new(config: Config, provider: Arc<dyn SummaryProvider>) -> Self {
        Self {
            config: Arc::new(config),
            provider,
        }
    }
}

/// Starts the relay with the Gemini provider built from `config`.
///
/// Binds to `[server].bind` and runs until the process is terminated.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    if !config.provider.has_api_key() {
        warn!("GEMINI_API_KEY is not set; summarize requests will fail with 401");
    }
    let provider = GeminiProvider::new(&config.provider)?;
    info!(model = provider.model(), "using Gemini provider");

    let state = AppState::new(config.clone(), Arc::new(provider));
    let listener = tokio::net::TcpListener::bind(config.bind_addr()?).await?;
    info!("Server running on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state)).await?;
    Ok(())
}

/// Builds the relay's router. Exposed so tests and embedders can supply
/// their own provider and listener.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(handle_health))
        .route(
            "/api/upload",
            // The handler enforces its own 5 MB cap while streaming.
            post(handle_upload).layer(DefaultBodyLimit::disable()),
        )
        .route(
            "/api/summarize",
            post(handle_summarize).layer(DefaultBodyLimit::max(JSON_BODY_LIMIT)),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    code: &'static str,
}

/// Internal error type that converts into an Axum HTTP response.
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    code: &'static str,
    message: String,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.message,
            code: self.code,
        };
        (self.status, Json(body)).into_response()
    }
}

fn bad_request(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::BAD_REQUEST,
        code: "bad_request",
        message: message.into(),
    }
}

impl From<SummarizeError> for AppError {
    fn from(err: SummarizeError) -> Self {
        match err {
            SummarizeError::Provider(e) => match e.kind() {
                ProviderErrorKind::Auth => AppError {
                    status: StatusCode::UNAUTHORIZED,
                    code: "unauthorized",
                    message: "Invalid API key. Please check your Gemini API configuration."
                        .to_string(),
                },
                ProviderErrorKind::Quota => AppError {
                    status: StatusCode::TOO_MANY_REQUESTS,
                    code: "quota_exceeded",
                    message: "API quota exceeded. Please try again later.".to_string(),
                },
                ProviderErrorKind::Other => AppError {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    code: "provider_error",
                    message: format!("Failed to generate summary: {}", e),
                },
            },
            other => bad_request(other.to_string()),
        }
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::Extraction(_) => AppError {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "extraction_failed",
                message: err.to_string(),
            },
            other => bad_request(other.to_string()),
        }
    }
}

// ============ GET /api/health ============

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        message: "Server is running".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// ============ POST /api/summarize ============

/// Handler for `POST /api/summarize`.
///
/// Body rejections (bad JSON, wrong field types) are reported through the
/// same JSON error contract as validation failures.
async fn handle_summarize(
    State(state): State<AppState>,
    body: Result<Json<SummarizeRequest>, JsonRejection>,
) -> Result<Json<SummarizeResponse>, AppError> {
    let Json(request) = body.map_err(|e| bad_request(e.body_text()))?;
    let response = summarize::summarize(state.provider.as_ref(), request).await?;
    Ok(Json(response))
}

// ============ POST /api/upload ============

/// Handler for `POST /api/upload`.
///
/// Takes the first multipart field named `file`. Its declared content type
/// is checked before any of its bytes are read, and reading stops as soon
/// as the size cap is crossed.
async fn handle_upload(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, AppError> {
    let mut multipart = multipart.map_err(|e| bad_request(e.body_text()))?;

    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| UploadError::Malformed(e.body_text()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let kind = DocumentKind::from_content_type(field.content_type()).inspect_err(|e| {
            warn!(content_type = ?field.content_type(), "rejected upload: {}", e);
        })?;
        let filename = field.file_name().map(str::to_string);

        let mut buffer = BoundedBuffer::new();
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| UploadError::Malformed(e.body_text()))?
        {
            if let Err(e) = buffer.push(&chunk) {
                warn!(filename = ?filename, "rejected upload: {}", e);
                drain_field(&mut field).await;
                return Err(e.into());
            }
        }

        let response = extract::extract_upload(buffer.into_inner(), kind, filename)
            .await
            .inspect_err(|e| warn!("upload failed: {}", e))?;
        info!(
            filename = %response.filename,
            length = text_len(&response.text),
            "upload extracted"
        );
        return Ok(Json(response));
    }

    Err(UploadError::NoFile.into())
}

/// Discards the rest of an oversized field so the client receives the 400
/// instead of a reset connection.
async fn drain_field(field: &mut Field<'_>) {
    let mut drained = 0usize;
    while let Ok(Some(chunk)) = field.chunk().await {
        drained += chunk.len();
        if drained > UPLOAD_DRAIN_LIMIT {
            break;
        }
    }
}
