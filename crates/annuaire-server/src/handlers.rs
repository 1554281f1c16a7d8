//! HTTP request handlers
//!
//! Route set:
//!
//! | Route | Purpose |
//! |---|---|
//! | `GET /annuaire`, `GET /evenements` | list stored records |
//! | `POST /process-annuaire`, `POST /process-evenement` | ingest a URL, file or text (multipart form) |
//! | `PUT /replace-annuaire`, `PUT /replace-evenement` | overwrite records by `numero` |
//! | `POST /add-annuaire`, `POST /add-evenement` | insert one record as is |
//! | `GET /health` | liveness |

use crate::AppIngestor;
use annuaire_domain::{Record, RecordId, RecordKind, StoredRecord};
use annuaire_pipeline::{BatchResult, BatchStatus, IngestError, Source};
use axum::{
    extract::{multipart::MultipartError, DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post, put},
    Router as AxumRouter,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::{error, warn};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// The ingestion pipeline
    pub ingestor: Arc<AppIngestor>,
    /// Largest accepted request body (bytes)
    pub max_upload_bytes: usize,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheckResponse {
    /// Always `ok` when the process answers
    pub status: String,
}

/// Plain acknowledgment
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Human-readable outcome
    pub message: String,
    /// Id of the added record, when one was created
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub numero: Option<RecordId>,
}

/// A held-back candidate as reported to clients
#[derive(Debug, Serialize)]
pub struct DuplicateEntry {
    /// The candidate that was not inserted
    pub new_entry: Record,
    /// Stored records it resembles
    pub existing_entries: Vec<StoredRecord>,
}

/// Outcome of a process request
#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    /// Always "Processing completed."
    pub message: String,
    /// Inserted records with their new ids
    pub successful_inserts: Vec<StoredRecord>,
    /// Possible duplicates; absent when there are none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duplicates: Option<Vec<DuplicateEntry>>,
}

impl From<BatchResult> for ProcessResponse {
    fn from(result: BatchResult) -> Self {
        let duplicates = (!result.duplicate_groups.is_empty()).then(|| {
            result
                .duplicate_groups
                .into_iter()
                .map(|group| DuplicateEntry {
                    new_entry: group.candidate,
                    existing_entries: group.matches.into_iter().map(|m| m.existing).collect(),
                })
                .collect()
        });

        ProcessResponse {
            message: "Processing completed.".to_string(),
            successful_inserts: result.inserted_records,
            duplicates,
        }
    }
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

/// Application error type
#[derive(Debug)]
pub enum AppError {
    /// Pipeline error
    Ingest(IngestError),
    /// Malformed request body
    BadRequest(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::Ingest(e) => {
                let status = match &e {
                    IngestError::Input(_)
                    | IngestError::Acquisition(_)
                    | IngestError::Validation(_) => StatusCode::BAD_REQUEST,
                    IngestError::Extraction(_) | IngestError::Database(_) => {
                        StatusCode::INTERNAL_SERVER_ERROR
                    }
                };
                if status.is_server_error() {
                    error!("Request failed: {}", e);
                } else {
                    warn!("Request rejected: {}", e);
                }
                (status, e.to_string())
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = Json(ErrorResponse { error: message });
        (status, body).into_response()
    }
}

impl From<IngestError> for AppError {
    fn from(e: IngestError) -> Self {
        AppError::Ingest(e)
    }
}

fn bad_form(e: MultipartError) -> AppError {
    AppError::BadRequest(format!("Invalid form data: {}", e))
}

/// Read the `url`, `file` and `text` fields of a process form
async fn read_form(multipart: Option<Multipart>) -> Result<Source, AppError> {
    let (mut url, mut file, mut text) = (None, None, None);

    if let Some(mut multipart) = multipart {
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(bad_form)?
        {
            let name = field.name().map(str::to_string);
            match name.as_deref() {
                Some("url") => url = Some(field.text().await.map_err(bad_form)?),
                Some("text") => text = Some(field.text().await.map_err(bad_form)?),
                Some("file") => {
                    let file_name = field.file_name().unwrap_or_default().to_string();
                    let bytes = field.bytes().await.map_err(bad_form)?;
                    file = Some((file_name, bytes.to_vec()));
                }
                _ => {}
            }
        }
    }

    Source::select(url, file, text).map_err(|e| AppError::Ingest(e.into()))
}

async fn list(state: AppState, kind: RecordKind) -> Result<Json<Vec<StoredRecord>>, AppError> {
    Ok(Json(state.ingestor.list(kind).await?))
}

async fn process(
    state: AppState,
    kind: RecordKind,
    multipart: Option<Multipart>,
) -> Result<(StatusCode, Json<ProcessResponse>), AppError> {
    let source = read_form(multipart).await?;
    let result = state.ingestor.ingest(kind, source).await?;

    let status = match result.status() {
        BatchStatus::Conflict => StatusCode::CONFLICT,
        _ => StatusCode::CREATED,
    };
    Ok((status, Json(result.into())))
}

async fn replace(
    state: AppState,
    kind: RecordKind,
    payload: Value,
) -> Result<Json<MessageResponse>, AppError> {
    state.ingestor.replace(kind, &payload).await?;
    Ok(Json(MessageResponse {
        message: format!("Entries in {} replaced successfully", kind.table()),
        numero: None,
    }))
}

async fn add(
    state: AppState,
    kind: RecordKind,
    payload: Value,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let stored = state.ingestor.add(kind, &payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: format!("Entry added to {} successfully", kind.table()),
            numero: Some(stored.id),
        }),
    ))
}

/// GET /annuaire
async fn list_annuaire(
    State(state): State<AppState>,
) -> Result<Json<Vec<StoredRecord>>, AppError> {
    list(state, RecordKind::DirectoryEntry).await
}

/// GET /evenements
async fn list_evenements(
    State(state): State<AppState>,
) -> Result<Json<Vec<StoredRecord>>, AppError> {
    list(state, RecordKind::EventEntry).await
}

/// POST /process-annuaire
async fn process_annuaire(
    State(state): State<AppState>,
    multipart: Option<Multipart>,
) -> Result<(StatusCode, Json<ProcessResponse>), AppError> {
    process(state, RecordKind::DirectoryEntry, multipart).await
}

/// POST /process-evenement
async fn process_evenement(
    State(state): State<AppState>,
    multipart: Option<Multipart>,
) -> Result<(StatusCode, Json<ProcessResponse>), AppError> {
    process(state, RecordKind::EventEntry, multipart).await
}

/// PUT /replace-annuaire
async fn replace_annuaire(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<MessageResponse>, AppError> {
    replace(state, RecordKind::DirectoryEntry, payload).await
}

/// PUT /replace-evenement
async fn replace_evenement(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<Json<MessageResponse>, AppError> {
    replace(state, RecordKind::EventEntry, payload).await
}

/// POST /add-annuaire
async fn add_annuaire(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    add(state, RecordKind::DirectoryEntry, payload).await
}

/// POST /add-evenement
async fn add_evenement(
    State(state): State<AppState>,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    add(state, RecordKind::EventEntry, payload).await
}

/// GET /health
async fn health_check() -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "ok".to_string(),
    })
}

/// Create the axum router with all routes
pub fn create_router(state: AppState) -> AxumRouter {
    let body_limit = DefaultBodyLimit::max(state.max_upload_bytes);

    AxumRouter::new()
        .route("/annuaire", get(list_annuaire))
        .route("/evenements", get(list_evenements))
        .route("/process-annuaire", post(process_annuaire))
        .route("/process-evenement", post(process_evenement))
        .route("/replace-annuaire", put(replace_annuaire))
        .route("/replace-evenement", put(replace_evenement))
        .route("/add-annuaire", post(add_annuaire))
        .route("/add-evenement", post(add_evenement))
        .route("/health", get(health_check))
        .layer(body_limit)
        .with_state(state)
}
