//! Local HTTP API for managing reminders.
//!
//! The `remind` client (and anything else on this machine) talks to the
//! running service through these endpoints. Binds to 127.0.0.1 only.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, put};
use axum::{Json, Router};
use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::ReminderError;
use crate::reminder::task::DEFAULT_REPEAT_INTERVAL;
use crate::reminder::{ReminderEngine, Task, TaskDraft, TaskList};

#[derive(Clone)]
pub struct ApiState {
    pub engine: Arc<ReminderEngine>,
}

// --- Request/Response types ---

/// Body of `POST /tasks` and `PUT /tasks/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRequest {
    pub text: String,
    /// 24-hour `HH:MM`.
    pub time: String,
    #[serde(default = "default_repeat_count")]
    pub repeat_count: u32,
    #[serde(default = "default_repeat_interval")]
    pub repeat_interval: u64,
}

fn default_repeat_count() -> u32 {
    1
}

fn default_repeat_interval() -> u64 {
    DEFAULT_REPEAT_INTERVAL
}

impl TaskRequest {
    fn into_draft(self) -> Result<TaskDraft, ReminderError> {
        TaskDraft::new(&self.text, &self.time, self.repeat_count, self.repeat_interval)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub speaking: bool,
    pub pending: usize,
    pub completed: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SimpleResponse {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SimpleResponse {
    fn err(message: impl Into<String>) -> Self {
        Self {
            status: "error".into(),
            error: Some(message.into()),
        }
    }
}

/// Engine error rendered as an HTTP response.
pub struct ApiError(ReminderError);

impl From<ReminderError> for ApiError {
    fn from(e: ReminderError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            ReminderError::DuplicateTime(_) => StatusCode::CONFLICT,
            ReminderError::NotFound(_) => StatusCode::NOT_FOUND,
            ReminderError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ReminderError::Io(_) | ReminderError::Serialization(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(SimpleResponse::err(self.0.to_string()))).into_response()
    }
}

/// Build the axum router.
pub fn router(state: ApiState) -> Router {
    Router::new()
        .route("/status", get(handle_status))
        .route("/tasks", get(handle_list_pending).post(handle_create))
        .route("/tasks/completed", get(handle_list_completed))
        .route("/tasks/completed/{id}", delete(handle_delete_completed))
        .route("/tasks/{id}", put(handle_update).delete(handle_delete_pending))
        .with_state(state)
}

/// Start the API server as a background tokio task.
pub async fn start_api(state: ApiState, port: u16) {
    let app = router(state);
    let addr = format!("127.0.0.1:{port}");
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            warn!("Failed to bind reminder API on {addr}: {e}");
            return;
        }
    };
    info!("Reminder API listening on {addr}");

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            warn!("Reminder API server error: {e}");
        }
    });
}

// --- Handlers ---

async fn handle_status(State(state): State<ApiState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        speaking: state.engine.is_speaking(),
        pending: state.engine.pending().len(),
        completed: state.engine.completed().len(),
    })
}

async fn handle_list_pending(State(state): State<ApiState>) -> Json<Vec<Task>> {
    Json(state.engine.pending())
}

async fn handle_list_completed(State(state): State<ApiState>) -> Json<Vec<Task>> {
    Json(state.engine.completed())
}

async fn handle_create(
    State(state): State<ApiState>,
    Json(req): Json<TaskRequest>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    let draft = req.into_draft()?;
    let task = state.engine.schedule(draft, Local::now())?;
    Ok((StatusCode::CREATED, Json(task)))
}

async fn handle_update(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(req): Json<TaskRequest>,
) -> Result<Json<Task>, ApiError> {
    let draft = req.into_draft()?;
    let task = state.engine.reschedule(&id, draft, Local::now())?;
    Ok(Json(task))
}

async fn handle_delete_pending(State(state): State<ApiState>, Path(id): Path<String>) -> StatusCode {
    state.engine.delete(&id, TaskList::Pending);
    StatusCode::NO_CONTENT
}

async fn handle_delete_completed(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> StatusCode {
    state.engine.delete(&id, TaskList::Completed);
    StatusCode::NO_CONTENT
}
