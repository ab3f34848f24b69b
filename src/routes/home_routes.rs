use axum::{Json, Router, extract::State, routing::get};

use crate::error::ApiError;
use crate::models::{AppState, OkResponse};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
}

pub async fn home() -> &'static str {
    "Clinic CRUD API is running"
}

/// Readiness: succeeds only when the store answers.
pub async fn health(State(state): State<AppState>) -> Result<Json<OkResponse>, ApiError> {
    state
        .store
        .ping()
        .await
        .map_err(|e| ApiError::Internal(format!("store unavailable: {e}")))?;
    Ok(Json(OkResponse::ok()))
}
