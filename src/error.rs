use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::store::StoreError;

pub const NOTHING_TO_UPDATE: &str = "No fields to update";
pub const SLOT_TAKEN: &str = "Doctor already has an appointment at that scheduled_at";

/// Outcome of a registry or scheduler operation that did not succeed.
#[derive(Debug, Error)]
pub enum ClinicError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    SlotConflict(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    PatientInUse(String),

    #[error("{0}")]
    Storage(String),
}

impl ClinicError {
    pub fn nothing_to_update() -> Self {
        ClinicError::Validation(NOTHING_TO_UPDATE.into())
    }
}

impl From<StoreError> for ClinicError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::SlotTaken => ClinicError::SlotConflict(SLOT_TAKEN.into()),
            StoreError::StillReferenced => ClinicError::PatientInUse(
                "Patient still has appointments; delete them first".into(),
            ),
            StoreError::Backend(msg) => ClinicError::Storage(msg),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorObject,
}

#[derive(Debug, Serialize)]
pub struct ErrorObject {
    pub code: String,
    pub message: String,
}

#[derive(Debug)]
pub enum ApiError {
    BadRequest(&'static str, String),
    NotFound(&'static str, String),
    Conflict(&'static str, String),
    Internal(String),
}

impl ApiError {
    fn to_error_response(code: &str, message: &str) -> Json<ErrorResponse> {
        Json(ErrorResponse {
            error: ErrorObject {
                code: code.to_string(),
                message: message.to_string(),
            },
        })
    }
}

impl From<ClinicError> for ApiError {
    fn from(e: ClinicError) -> Self {
        let message = e.to_string();
        match e {
            ClinicError::NotFound(_) => ApiError::NotFound("NOT_FOUND", message),
            ClinicError::SlotConflict(_) => ApiError::Conflict("SLOT_CONFLICT", message),
            ClinicError::Validation(_) => ApiError::BadRequest("VALIDATION_ERROR", message),
            ClinicError::PatientInUse(_) => ApiError::Conflict("PATIENT_IN_USE", message),
            ClinicError::Storage(_) => ApiError::Internal(message),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest("VALIDATION_ERROR", rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(code, msg) => {
                (StatusCode::BAD_REQUEST, ApiError::to_error_response(code, &msg)).into_response()
            }
            ApiError::NotFound(code, msg) => {
                (StatusCode::NOT_FOUND, ApiError::to_error_response(code, &msg)).into_response()
            }
            ApiError::Conflict(code, msg) => {
                (StatusCode::CONFLICT, ApiError::to_error_response(code, &msg)).into_response()
            }
            ApiError::Internal(msg) => {
                tracing::error!("internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError::to_error_response("INTERNAL", &msg),
                )
                    .into_response()
            }
        }
    }
}
