// src/routes/patient_routes.rs

use axum::{
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::{
    error::ApiError,
    models::{AppState, CreatePatientRequest, ListQuery, OkResponse, Page, PatientRow, UpdatePatientRequest},
    services::PatientRegistry,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/patients", post(create_patient).get(list_patients))
        .route(
            "/patients/{patient_id}",
            get(get_patient)
                .put(update_patient)
                .patch(update_patient)
                .delete(delete_patient),
        )
}

pub async fn create_patient(
    State(state): State<AppState>,
    payload: Result<Json<CreatePatientRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<PatientRow>), ApiError> {
    let Json(req) = payload?;
    let row = PatientRegistry::new(state.store.as_ref()).register(req).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

pub async fn list_patients(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Vec<PatientRow>>, ApiError> {
    let page = Page::from_raw(q.limit.as_deref(), q.offset.as_deref());
    let rows = PatientRegistry::new(state.store.as_ref()).list(page).await?;
    Ok(Json(rows))
}

pub async fn get_patient(
    State(state): State<AppState>,
    Path(patient_id): Path<i64>,
) -> Result<Json<PatientRow>, ApiError> {
    let row = PatientRegistry::new(state.store.as_ref()).get(patient_id).await?;
    Ok(Json(row))
}

pub async fn update_patient(
    State(state): State<AppState>,
    Path(patient_id): Path<i64>,
    payload: Result<Json<UpdatePatientRequest>, JsonRejection>,
) -> Result<Json<PatientRow>, ApiError> {
    let Json(req) = payload?;
    let row = PatientRegistry::new(state.store.as_ref())
        .update(patient_id, req)
        .await?;
    Ok(Json(row))
}

pub async fn delete_patient(
    State(state): State<AppState>,
    Path(patient_id): Path<i64>,
) -> Result<Json<OkResponse>, ApiError> {
    PatientRegistry::new(state.store.as_ref()).delete(patient_id).await?;
    Ok(Json(OkResponse::ok()))
}
