// src/routes/appointment_routes.rs

use axum::{
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};

use crate::{
    error::ApiError,
    models::{
        AppState, AppointmentListQuery, AppointmentListing, AppointmentRow,
        CreateAppointmentRequest, OkResponse, UpdateAppointmentRequest,
    },
    services::AppointmentScheduler,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/appointments", post(create_appointment).get(list_appointments))
        .route(
            "/appointments/{appointment_id}",
            get(get_appointment)
                .put(update_appointment)
                .patch(update_appointment)
                .delete(delete_appointment),
        )
}

/* ============================================================
   POST /appointments
   ============================================================ */

pub async fn create_appointment(
    State(state): State<AppState>,
    payload: Result<Json<CreateAppointmentRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AppointmentRow>), ApiError> {
    let Json(req) = payload?;
    let row = AppointmentScheduler::new(state.store.as_ref()).book(req).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

/* ============================================================
   GET /appointments?patient_id&doctor_id&limit&offset
   ============================================================ */

pub async fn list_appointments(
    State(state): State<AppState>,
    Query(q): Query<AppointmentListQuery>,
) -> Result<Json<Vec<AppointmentListing>>, ApiError> {
    let (filter, page) = q.into_parts()?;
    let rows = AppointmentScheduler::new(state.store.as_ref())
        .list(filter, page)
        .await?;
    Ok(Json(rows))
}

/* ============================================================
   GET /appointments/{id}
   ============================================================ */

pub async fn get_appointment(
    State(state): State<AppState>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<AppointmentRow>, ApiError> {
    let row = AppointmentScheduler::new(state.store.as_ref())
        .get(appointment_id)
        .await?;
    Ok(Json(row))
}

/* ============================================================
   PUT|PATCH /appointments/{id}
   ============================================================ */

pub async fn update_appointment(
    State(state): State<AppState>,
    Path(appointment_id): Path<i64>,
    payload: Result<Json<UpdateAppointmentRequest>, JsonRejection>,
) -> Result<Json<AppointmentRow>, ApiError> {
    let Json(req) = payload?;
    let row = AppointmentScheduler::new(state.store.as_ref())
        .update(appointment_id, req)
        .await?;
    Ok(Json(row))
}

/* ============================================================
   DELETE /appointments/{id}
   ============================================================ */

pub async fn delete_appointment(
    State(state): State<AppState>,
    Path(appointment_id): Path<i64>,
) -> Result<Json<OkResponse>, ApiError> {
    AppointmentScheduler::new(state.store.as_ref())
        .delete(appointment_id)
        .await?;
    Ok(Json(OkResponse::ok()))
}
