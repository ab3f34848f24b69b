use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::de::Deserializer;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::error::ClinicError;
use crate::patch::{FieldValue, Patch};
use crate::store::ClinicStore;

pub const DEFAULT_DURATION_MINUTES: i32 = 30;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn ClinicStore>,
}

/* -------------------------
   API DTOs
--------------------------*/

#[derive(Debug, Serialize)]
pub struct OkResponse {
    pub data: OkData,
}

#[derive(Debug, Serialize)]
pub struct OkData {
    pub ok: bool,
}

impl OkResponse {
    pub fn ok() -> Self {
        OkResponse {
            data: OkData { ok: true },
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreatePatientRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdatePatientRequest {
    #[serde(default, deserialize_with = "deserialize_double_option")]
    pub first_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_double_option")]
    pub last_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_double_option")]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_double_option")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_double_option")]
    pub date_of_birth: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "deserialize_double_option")]
    pub gender: Option<Option<String>>,
}

#[derive(Debug, Deserialize)]
pub struct CreateAppointmentRequest {
    pub patient_id: i64,
    pub doctor_id: i64,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: Option<i32>,
    pub reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateAppointmentRequest {
    #[serde(default, deserialize_with = "deserialize_double_option")]
    pub patient_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "deserialize_double_option")]
    pub doctor_id: Option<Option<i64>>,
    #[serde(default, deserialize_with = "deserialize_double_option")]
    pub scheduled_at: Option<Option<DateTime<Utc>>>,
    #[serde(default, deserialize_with = "deserialize_double_option")]
    pub duration_minutes: Option<Option<i32>>,
    #[serde(default, deserialize_with = "deserialize_double_option")]
    pub status: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_double_option")]
    pub reason: Option<Option<String>>,
}

/// Query strings arrive as text; parsing happens in `Page::from_raw`.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<String>,
    pub offset: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AppointmentListQuery {
    pub patient_id: Option<String>,
    pub doctor_id: Option<String>,
    pub limit: Option<String>,
    pub offset: Option<String>,
}

fn deserialize_double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    // Only called when the field is present: null => Some(None), value => Some(Some(v)).
    let inner = Option::<T>::deserialize(deserializer)?;
    Ok(Some(inner))
}

/* -------------------------
   DB Row Models
--------------------------*/

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PatientRow {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AppointmentRow {
    pub id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub status: String,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Appointment joined with the display names of its patient and doctor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct AppointmentListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub appointment: AppointmentRow,
    pub patient_first: String,
    pub patient_last: String,
    pub doctor_first: String,
    pub doctor_last: String,
}

/* -------------------------
   Store inputs
--------------------------*/

#[derive(Debug, Clone, PartialEq)]
pub struct NewPatient {
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAppointment {
    pub patient_id: i64,
    pub doctor_id: i64,
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppointmentFilter {
    pub patient_id: Option<i64>,
    pub doctor_id: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: i64,
    pub offset: i64,
}

impl Page {
    pub const DEFAULT_LIMIT: i64 = 50;
    pub const MAX_LIMIT: i64 = 500;

    /// Malformed or out-of-range input falls back to the defaults instead of erroring.
    /// A valid limit above `MAX_LIMIT` is capped to it.
    pub fn from_raw(limit: Option<&str>, offset: Option<&str>) -> Self {
        let limit = limit
            .and_then(|s| s.trim().parse::<i64>().ok())
            .filter(|v| *v > 0)
            .map(|v| v.min(Self::MAX_LIMIT))
            .unwrap_or(Self::DEFAULT_LIMIT);
        let offset = offset
            .and_then(|s| s.trim().parse::<i64>().ok())
            .filter(|v| *v >= 0)
            .unwrap_or(0);
        Page { limit, offset }
    }
}

impl Default for Page {
    fn default() -> Self {
        Page {
            limit: Self::DEFAULT_LIMIT,
            offset: 0,
        }
    }
}

/* -------------------------
   Request -> store input
--------------------------*/

// Present-but-null is an error for columns that cannot be cleared.
fn not_null<T>(field: &str, value: Option<Option<T>>) -> Result<Option<T>, ClinicError> {
    match value {
        Some(None) => Err(ClinicError::Validation(format!("{field} must not be null"))),
        Some(Some(v)) => Ok(Some(v)),
        None => Ok(None),
    }
}

fn required_name(field: &str, value: &str) -> Result<String, ClinicError> {
    let t = value.trim();
    if t.is_empty() {
        return Err(ClinicError::Validation(format!("{field} must not be empty")));
    }
    Ok(t.to_string())
}

impl CreatePatientRequest {
    pub fn into_new_patient(self) -> Result<NewPatient, ClinicError> {
        Ok(NewPatient {
            first_name: required_name("first_name", &self.first_name)?,
            last_name: required_name("last_name", &self.last_name)?,
            email: self.email,
            phone: self.phone,
            date_of_birth: self.date_of_birth,
            gender: self.gender,
        })
    }
}

impl UpdatePatientRequest {
    pub fn into_patch(self) -> Result<Patch, ClinicError> {
        let first_name = not_null("first_name", self.first_name)?
            .map(|s| required_name("first_name", &s))
            .transpose()?;
        let last_name = not_null("last_name", self.last_name)?
            .map(|s| required_name("last_name", &s))
            .transpose()?;

        let mut patch = Patch::new();
        patch.set_if("first_name", first_name, |s| FieldValue::Text(Some(s)));
        patch.set_if("last_name", last_name, |s| FieldValue::Text(Some(s)));
        patch.set_if("email", self.email, FieldValue::Text);
        patch.set_if("phone", self.phone, FieldValue::Text);
        patch.set_if("date_of_birth", self.date_of_birth, FieldValue::Date);
        patch.set_if("gender", self.gender, FieldValue::Text);
        Ok(patch)
    }
}

impl CreateAppointmentRequest {
    pub fn into_new_appointment(self) -> Result<NewAppointment, ClinicError> {
        let duration_minutes = match self.duration_minutes {
            None | Some(0) => DEFAULT_DURATION_MINUTES,
            Some(d) if d < 0 => {
                return Err(ClinicError::Validation(
                    "duration_minutes must be positive".into(),
                ));
            }
            Some(d) => d,
        };
        Ok(NewAppointment {
            patient_id: self.patient_id,
            doctor_id: self.doctor_id,
            scheduled_at: self.scheduled_at,
            duration_minutes,
            reason: self.reason,
        })
    }
}

impl UpdateAppointmentRequest {
    pub fn into_patch(self) -> Result<Patch, ClinicError> {
        let patient_id = not_null("patient_id", self.patient_id)?;
        let doctor_id = not_null("doctor_id", self.doctor_id)?;
        let scheduled_at = not_null("scheduled_at", self.scheduled_at)?;
        let duration_minutes = not_null("duration_minutes", self.duration_minutes)?;
        let status = not_null("status", self.status)?;

        if let Some(d) = duration_minutes {
            if d <= 0 {
                return Err(ClinicError::Validation(
                    "duration_minutes must be positive".into(),
                ));
            }
        }

        let mut patch = Patch::new();
        patch.set_if("patient_id", patient_id, FieldValue::BigInt);
        patch.set_if("doctor_id", doctor_id, FieldValue::BigInt);
        patch.set_if("scheduled_at", scheduled_at, FieldValue::Timestamp);
        patch.set_if("duration_minutes", duration_minutes, FieldValue::Int);
        patch.set_if("status", status, |s| FieldValue::Text(Some(s)));
        patch.set_if("reason", self.reason, FieldValue::Text);
        Ok(patch)
    }
}

fn parse_id_filter(field: &str, raw: Option<&str>) -> Result<Option<i64>, ClinicError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s
            .parse::<i64>()
            .map(Some)
            .map_err(|_| ClinicError::Validation(format!("{field} must be an integer"))),
    }
}

impl AppointmentListQuery {
    pub fn into_parts(self) -> Result<(AppointmentFilter, Page), ClinicError> {
        let filter = AppointmentFilter {
            patient_id: parse_id_filter("patient_id", self.patient_id.as_deref())?,
            doctor_id: parse_id_filter("doctor_id", self.doctor_id.as_deref())?,
        };
        Ok((filter, Page::from_raw(self.limit.as_deref(), self.offset.as_deref())))
    }
}
