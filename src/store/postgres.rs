// src/store/postgres.rs

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::{ClinicStore, ConflictCheckingStore, PatientStore, StoreError};
use crate::models::{
    AppointmentFilter, AppointmentListing, AppointmentRow, NewAppointment, NewPatient, Page,
    PatientRow,
};
use crate::patch::{FieldValue, Patch};

pub const SLOT_CONSTRAINT: &str = "appointments_doctor_slot_key";

const PATIENT_COLUMNS: &str =
    "id, first_name, last_name, email, phone, date_of_birth, gender, created_at";

const APPOINTMENT_COLUMNS: &str =
    "id, patient_id, doctor_id, scheduled_at, duration_minutes, status, reason, created_at";

const LISTING_SELECT: &str = r#"
        SELECT
          a.id,
          a.patient_id,
          a.doctor_id,
          a.scheduled_at,
          a.duration_minutes,
          a.status,
          a.reason,
          a.created_at,
          p.first_name AS patient_first,
          p.last_name  AS patient_last,
          d.first_name AS doctor_first,
          d.last_name  AS doctor_last
        FROM appointments a
        JOIN patients p ON p.id = a.patient_id
        JOIN doctors d ON d.id = a.doctor_id
        "#;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(format!("db error: {e}"))
}

/// Classifies errors from writes that are guarded by the slot constraint.
fn slot_guarded(e: sqlx::Error) -> StoreError {
    if let Some(db) = e.as_database_error() {
        if db.is_unique_violation() && db.constraint() == Some(SLOT_CONSTRAINT) {
            return StoreError::SlotTaken;
        }
    }
    backend(e)
}

fn reference_guarded(e: sqlx::Error) -> StoreError {
    if let Some(db) = e.as_database_error() {
        if db.is_foreign_key_violation() {
            return StoreError::StillReferenced;
        }
    }
    backend(e)
}

// UPDATE <table> SET col = $n, ... WHERE id = $m
pub(crate) fn build_update(table: &'static str, id: i64, patch: &Patch) -> QueryBuilder<'static, Postgres> {
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(format!("UPDATE {table} SET "));
    {
        let mut set = qb.separated(", ");
        for (column, value) in patch.iter() {
            set.push(format!("{column} = "));
            match value {
                FieldValue::Text(v) => set.push_bind_unseparated(v.clone()),
                FieldValue::Int(v) => set.push_bind_unseparated(*v),
                FieldValue::BigInt(v) => set.push_bind_unseparated(*v),
                FieldValue::Date(v) => set.push_bind_unseparated(*v),
                FieldValue::Timestamp(v) => set.push_bind_unseparated(*v),
            };
        }
    }
    qb.push(" WHERE id = ");
    qb.push_bind(id);
    qb
}

pub(crate) fn build_listing_query(filter: AppointmentFilter, page: Page) -> QueryBuilder<'static, Postgres> {
    let mut qb: QueryBuilder<Postgres> = QueryBuilder::new(LISTING_SELECT);

    qb.push(" WHERE 1=1 ");

    if let Some(pid) = filter.patient_id {
        qb.push(" AND a.patient_id = ");
        qb.push_bind(pid);
    }
    if let Some(did) = filter.doctor_id {
        qb.push(" AND a.doctor_id = ");
        qb.push_bind(did);
    }

    qb.push(" ORDER BY a.scheduled_at DESC, a.id DESC ");
    qb.push(" LIMIT ");
    qb.push_bind(page.limit);
    qb.push(" OFFSET ");
    qb.push_bind(page.offset);
    qb
}

#[async_trait]
impl PatientStore for PgStore {
    async fn insert_patient(&self, new: &NewPatient) -> Result<i64, StoreError> {
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO patients (first_name, last_name, email, phone, date_of_birth, gender)
            VALUES ($1,$2,$3,$4,$5,$6)
            RETURNING id
            "#,
        )
        .bind(&new.first_name)
        .bind(&new.last_name)
        .bind(new.email.as_deref())
        .bind(new.phone.as_deref())
        .bind(new.date_of_birth)
        .bind(new.gender.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(backend)
    }

    async fn find_patient(&self, id: i64) -> Result<Option<PatientRow>, StoreError> {
        sqlx::query_as::<_, PatientRow>(&format!(
            "SELECT {PATIENT_COLUMNS} FROM patients WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)
    }

    async fn list_patients(&self, page: Page) -> Result<Vec<PatientRow>, StoreError> {
        sqlx::query_as::<_, PatientRow>(&format!(
            "SELECT {PATIENT_COLUMNS} FROM patients ORDER BY id DESC LIMIT $1 OFFSET $2"
        ))
        .bind(page.limit)
        .bind(page.offset)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)
    }

    async fn update_patient(&self, id: i64, patch: &Patch) -> Result<u64, StoreError> {
        let res = build_update("patients", id, patch)
            .build()
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(res.rows_affected())
    }

    async fn delete_patient(&self, id: i64) -> Result<u64, StoreError> {
        let res = sqlx::query("DELETE FROM patients WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(reference_guarded)?;
        Ok(res.rows_affected())
    }
}

#[async_trait]
impl ConflictCheckingStore for PgStore {
    async fn insert_appointment(&self, new: &NewAppointment) -> Result<i64, StoreError> {
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO appointments (patient_id, doctor_id, scheduled_at, duration_minutes, reason)
            VALUES ($1,$2,$3,$4,$5)
            RETURNING id
            "#,
        )
        .bind(new.patient_id)
        .bind(new.doctor_id)
        .bind(new.scheduled_at)
        .bind(new.duration_minutes)
        .bind(new.reason.as_deref())
        .fetch_one(&self.pool)
        .await
        .map_err(slot_guarded)
    }

    async fn find_appointment(&self, id: i64) -> Result<Option<AppointmentRow>, StoreError> {
        sqlx::query_as::<_, AppointmentRow>(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)
    }

    async fn list_appointments(
        &self,
        filter: AppointmentFilter,
        page: Page,
    ) -> Result<Vec<AppointmentListing>, StoreError> {
        build_listing_query(filter, page)
            .build_query_as::<AppointmentListing>()
            .fetch_all(&self.pool)
            .await
            .map_err(backend)
    }

    async fn update_appointment(&self, id: i64, patch: &Patch) -> Result<u64, StoreError> {
        let res = build_update("appointments", id, patch)
            .build()
            .execute(&self.pool)
            .await
            .map_err(slot_guarded)?;
        Ok(res.rows_affected())
    }

    async fn delete_appointment(&self, id: i64) -> Result<u64, StoreError> {
        let res = sqlx::query("DELETE FROM appointments WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(res.rows_affected())
    }
}

#[async_trait]
impl ClinicStore for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(backend)?;
        Ok(())
    }
}
