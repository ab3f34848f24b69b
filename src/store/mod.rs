// src/store/mod.rs

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{
    AppointmentFilter, AppointmentListing, AppointmentRow, NewAppointment, NewPatient, Page,
    PatientRow,
};
use crate::patch::Patch;

#[cfg(test)]
pub mod memory;
pub mod postgres;

/// Failure classes a backend reports, independent of its error dialect.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("slot already taken")]
    SlotTaken,

    #[error("row is still referenced")]
    StillReferenced,

    #[error("{0}")]
    Backend(String),
}

#[async_trait]
pub trait PatientStore: Send + Sync {
    async fn insert_patient(&self, new: &NewPatient) -> Result<i64, StoreError>;

    async fn find_patient(&self, id: i64) -> Result<Option<PatientRow>, StoreError>;

    // newest first
    async fn list_patients(&self, page: Page) -> Result<Vec<PatientRow>, StoreError>;

    async fn update_patient(&self, id: i64, patch: &Patch) -> Result<u64, StoreError>;

    /// Fails with `StillReferenced` while appointments point at the patient.
    async fn delete_patient(&self, id: i64) -> Result<u64, StoreError>;
}

/// Appointment persistence with atomic enforcement of one appointment per
/// (doctor_id, scheduled_at). Inserts and updates that would break it fail with
/// `StoreError::SlotTaken` and leave the table unchanged.
#[async_trait]
pub trait ConflictCheckingStore: Send + Sync {
    async fn insert_appointment(&self, new: &NewAppointment) -> Result<i64, StoreError>;

    async fn find_appointment(&self, id: i64) -> Result<Option<AppointmentRow>, StoreError>;

    /// Joined with patient and doctor names, ordered by scheduled_at descending.
    async fn list_appointments(
        &self,
        filter: AppointmentFilter,
        page: Page,
    ) -> Result<Vec<AppointmentListing>, StoreError>;

    async fn update_appointment(&self, id: i64, patch: &Patch) -> Result<u64, StoreError>;

    async fn delete_appointment(&self, id: i64) -> Result<u64, StoreError>;
}

#[async_trait]
pub trait ClinicStore: PatientStore + ConflictCheckingStore {
    async fn ping(&self) -> Result<(), StoreError>;
}
