// src/services/scheduler.rs

use tracing::{info, warn};

use crate::error::ClinicError;
use crate::models::{
    AppointmentFilter, AppointmentListing, AppointmentRow, CreateAppointmentRequest, Page,
    UpdateAppointmentRequest,
};
use crate::store::{ConflictCheckingStore, StoreError};

/// Appointment booking, partial updates and enriched listings.
///
/// Slot uniqueness is enforced by the store, which reports `StoreError::SlotTaken`.
pub struct AppointmentScheduler<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S> AppointmentScheduler<'a, S>
where
    S: ConflictCheckingStore + ?Sized,
{
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub async fn book(&self, req: CreateAppointmentRequest) -> Result<AppointmentRow, ClinicError> {
        let new = req.into_new_appointment()?;

        let id = match self.store.insert_appointment(&new).await {
            Ok(id) => id,
            Err(StoreError::SlotTaken) => {
                warn!(
                    doctor_id = new.doctor_id,
                    scheduled_at = %new.scheduled_at,
                    "booking rejected: slot already taken"
                );
                return Err(StoreError::SlotTaken.into());
            }
            Err(e) => return Err(e.into()),
        };

        info!(appointment_id = id, doctor_id = new.doctor_id, "appointment booked");
        self.get(id).await
    }

    pub async fn update(
        &self,
        id: i64,
        req: UpdateAppointmentRequest,
    ) -> Result<AppointmentRow, ClinicError> {
        let patch = req.into_patch()?;
        if patch.is_empty() {
            return Err(ClinicError::nothing_to_update());
        }

        let matched = self.store.update_appointment(id, &patch).await.map_err(|e| {
            if e == StoreError::SlotTaken {
                warn!(appointment_id = id, "update rejected: slot already taken");
            }
            ClinicError::from(e)
        })?;
        if matched == 0 {
            return Err(ClinicError::NotFound("appointment"));
        }

        self.get(id).await
    }

    pub async fn get(&self, id: i64) -> Result<AppointmentRow, ClinicError> {
        self.store
            .find_appointment(id)
            .await?
            .ok_or(ClinicError::NotFound("appointment"))
    }

    pub async fn list(
        &self,
        filter: AppointmentFilter,
        page: Page,
    ) -> Result<Vec<AppointmentListing>, ClinicError> {
        Ok(self.store.list_appointments(filter, page).await?)
    }

    pub async fn delete(&self, id: i64) -> Result<(), ClinicError> {
        if self.store.delete_appointment(id).await? == 0 {
            return Err(ClinicError::NotFound("appointment"));
        }
        info!(appointment_id = id, "appointment deleted");
        Ok(())
    }
}
