// src/services/registry.rs

use tracing::info;

use crate::error::ClinicError;
use crate::models::{CreatePatientRequest, Page, PatientRow, UpdatePatientRequest};
use crate::store::PatientStore;

/// Patient CRUD over any `PatientStore`.
pub struct PatientRegistry<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S> PatientRegistry<'a, S>
where
    S: PatientStore + ?Sized,
{
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub async fn register(&self, req: CreatePatientRequest) -> Result<PatientRow, ClinicError> {
        let new = req.into_new_patient()?;
        let id = self.store.insert_patient(&new).await?;
        info!(patient_id = id, "patient registered");
        self.get(id).await
    }

    pub async fn get(&self, id: i64) -> Result<PatientRow, ClinicError> {
        self.store
            .find_patient(id)
            .await?
            .ok_or(ClinicError::NotFound("patient"))
    }

    pub async fn list(&self, page: Page) -> Result<Vec<PatientRow>, ClinicError> {
        Ok(self.store.list_patients(page).await?)
    }

    pub async fn update(&self, id: i64, req: UpdatePatientRequest) -> Result<PatientRow, ClinicError> {
        let patch = req.into_patch()?;
        if patch.is_empty() {
            return Err(ClinicError::nothing_to_update());
        }
        if self.store.update_patient(id, &patch).await? == 0 {
            return Err(ClinicError::NotFound("patient"));
        }
        self.get(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), ClinicError> {
        if self.store.delete_patient(id).await? == 0 {
            return Err(ClinicError::NotFound("patient"));
        }
        info!(patient_id = id, "patient deleted");
        Ok(())
    }
}
