// src/store/memory.rs

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;

use super::{ClinicStore, ConflictCheckingStore, PatientStore, StoreError};
use crate::models::{
    AppointmentFilter, AppointmentListing, AppointmentRow, NewAppointment, NewPatient, Page,
    PatientRow,
};
use crate::patch::{FieldValue, Patch};

// Same slot and foreign-key rules as the schema; one lock stands in for the unique index.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    offline: AtomicBool,
    writes: AtomicU64,
}

#[derive(Default)]
struct Tables {
    last_patient_id: i64,
    last_appointment_id: i64,
    patients: BTreeMap<i64, PatientRow>,
    doctors: BTreeMap<i64, (String, String)>,
    appointments: BTreeMap<i64, AppointmentRow>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_doctor(&self, id: i64, first_name: &str, last_name: &str) {
        self.lock()
            .doctors
            .insert(id, (first_name.to_string(), last_name.to_string()));
    }

    /// Makes every subsequent call fail as if the connection were gone.
    pub fn go_offline(&self) {
        self.offline.store(true, Ordering::SeqCst);
    }

    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().expect("memory store lock poisoned")
    }

    fn check_online(&self) -> Result<(), StoreError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Backend("db error: connection refused".into()));
        }
        Ok(())
    }

    fn count_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }
}

impl Tables {
    fn check_references(&self, patient_id: i64, doctor_id: i64) -> Result<(), StoreError> {
        if !self.patients.contains_key(&patient_id) {
            return Err(StoreError::Backend(format!(
                "db error: patient {patient_id} does not exist"
            )));
        }
        if !self.doctors.contains_key(&doctor_id) {
            return Err(StoreError::Backend(format!(
                "db error: doctor {doctor_id} does not exist"
            )));
        }
        Ok(())
    }

    fn slot_taken(&self, row: &AppointmentRow) -> bool {
        self.appointments.values().any(|a| {
            a.id != row.id && a.doctor_id == row.doctor_id && a.scheduled_at == row.scheduled_at
        })
    }
}

fn text(value: &FieldValue) -> Option<String> {
    match value {
        FieldValue::Text(v) => v.clone(),
        _ => None,
    }
}

fn apply_patient_patch(row: &mut PatientRow, patch: &Patch) {
    for (column, value) in patch.iter() {
        match (column, value) {
            ("first_name", v) => row.first_name = text(v).unwrap_or_default(),
            ("last_name", v) => row.last_name = text(v).unwrap_or_default(),
            ("email", v) => row.email = text(v),
            ("phone", v) => row.phone = text(v),
            ("gender", v) => row.gender = text(v),
            ("date_of_birth", FieldValue::Date(d)) => row.date_of_birth = *d,
            _ => {}
        }
    }
}

fn apply_appointment_patch(row: &mut AppointmentRow, patch: &Patch) {
    for (column, value) in patch.iter() {
        match (column, value) {
            ("patient_id", FieldValue::BigInt(v)) => row.patient_id = *v,
            ("doctor_id", FieldValue::BigInt(v)) => row.doctor_id = *v,
            ("scheduled_at", FieldValue::Timestamp(v)) => row.scheduled_at = *v,
            ("duration_minutes", FieldValue::Int(v)) => row.duration_minutes = *v,
            ("status", v) => row.status = text(v).unwrap_or_default(),
            ("reason", v) => row.reason = text(v),
            _ => {}
        }
    }
}

fn page_of<T>(rows: impl Iterator<Item = T>, page: Page) -> Vec<T> {
    rows.skip(page.offset as usize).take(page.limit as usize).collect()
}

#[async_trait]
impl PatientStore for MemoryStore {
    async fn insert_patient(&self, new: &NewPatient) -> Result<i64, StoreError> {
        self.check_online()?;
        self.count_write();
        let mut t = self.lock();
        t.last_patient_id += 1;
        let id = t.last_patient_id;
        t.patients.insert(
            id,
            PatientRow {
                id,
                first_name: new.first_name.clone(),
                last_name: new.last_name.clone(),
                email: new.email.clone(),
                phone: new.phone.clone(),
                date_of_birth: new.date_of_birth,
                gender: new.gender.clone(),
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn find_patient(&self, id: i64) -> Result<Option<PatientRow>, StoreError> {
        self.check_online()?;
        Ok(self.lock().patients.get(&id).cloned())
    }

    async fn list_patients(&self, page: Page) -> Result<Vec<PatientRow>, StoreError> {
        self.check_online()?;
        let t = self.lock();
        Ok(page_of(t.patients.values().rev().cloned(), page))
    }

    async fn update_patient(&self, id: i64, patch: &Patch) -> Result<u64, StoreError> {
        self.check_online()?;
        self.count_write();
        let mut t = self.lock();
        let Some(row) = t.patients.get_mut(&id) else {
            return Ok(0);
        };
        apply_patient_patch(row, patch);
        Ok(1)
    }

    async fn delete_patient(&self, id: i64) -> Result<u64, StoreError> {
        self.check_online()?;
        self.count_write();
        let mut t = self.lock();
        if t.appointments.values().any(|a| a.patient_id == id) {
            return Err(StoreError::StillReferenced);
        }
        Ok(t.patients.remove(&id).map_or(0, |_| 1))
    }
}

#[async_trait]
impl ConflictCheckingStore for MemoryStore {
    async fn insert_appointment(&self, new: &NewAppointment) -> Result<i64, StoreError> {
        self.check_online()?;
        self.count_write();
        let mut t = self.lock();
        t.check_references(new.patient_id, new.doctor_id)?;
        let row = AppointmentRow {
            id: t.last_appointment_id + 1,
            patient_id: new.patient_id,
            doctor_id: new.doctor_id,
            scheduled_at: new.scheduled_at,
            duration_minutes: new.duration_minutes,
            status: "scheduled".to_string(),
            reason: new.reason.clone(),
            created_at: Utc::now(),
        };
        if t.slot_taken(&row) {
            return Err(StoreError::SlotTaken);
        }
        t.last_appointment_id = row.id;
        let id = row.id;
        t.appointments.insert(id, row);
        Ok(id)
    }

    async fn find_appointment(&self, id: i64) -> Result<Option<AppointmentRow>, StoreError> {
        self.check_online()?;
        Ok(self.lock().appointments.get(&id).cloned())
    }

    async fn list_appointments(
        &self,
        filter: AppointmentFilter,
        page: Page,
    ) -> Result<Vec<AppointmentListing>, StoreError> {
        self.check_online()?;
        let t = self.lock();
        let mut rows: Vec<AppointmentListing> = t
            .appointments
            .values()
            .filter(|a| filter.patient_id.is_none_or(|p| a.patient_id == p))
            .filter(|a| filter.doctor_id.is_none_or(|d| a.doctor_id == d))
            .filter_map(|a| {
                let patient = t.patients.get(&a.patient_id)?;
                let (doctor_first, doctor_last) = t.doctors.get(&a.doctor_id)?;
                Some(AppointmentListing {
                    appointment: a.clone(),
                    patient_first: patient.first_name.clone(),
                    patient_last: patient.last_name.clone(),
                    doctor_first: doctor_first.clone(),
                    doctor_last: doctor_last.clone(),
                })
            })
            .collect();
        rows.sort_by(|x, y| {
            (y.appointment.scheduled_at, y.appointment.id)
                .cmp(&(x.appointment.scheduled_at, x.appointment.id))
        });
        Ok(page_of(rows.into_iter(), page))
    }

    async fn update_appointment(&self, id: i64, patch: &Patch) -> Result<u64, StoreError> {
        self.check_online()?;
        self.count_write();
        let mut t = self.lock();
        let Some(current) = t.appointments.get(&id) else {
            return Ok(0);
        };
        let mut next = current.clone();
        apply_appointment_patch(&mut next, patch);
        t.check_references(next.patient_id, next.doctor_id)?;
        if t.slot_taken(&next) {
            return Err(StoreError::SlotTaken);
        }
        t.appointments.insert(id, next);
        Ok(1)
    }

    async fn delete_appointment(&self, id: i64) -> Result<u64, StoreError> {
        self.check_online()?;
        self.count_write();
        Ok(self.lock().appointments.remove(&id).map_or(0, |_| 1))
    }
}

#[async_trait]
impl ClinicStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.check_online()
    }
}
