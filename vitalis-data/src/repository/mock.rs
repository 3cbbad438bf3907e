//! Mutex-backed mock repositories for tests.
//!
//! These mirror the SQLite implementations closely enough for domain-level
//! tests: cpf comparison strips the same formatting characters the SQL
//! `replace()` calls do, and batch inserts apply the same OR IGNORE
//! semantics.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::models::{Measurement, NewMeasurement, NewPatient, Patient};
use super::errors::RepositoryError;
use super::{MeasurementRepositoryTrait, PatientRepositoryTrait};

// Same canonical form the SQL replace(replace(...)) produces
fn strip_cpf(cpf: &str) -> String {
    cpf.replace(['.', '-'], "")
}

/// In-memory mock of the patient repository
#[derive(Debug, Clone, Default)]
pub struct MockPatientRepository {
    patients: Arc<Mutex<Vec<Patient>>>,
}

impl MockPatientRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_patients(patients: Vec<Patient>) -> Self {
        Self {
            patients: Arc::new(Mutex::new(patients)),
        }
    }

    /// Build a patient row the way `insert_batch` would
    pub fn patient_from(record: &NewPatient, id: i64) -> Patient {
        Patient {
            id,
            name: record.name.clone(),
            age: record.age,
            cpf: record.cpf.clone(),
            rg: record.rg.clone(),
            birth_date: record.birth_date.clone(),
            sex: record.sex.clone(),
            zodiac_sign: record.zodiac_sign.clone(),
            mother_name: record.mother_name.clone(),
            father_name: record.father_name.clone(),
            email: record.email.clone(),
            password: record.password.clone(),
            postal_code: record.postal_code.clone(),
            street: record.street.clone(),
            number: record.number,
            neighborhood: record.neighborhood.clone(),
            city: record.city.clone(),
            state: record.state.clone(),
            landline: record.landline.clone(),
            mobile: record.mobile.clone(),
            height: record.height.clone(),
            weight: record.weight,
            blood_type: record.blood_type.clone(),
            color: record.color.clone(),
        }
    }
}

#[async_trait]
impl PatientRepositoryTrait for MockPatientRepository {
    async fn find_by_name(&self, fragment: Option<&str>) -> Result<Vec<Patient>, RepositoryError> {
        let store = self
            .patients
            .lock()
            .map_err(|e| RepositoryError::Lock(e.to_string()))?;

        let result = match fragment.filter(|f| !f.is_empty()) {
            Some(fragment) => {
                // ASCII-only fold, same as SQLite's LIKE
                let needle = fragment.to_ascii_lowercase();
                store
                    .iter()
                    .filter(|p| p.name.to_ascii_lowercase().contains(&needle))
                    .cloned()
                    .collect()
            }
            None => store.clone(),
        };

        Ok(result)
    }

    async fn find_by_cpf(&self, cpf: &str) -> Result<Option<Patient>, RepositoryError> {
        let store = self
            .patients
            .lock()
            .map_err(|e| RepositoryError::Lock(e.to_string()))?;

        Ok(store.iter().find(|p| strip_cpf(&p.cpf) == cpf).cloned())
    }

    async fn exists(&self, cpf: &str) -> Result<bool, RepositoryError> {
        Ok(self.find_by_cpf(cpf).await?.is_some())
    }

    async fn insert_batch(&self, patients: &[NewPatient]) -> Result<usize, RepositoryError> {
        let mut store = self
            .patients
            .lock()
            .map_err(|e| RepositoryError::Lock(e.to_string()))?;

        let mut inserted = 0;
        for record in patients {
            let cpf = strip_cpf(&record.cpf);
            if store.iter().any(|p| strip_cpf(&p.cpf) == cpf) {
                continue;
            }
            let id = store.len() as i64 + 1;
            store.push(Self::patient_from(record, id));
            inserted += 1;
        }

        Ok(inserted)
    }
}

/// In-memory mock of the measurement repository
#[derive(Debug, Clone, Default)]
pub struct MockMeasurementRepository {
    rows: Arc<Mutex<Vec<Measurement>>>,
}

impl MockMeasurementRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rows(rows: Vec<Measurement>) -> Self {
        Self {
            rows: Arc::new(Mutex::new(rows)),
        }
    }

    fn locked(&self) -> Result<std::sync::MutexGuard<'_, Vec<Measurement>>, RepositoryError> {
        self.rows.lock().map_err(|e| RepositoryError::Lock(e.to_string()))
    }
}

#[async_trait]
impl MeasurementRepositoryTrait for MockMeasurementRepository {
    async fn latest_by_kind(
        &self,
        cpf: &str,
        kind: &str,
    ) -> Result<Option<Measurement>, RepositoryError> {
        let store = self.locked()?;
        Ok(store
            .iter()
            .filter(|m| m.cpf == cpf && m.kind == kind)
            .max_by_key(|m| m.epoch)
            .cloned())
    }

    async fn range_by_epoch(
        &self,
        cpf: &str,
        kind: &str,
        from: i64,
        to: i64,
    ) -> Result<Vec<Measurement>, RepositoryError> {
        let store = self.locked()?;
        let mut result: Vec<Measurement> = store
            .iter()
            .filter(|m| m.cpf == cpf && m.kind == kind && m.epoch >= from && m.epoch <= to)
            .cloned()
            .collect();
        result.sort_by_key(|m| m.epoch);
        Ok(result)
    }

    async fn range_by_epoch_global(
        &self,
        from: i64,
        to: i64,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Measurement>, RepositoryError> {
        let store = self.locked()?;
        Ok(store
            .iter()
            .filter(|m| m.epoch >= from && m.epoch <= to)
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn latest_in_value_range(
        &self,
        cpf: &str,
        kind: &str,
        min: f64,
        max: f64,
    ) -> Result<Option<Measurement>, RepositoryError> {
        let store = self.locked()?;
        Ok(store
            .iter()
            .filter(|m| m.cpf == cpf && m.kind == kind && m.value >= min && m.value <= max)
            .max_by_key(|m| m.epoch)
            .cloned())
    }

    async fn by_cpfs(&self, cpfs: &[String]) -> Result<Vec<Measurement>, RepositoryError> {
        let store = self.locked()?;
        Ok(store
            .iter()
            .filter(|m| cpfs.iter().any(|c| strip_cpf(&m.cpf) == *c))
            .cloned()
            .collect())
    }

    async fn all(&self) -> Result<Vec<Measurement>, RepositoryError> {
        Ok(self.locked()?.clone())
    }

    async fn insert_batch(&self, rows: &[NewMeasurement]) -> Result<usize, RepositoryError> {
        let mut store = self.locked()?;

        let mut inserted = 0;
        for row in rows {
            if store
                .iter()
                .any(|m| m.cpf == row.cpf && m.kind == row.kind && m.epoch == row.epoch)
            {
                continue;
            }
            let id = store.len() as i64 + 1;
            store.push(Measurement {
                id,
                cpf: row.cpf.clone(),
                kind: row.kind.clone(),
                epoch: row.epoch,
                value: row.value,
            });
            inserted += 1;
        }

        Ok(inserted)
    }
}
