use async_trait::async_trait;
use rusqlite::{params, Row};
use tracing::debug;

use crate::database::DatabasePool;
use crate::models::{NewPatient, Patient};
use super::errors::RepositoryError;

const PATIENT_COLUMNS: &str = "id, name, age, cpf, rg, birth_date, sex, zodiac_sign, \
     mother_name, father_name, email, password, postal_code, street, number, \
     neighborhood, city, state, landline, mobile, height, weight, blood_type, color";

/// Normalizes the stored cpf column inside SQL so that lookups match even if
/// historical imports left formatting in place.
const CPF_NORMALIZED: &str = "replace(replace(cpf, '.', ''), '-', '')";

/// Repository trait for patient records
#[async_trait]
pub trait PatientRepositoryTrait: Send + Sync {
    /// All patients, optionally filtered by a case-insensitive name
    /// substring. Case folding comes from SQLite's `LIKE`, which only folds
    /// ASCII: accented letters match exact-case only ("Álvaro" is not found
    /// by "álvaro").
    async fn find_by_name(&self, fragment: Option<&str>) -> Result<Vec<Patient>, RepositoryError>;

    /// Look a patient up by cpf. The argument must already be normalized; the
    /// stored side is normalized at query time.
    async fn find_by_cpf(&self, cpf: &str) -> Result<Option<Patient>, RepositoryError>;

    /// Whether a patient with this (normalized) cpf exists
    async fn exists(&self, cpf: &str) -> Result<bool, RepositoryError>;

    /// Insert a batch of patients in one transaction, skipping any whose cpf
    /// is already present. Existing records are never overwritten. Returns
    /// the number actually inserted.
    async fn insert_batch(&self, patients: &[NewPatient]) -> Result<usize, RepositoryError>;
}

/// SQLite-backed patient repository
#[derive(Debug, Clone)]
pub struct SqlitePatientRepository {
    pool: DatabasePool,
}

impl SqlitePatientRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn map_patient_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        id: row.get(0)?,
        name: row.get(1)?,
        age: row.get(2)?,
        cpf: row.get(3)?,
        rg: row.get(4)?,
        birth_date: row.get(5)?,
        sex: row.get(6)?,
        zodiac_sign: row.get(7)?,
        mother_name: row.get(8)?,
        father_name: row.get(9)?,
        email: row.get(10)?,
        password: row.get(11)?,
        postal_code: row.get(12)?,
        street: row.get(13)?,
        number: row.get(14)?,
        neighborhood: row.get(15)?,
        city: row.get(16)?,
        state: row.get(17)?,
        landline: row.get(18)?,
        mobile: row.get(19)?,
        height: row.get(20)?,
        weight: row.get(21)?,
        blood_type: row.get(22)?,
        color: row.get(23)?,
    })
}

#[async_trait]
impl PatientRepositoryTrait for SqlitePatientRepository {
    async fn find_by_name(&self, fragment: Option<&str>) -> Result<Vec<Patient>, RepositoryError> {
        debug!("Listing patients, name filter: {:?}", fragment);

        let conn = self.pool.get()?;

        let mut result = Vec::new();
        match fragment.filter(|f| !f.is_empty()) {
            Some(fragment) => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {PATIENT_COLUMNS} FROM patients WHERE name LIKE ?1 ORDER BY id"
                ))?;
                let pattern = format!("%{}%", fragment);
                let rows = stmt.query_map([pattern], map_patient_row)?;
                for row in rows {
                    result.push(row?);
                }
            }
            None => {
                let mut stmt = conn.prepare(&format!(
                    "SELECT {PATIENT_COLUMNS} FROM patients ORDER BY id"
                ))?;
                let rows = stmt.query_map([], map_patient_row)?;
                for row in rows {
                    result.push(row?);
                }
            }
        }

        Ok(result)
    }

    async fn find_by_cpf(&self, cpf: &str) -> Result<Option<Patient>, RepositoryError> {
        debug!("Looking up patient by cpf");

        let conn = self.pool.get()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {PATIENT_COLUMNS} FROM patients WHERE {CPF_NORMALIZED} = ?1"
        ))?;

        match stmt.query_row([cpf], map_patient_row) {
            Ok(patient) => Ok(Some(patient)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(RepositoryError::Sqlite(e)),
        }
    }

    async fn exists(&self, cpf: &str) -> Result<bool, RepositoryError> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT 1 FROM patients WHERE {CPF_NORMALIZED} = ?1 LIMIT 1"
        ))?;

        match stmt.query_row([cpf], |_| Ok(())) {
            Ok(()) => Ok(true),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(false),
            Err(e) => Err(RepositoryError::Sqlite(e)),
        }
    }

    async fn insert_batch(&self, patients: &[NewPatient]) -> Result<usize, RepositoryError> {
        debug!("Inserting patient batch of {}", patients.len());

        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        let mut inserted = 0;
        {
            // OR IGNORE rides on the unique cpf constraint; pre-existing
            // records are left untouched.
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO patients (
                    name, age, cpf, rg, birth_date, sex, zodiac_sign,
                    mother_name, father_name, email, password, postal_code,
                    street, number, neighborhood, city, state, landline,
                    mobile, height, weight, blood_type, color
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12,
                          ?13, ?14, ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23)",
            )?;

            for p in patients {
                inserted += stmt.execute(params![
                    p.name,
                    p.age,
                    p.cpf,
                    p.rg,
                    p.birth_date,
                    p.sex,
                    p.zodiac_sign,
                    p.mother_name,
                    p.father_name,
                    p.email,
                    p.password,
                    p.postal_code,
                    p.street,
                    p.number,
                    p.neighborhood,
                    p.city,
                    p.state,
                    p.landline,
                    p.mobile,
                    p.height,
                    p.weight,
                    p.blood_type,
                    p.color,
                ])?;
            }
        }

        tx.commit()?;
        Ok(inserted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DatabasePool;

    fn test_repo() -> SqlitePatientRepository {
        let pool = DatabasePool::connect_in_memory().expect("in-memory pool");
        pool.run_migrations().expect("migrations");
        SqlitePatientRepository::new(pool)
    }

    fn sample(name: &str, cpf: &str) -> NewPatient {
        NewPatient {
            age: Some(55),
            email: Some(format!("{}@example.com", cpf)),
            ..NewPatient::new(name, cpf)
        }
    }

    #[tokio::test]
    async fn insert_batch_is_idempotent() {
        let repo = test_repo();
        let batch = vec![
            sample("Alexandre Caleb Costa", "97464252420"),
            sample("Rebeca Silva", "52931007420"),
        ];

        assert_eq!(repo.insert_batch(&batch).await.unwrap(), 2);
        // Second run inserts nothing and overwrites nothing
        assert_eq!(repo.insert_batch(&batch).await.unwrap(), 0);

        let all = repo.find_by_name(None).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn find_by_cpf_normalizes_stored_side() {
        let repo = test_repo();

        // A historical import may have left formatting in the cpf column
        repo.insert_batch(&[sample("Formatted", "529.310.074-20")])
            .await
            .unwrap();

        let found = repo.find_by_cpf("52931007420").await.unwrap();
        assert!(found.is_some());
        assert_eq!(found.unwrap().name, "Formatted");

        assert!(repo.find_by_cpf("00000000000").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn find_by_name_filters_case_insensitively() {
        let repo = test_repo();
        repo.insert_batch(&[
            sample("Rebeca Silva", "11111111111"),
            sample("Nelson Heitor Costa", "22222222222"),
        ])
        .await
        .unwrap();

        let hits = repo.find_by_name(Some("rebeca")).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].cpf, "11111111111");

        // No filter returns everyone
        assert_eq!(repo.find_by_name(None).await.unwrap().len(), 2);
        // Empty filter behaves like no filter
        assert_eq!(repo.find_by_name(Some("")).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn find_by_name_folds_ascii_case_only() {
        let repo = test_repo();
        repo.insert_batch(&[sample("Álvaro Nunes", "33333333333")])
            .await
            .unwrap();

        // SQLite's LIKE does not fold accented letters
        assert_eq!(repo.find_by_name(Some("álvaro")).await.unwrap().len(), 0);
        // Exact accent with different ASCII case still matches
        assert_eq!(repo.find_by_name(Some("Álvaro nUNES")).await.unwrap().len(), 1);
        assert_eq!(repo.find_by_name(Some("lvaro")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn exists_reflects_inserts() {
        let repo = test_repo();
        assert!(!repo.exists("97464252420").await.unwrap());

        repo.insert_batch(&[sample("Someone", "97464252420")])
            .await
            .unwrap();
        assert!(repo.exists("97464252420").await.unwrap());
    }
}
