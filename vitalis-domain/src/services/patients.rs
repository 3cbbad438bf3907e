use async_trait::async_trait;
use tracing::debug;

use vitalis_data::models::Patient;
use vitalis_data::repository::PatientRepositoryTrait;

use crate::cpf;
use super::ServiceError;

/// Trait for patient query operations
#[async_trait]
pub trait PatientServiceTrait: Send + Sync {
    /// List patients, optionally filtered by a name substring
    async fn list(&self, name: Option<&str>) -> Result<Vec<Patient>, ServiceError>;

    /// Fetch a patient by cpf (any formatting accepted)
    async fn get_by_cpf(&self, cpf: &str) -> Result<Patient, ServiceError>;
}

/// Patient query service
pub struct PatientService<R> {
    repository: R,
}

impl<R: PatientRepositoryTrait> PatientService<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }
}

#[async_trait]
impl<R: PatientRepositoryTrait> PatientServiceTrait for PatientService<R> {
    async fn list(&self, name: Option<&str>) -> Result<Vec<Patient>, ServiceError> {
        debug!("Listing patients, filter: {:?}", name);
        Ok(self.repository.find_by_name(name).await?)
    }

    async fn get_by_cpf(&self, raw_cpf: &str) -> Result<Patient, ServiceError> {
        let cpf = cpf::normalize(raw_cpf);

        self.repository
            .find_by_cpf(&cpf)
            .await?
            .ok_or_else(|| ServiceError::NotFound("Patient not found".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitalis_data::models::NewPatient;
    use vitalis_data::repository::mock::MockPatientRepository;

    async fn seeded_service() -> PatientService<MockPatientRepository> {
        let repo = MockPatientRepository::new();
        let service = PatientService::new(repo.clone());
        let batch = vec![
            NewPatient::new("Alexandre Caleb Costa", "97464252420"),
            NewPatient::new("Rebeca Silva", "52931007420"),
        ];
        repo.insert_batch(&batch).await.unwrap();
        service
    }

    #[tokio::test]
    async fn lookup_accepts_formatted_and_bare_cpf() {
        let service = seeded_service().await;

        let by_formatted = service.get_by_cpf("529.310.074-20").await.unwrap();
        let by_bare = service.get_by_cpf("52931007420").await.unwrap();
        assert_eq!(by_formatted.name, by_bare.name);
        assert_eq!(by_formatted.name, "Rebeca Silva");
    }

    #[tokio::test]
    async fn missing_patient_is_not_found() {
        let service = seeded_service().await;

        let err = service.get_by_cpf("000.000.000-00").await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn list_filters_by_substring() {
        let service = seeded_service().await;

        let all = service.list(None).await.unwrap();
        assert_eq!(all.len(), 2);

        let hits = service.list(Some("Rebeca")).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].cpf, "52931007420");
    }
}
