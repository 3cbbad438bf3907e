// Service layer: query logic over the repository traits

mod measurements;
mod patients;

pub use measurements::{MeasurementService, MeasurementServiceTrait, KNOWN_KINDS};
pub use patients::{PatientService, PatientServiceTrait};

use thiserror::Error;
use vitalis_data::repository::RepositoryError;

/// Service layer errors, mapped to HTTP statuses by the API layer
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed request parameter
    #[error("Validation error: {0}")]
    Validation(String),

    /// Empty result where absence is meaningful
    #[error("{0}")]
    NotFound(String),

    /// Underlying store failure
    #[error("Repository error: {0}")]
    Repository(String),
}

impl From<RepositoryError> for ServiceError {
    fn from(err: RepositoryError) -> Self {
        ServiceError::Repository(err.to_string())
    }
}
