// Repository module structure
pub mod errors;
mod measurements;
mod patients;

// Re-export commonly used types
pub use errors::RepositoryError;
pub use measurements::{MeasurementRepositoryTrait, SqliteMeasurementRepository};
pub use patients::{PatientRepositoryTrait, SqlitePatientRepository};

// Mock repositories for tests and for consumers built with the mock feature
#[cfg(any(test, feature = "mock"))]
pub mod mock;
