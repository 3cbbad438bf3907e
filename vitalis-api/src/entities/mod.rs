// Public entities for the Vitalis API
// Data structures served across the application boundary

mod patient;

pub use patient::PatientResponse;
