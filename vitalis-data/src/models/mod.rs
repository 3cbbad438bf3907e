// Data storage models

pub mod measurement;
pub mod patient;

pub use measurement::{Measurement, NewMeasurement};
pub use patient::{NewPatient, Patient};
