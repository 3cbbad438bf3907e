use serde::{Deserialize, Serialize};

/// Storage model for one time-series measurement sample.
///
/// `cpf` references a patient conceptually; no foreign key is enforced, so
/// orphaned samples are representable (the importer drops them instead).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Measurement {
    /// Row id
    pub id: i64,

    /// Patient identifier (CPF), digits only
    pub cpf: String,

    /// Measurement type tag (e.g. "ind_card", "ind_pulm")
    pub kind: String,

    /// Sample timestamp, seconds since the Unix epoch (UTC)
    pub epoch: i64,

    /// Sample value
    pub value: f64,
}

/// Input data for inserting a measurement sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMeasurement {
    pub cpf: String,
    pub kind: String,
    pub epoch: i64,
    pub value: f64,
}

impl NewMeasurement {
    pub fn new(cpf: impl Into<String>, kind: impl Into<String>, epoch: i64, value: f64) -> Self {
        Self {
            cpf: cpf.into(),
            kind: kind.into(),
            epoch,
            value,
        }
    }
}
