//! One-shot bulk importer.
//!
//! Two passes, run in sequence: patients from a JSON collection, then each
//! measurement category from its own directory of whitespace-delimited
//! files. Patients go first so the measurement pass can drop rows whose cpf
//! has no matching patient. Measurement commits are per file; a failed file
//! is reported as a [`FileOutcome`] and the remaining files still run.

mod measurements;
mod patients;

pub use measurements::{import_measurements, MeasurementImportReport};
pub use patients::{import_patients, PatientImportStats, PatientRecord};

use std::path::Path;

use thiserror::Error;
use tracing::{error, info};

use vitalis_data::repository::{MeasurementRepositoryTrait, PatientRepositoryTrait};

/// Measurement categories: source subdirectory and the type tag its value
/// column carries.
pub const CATEGORIES: &[(&str, &str)] = &[
    ("indice_cardiaco", "ind_card"),
    ("indice_pulmonar", "ind_pulm"),
];

/// Import errors
#[derive(Debug, Error)]
pub enum ImportError {
    /// I/O failure reading a source file or directory
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Patient collection could not be parsed
    #[error("Malformed patient file: {0}")]
    Json(#[from] serde_json::Error),

    /// A measurement file is missing a column or holds an unparseable cell
    #[error("Malformed measurement file {file}: {reason}")]
    Malformed { file: String, reason: String },

    /// Store failure while committing a batch
    #[error("Repository error: {0}")]
    Repository(String),
}

/// Result of one measurement file's batch: either the number of samples
/// committed or the reason the whole file was rolled back.
#[derive(Debug)]
pub struct FileOutcome {
    /// File name within the category directory
    pub file: String,

    /// Committed sample count, or the failure that voided the batch
    pub result: Result<usize, ImportError>,
}

/// Aggregate outcome of a full import run
#[derive(Debug)]
pub struct ImportSummary {
    pub patients: PatientImportStats,
    pub categories: Vec<MeasurementImportReport>,
}

impl ImportSummary {
    /// Total measurement samples committed across all categories
    pub fn measurements_inserted(&self) -> usize {
        self.categories
            .iter()
            .flat_map(|c| &c.outcomes)
            .filter_map(|o| o.result.as_ref().ok())
            .sum()
    }

    /// Number of files whose batch failed
    pub fn failed_files(&self) -> usize {
        self.categories
            .iter()
            .flat_map(|c| &c.outcomes)
            .filter(|o| o.result.is_err())
            .count()
    }
}

/// Run the full import: patients first, then every measurement category.
///
/// A patient-pass failure aborts the run (nothing in that batch is
/// committed). Measurement failures are isolated per file and recorded in
/// the summary.
pub async fn import_all(
    data_dir: &Path,
    patients: &dyn PatientRepositoryTrait,
    measurements: &dyn MeasurementRepositoryTrait,
) -> Result<ImportSummary, ImportError> {
    let stats = import_patients(&data_dir.join("pacientes.json"), patients).await?;
    info!(
        "Patients imported: {} inserted, {} already present",
        stats.inserted, stats.skipped
    );

    let mut categories = Vec::new();
    for (subdir, kind) in CATEGORIES {
        let report =
            import_measurements(&data_dir.join(subdir), kind, patients, measurements).await?;

        for outcome in &report.outcomes {
            match &outcome.result {
                Ok(count) => info!("{}: {} samples committed", outcome.file, count),
                Err(e) => error!("{}: batch rolled back: {}", outcome.file, e),
            }
        }
        info!(
            "Category {} done: {} orphan rows dropped",
            kind, report.dropped_rows
        );

        categories.push(report);
    }

    Ok(ImportSummary {
        patients: stats,
        categories,
    })
}
