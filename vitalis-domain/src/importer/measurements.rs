use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use vitalis_data::models::NewMeasurement;
use vitalis_data::repository::{MeasurementRepositoryTrait, PatientRepositoryTrait};

use crate::cpf;
use super::{FileOutcome, ImportError};

/// Outcome of one category directory
#[derive(Debug)]
pub struct MeasurementImportReport {
    /// Type tag the category was imported under
    pub kind: String,

    /// Per-file batch results, in directory iteration order
    pub outcomes: Vec<FileOutcome>,

    /// Rows dropped because their cpf matched no patient
    pub dropped_rows: usize,
}

/// Import every regular file of a category directory.
///
/// Each file is parsed and committed as its own batch; a failure voids only
/// that file's samples. Rows whose cpf has no matching patient are dropped
/// silently (counted in the report).
pub async fn import_measurements(
    dir: &Path,
    kind: &str,
    patients: &dyn PatientRepositoryTrait,
    measurements: &dyn MeasurementRepositoryTrait,
) -> Result<MeasurementImportReport, ImportError> {
    info!("Importing {:?} as kind {}", dir, kind);

    let mut files: Vec<_> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .map(|entry| entry.path())
        .collect();
    files.sort();

    let mut outcomes = Vec::new();
    let mut dropped_rows = 0;

    for path in files {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        debug!("Importing file {}", file_name);

        let result = import_file(&path, &file_name, kind, patients, measurements, &mut dropped_rows)
            .await;
        if let Err(e) = &result {
            warn!("Skipping {}: {}", file_name, e);
        }

        outcomes.push(FileOutcome {
            file: file_name,
            result,
        });
    }

    Ok(MeasurementImportReport {
        kind: kind.to_string(),
        outcomes,
        dropped_rows,
    })
}

/// Parse and commit one file. Nothing is committed if any row fails to
/// parse or the batch insert fails.
async fn import_file(
    path: &Path,
    file_name: &str,
    kind: &str,
    patients: &dyn PatientRepositoryTrait,
    measurements: &dyn MeasurementRepositoryTrait,
    dropped_rows: &mut usize,
) -> Result<usize, ImportError> {
    let contents = fs::read_to_string(path)?;
    let rows = parse_table(&contents, file_name, kind)?;

    let mut staged = Vec::new();
    for (raw_cpf, epoch, value) in rows {
        let normalized = cpf::normalize(&raw_cpf);
        if patients
            .exists(&normalized)
            .await
            .map_err(|e| ImportError::Repository(e.to_string()))?
        {
            staged.push(NewMeasurement::new(normalized, kind, epoch, value));
        } else {
            *dropped_rows += 1;
        }
    }

    measurements
        .insert_batch(&staged)
        .await
        .map_err(|e| ImportError::Repository(e.to_string()))
}

/// Parse a whitespace-delimited table. The header row must carry `CPF`,
/// `EPOCH` and a column named exactly like the kind tag; column order is
/// free and extra columns are ignored.
fn parse_table(
    contents: &str,
    file_name: &str,
    kind: &str,
) -> Result<Vec<(String, i64, f64)>, ImportError> {
    let malformed = |reason: String| ImportError::Malformed {
        file: file_name.to_string(),
        reason,
    };

    let mut lines = contents.lines().filter(|l| !l.trim().is_empty());

    let header: Vec<&str> = lines
        .next()
        .ok_or_else(|| malformed("empty file".to_string()))?
        .split_whitespace()
        .collect();

    let col = |name: &str| {
        header
            .iter()
            .position(|h| *h == name)
            .ok_or_else(|| malformed(format!("missing column {}", name)))
    };
    let cpf_idx = col("CPF")?;
    let epoch_idx = col("EPOCH")?;
    let value_idx = col(kind)?;

    let mut rows = Vec::new();
    for (lineno, line) in lines.enumerate() {
        let fields: Vec<&str> = line.split_whitespace().collect();
        let cell = |idx: usize| {
            fields
                .get(idx)
                .copied()
                .ok_or_else(|| malformed(format!("row {}: too few columns", lineno + 2)))
        };

        let cpf = cell(cpf_idx)?.to_string();
        let epoch: i64 = cell(epoch_idx)?
            .parse()
            .map_err(|_| malformed(format!("row {}: bad epoch", lineno + 2)))?;
        let value: f64 = cell(value_idx)?
            .parse()
            .map_err(|_| malformed(format!("row {}: bad value", lineno + 2)))?;

        rows.push((cpf, epoch, value));
    }

    Ok(rows)
}
