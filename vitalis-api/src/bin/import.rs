use std::path::PathBuf;

use dotenv::dotenv;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vitalis_data::database::{DatabaseConfig, DatabasePool};
use vitalis_data::repository::{SqliteMeasurementRepository, SqlitePatientRepository};
use vitalis_domain::importer;

/// One-shot bulk importer.
///
/// Reads `pacientes.json` and the per-category measurement directories from
/// the data directory (first CLI argument, `IMPORT_DATA_DIR`, or `dados`) and
/// loads them into the same SQLite database the API serves from. Safe to
/// re-run: already-present rows are skipped.
#[tokio::main]
async fn main() {
    if dotenv().is_err() {
        eprintln!("Warning: .env file not found or couldn't be read. Using environment variables.");
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(env_filter)
        .init();

    let data_dir = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("IMPORT_DATA_DIR").ok())
        .unwrap_or_else(|| "dados".to_string());
    let data_dir = PathBuf::from(data_dir);

    info!("Importing from {}", data_dir.display());

    let db_config = DatabaseConfig::from_env();
    let pool = match DatabasePool::connect(&db_config) {
        Ok(pool) => pool,
        Err(e) => {
            error!("Failed to open database: {}", e);
            std::process::exit(1);
        }
    };
    if let Err(e) = pool.run_migrations() {
        error!("Failed to run migrations: {}", e);
        std::process::exit(1);
    }

    let patient_repository = SqlitePatientRepository::new(pool.clone());
    let measurement_repository = SqliteMeasurementRepository::new(pool);

    match importer::import_all(&data_dir, &patient_repository, &measurement_repository).await {
        Ok(summary) => {
            info!(
                "Import finished: {} patients inserted ({} skipped), {} samples committed, {} files failed",
                summary.patients.inserted,
                summary.patients.skipped,
                summary.measurements_inserted(),
                summary.failed_files()
            );
            if summary.failed_files() > 0 {
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("Import aborted: {}", e);
            std::process::exit(1);
        }
    }
}
