use std::net::SocketAddr;
use std::sync::Arc;

use dotenv::dotenv;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::info;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use vitalis_api::api::{create_application, AppState};
use vitalis_data::database::{DatabaseConfig, DatabasePool};
use vitalis_data::repository::{SqliteMeasurementRepository, SqlitePatientRepository};
use vitalis_domain::services::{MeasurementService, PatientService};

/// The main entry point for the Vitalis API server
///
/// This function:
/// 1. Initializes environment variables from .env file
/// 2. Sets up tracing for structured logging
/// 3. Opens the SQLite connection pool and runs migrations
/// 4. Wires repositories and services into the shared application state
/// 5. Starts the Axum server with graceful shutdown support
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if dotenv().is_err() {
        eprintln!("Warning: .env file not found or couldn't be read. Using environment variables.");
    }

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_span_events(FmtSpan::CLOSE)
                .with_target(false)
                .with_ansi(true)
                .with_timer(fmt::time::uptime())
                .with_writer(std::io::stdout),
        )
        .with(env_filter)
        .init();

    info!("🚀 Starting Vitalis API server");

    let db_config = DatabaseConfig::from_env();
    let pool = DatabasePool::connect(&db_config)?;
    pool.run_migrations()?;
    info!("Database ready at {}", db_config.sqlite_path);

    let patient_repository = SqlitePatientRepository::new(pool.clone());
    let measurement_repository = SqliteMeasurementRepository::new(pool);

    let state = AppState::new(
        Arc::new(PatientService::new(patient_repository)),
        Arc::new(MeasurementService::new(measurement_repository)),
    );

    // Initialize server start time for uptime reporting in health checks
    vitalis_api::api::handlers::health::initialize_server_start_time();

    let app = create_application(state);

    let port = std::env::var("PORT")
        .unwrap_or_else(|_| "3000".to_string())
        .parse::<u16>()?;

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for CTRL+C or SIGTERM (on Unix) to trigger graceful shutdown
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutting down server...");
}
