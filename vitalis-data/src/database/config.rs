use std::env;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::OpenFlags;
use thiserror::Error;
use tracing::info;

use super::migrations;

/// Database error
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error
    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// Filesystem error while preparing the database location
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Migration error
    #[error("Database migration error: {0}")]
    Migration(String),
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub sqlite_path: String,
    /// Maximum number of pooled connections
    pub max_connections: u32,
    /// Connection timeout in seconds
    pub timeout_seconds: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            sqlite_path: "data/vitalis.db".to_string(),
            max_connections: 10,
            timeout_seconds: 30,
        }
    }
}

impl DatabaseConfig {
    /// Create a configuration from environment variables, falling back to the
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let sqlite_path = env::var("DB_SQLITE_PATH").unwrap_or(defaults.sqlite_path);

        let max_connections = env::var("DB_MAX_CONNECTIONS")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
            .unwrap_or(defaults.max_connections);

        let timeout_seconds = env::var("DB_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(defaults.timeout_seconds);

        info!(
            "Database configuration: path={}, max_connections={}, timeout={}s",
            sqlite_path, max_connections, timeout_seconds
        );

        Self {
            sqlite_path,
            max_connections,
            timeout_seconds,
        }
    }
}

/// Handle to the SQLite connection pool.
///
/// Cheap to clone; every clone shares the same underlying pool. Repositories
/// check a connection out per call and return it on drop, so each request
/// holds a connection only for its own duration.
#[derive(Debug, Clone)]
pub struct DatabasePool {
    pool: Arc<r2d2::Pool<SqliteConnectionManager>>,
}

impl DatabasePool {
    /// Open the database file named by the configuration, creating the parent
    /// directory if needed.
    pub fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        if let Some(parent) = Path::new(&config.sqlite_path).parent() {
            if !parent.exists() {
                info!("Creating database directory: {:?}", parent);
                fs::create_dir_all(parent)?;
            }
        }

        info!("Opening SQLite database at {}", config.sqlite_path);

        let manager = SqliteConnectionManager::file(&config.sqlite_path)
            .with_flags(OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE);

        let pool = r2d2::Pool::builder()
            .max_size(config.max_connections)
            .connection_timeout(Duration::from_secs(config.timeout_seconds))
            .build(manager)?;

        // Fail fast if the file cannot actually be opened
        pool.get()?;

        Ok(Self { pool: Arc::new(pool) })
    }

    /// Open an in-memory database. A single shared connection is used so that
    /// every checkout sees the same data; intended for tests.
    pub fn connect_in_memory() -> Result<Self, DatabaseError> {
        let manager = SqliteConnectionManager::memory();

        let pool = r2d2::Pool::builder().max_size(1).build(manager)?;

        Ok(Self { pool: Arc::new(pool) })
    }

    /// Check a connection out of the pool.
    pub fn get(
        &self,
    ) -> Result<r2d2::PooledConnection<SqliteConnectionManager>, DatabaseError> {
        Ok(self.pool.get()?)
    }

    /// Create tables and indexes. Idempotent.
    pub fn run_migrations(&self) -> Result<(), DatabaseError> {
        let conn = self.get()?;
        migrations::run_migrations(&conn).map_err(DatabaseError::Migration)
    }
}
