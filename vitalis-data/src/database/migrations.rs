use rusqlite::Connection;
use tracing::info;

/// Run SQLite migrations
pub fn run_migrations(conn: &Connection) -> Result<(), String> {
    info!("Running SQLite migrations");

    create_patients_table(conn)?;
    create_measurements_table(conn)?;

    info!("SQLite migrations completed successfully");
    Ok(())
}

/// Create the patients table. Only name and cpf are mandatory; everything
/// else mirrors an optional attribute of the import source.
fn create_patients_table(conn: &Connection) -> Result<(), String> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS patients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            age INTEGER,
            cpf TEXT NOT NULL UNIQUE,
            rg TEXT,
            birth_date TEXT,
            sex TEXT,
            zodiac_sign TEXT,
            mother_name TEXT,
            father_name TEXT,
            email TEXT,
            password TEXT,
            postal_code TEXT,
            street TEXT,
            number INTEGER,
            neighborhood TEXT,
            city TEXT,
            state TEXT,
            landline TEXT,
            mobile TEXT,
            height TEXT,
            weight INTEGER,
            blood_type TEXT,
            color TEXT
        )",
        [],
    )
    .map_err(|e| e.to_string())?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_patients_name ON patients (name)",
        [],
    )
    .map_err(|e| format!("Failed to create index: {}", e))?;

    Ok(())
}

/// Create the measurements table. The unique index on (cpf, kind, epoch)
/// makes batch inserts with OR IGNORE idempotent across importer re-runs.
fn create_measurements_table(conn: &Connection) -> Result<(), String> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS measurements (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            cpf TEXT NOT NULL,
            kind TEXT NOT NULL,
            epoch BIGINT NOT NULL,
            value REAL NOT NULL
        )",
        [],
    )
    .map_err(|e| e.to_string())?;

    conn.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_measurements_sample
         ON measurements (cpf, kind, epoch)",
        [],
    )
    .map_err(|e| format!("Failed to create index: {}", e))?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_measurements_epoch ON measurements (epoch)",
        [],
    )
    .map_err(|e| format!("Failed to create index: {}", e))?;

    Ok(())
}
