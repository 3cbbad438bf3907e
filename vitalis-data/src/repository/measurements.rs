use async_trait::async_trait;
use rusqlite::{params, Row};
use tracing::debug;

use crate::database::DatabasePool;
use crate::models::{Measurement, NewMeasurement};
use super::errors::RepositoryError;

const MEASUREMENT_COLUMNS: &str = "id, cpf, kind, epoch, value";

const CPF_NORMALIZED: &str = "replace(replace(cpf, '.', ''), '-', '')";

/// Repository trait for measurement samples
#[async_trait]
pub trait MeasurementRepositoryTrait: Send + Sync {
    /// The sample with the highest epoch for a cpf + kind pair
    async fn latest_by_kind(
        &self,
        cpf: &str,
        kind: &str,
    ) -> Result<Option<Measurement>, RepositoryError>;

    /// Samples for cpf + kind with epoch in [from, to], ascending by epoch
    async fn range_by_epoch(
        &self,
        cpf: &str,
        kind: &str,
        from: i64,
        to: i64,
    ) -> Result<Vec<Measurement>, RepositoryError>;

    /// Paginated samples across all patients with epoch in [from, to],
    /// in store order
    async fn range_by_epoch_global(
        &self,
        from: i64,
        to: i64,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Measurement>, RepositoryError>;

    /// Among samples for cpf + kind with value in [min, max], the one with
    /// the highest epoch
    async fn latest_in_value_range(
        &self,
        cpf: &str,
        kind: &str,
        min: f64,
        max: f64,
    ) -> Result<Option<Measurement>, RepositoryError>;

    /// All samples whose (normalized) cpf is in the given list
    async fn by_cpfs(&self, cpfs: &[String]) -> Result<Vec<Measurement>, RepositoryError>;

    /// Every sample in the store
    async fn all(&self) -> Result<Vec<Measurement>, RepositoryError>;

    /// Insert a batch of samples in one transaction. Samples that duplicate
    /// an existing (cpf, kind, epoch) are skipped. Returns the number
    /// actually inserted.
    async fn insert_batch(&self, rows: &[NewMeasurement]) -> Result<usize, RepositoryError>;
}

/// SQLite-backed measurement repository
#[derive(Debug, Clone)]
pub struct SqliteMeasurementRepository {
    pool: DatabasePool,
}

impl SqliteMeasurementRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn map_measurement_row(row: &Row<'_>) -> rusqlite::Result<Measurement> {
    Ok(Measurement {
        id: row.get(0)?,
        cpf: row.get(1)?,
        kind: row.get(2)?,
        epoch: row.get(3)?,
        value: row.get(4)?,
    })
}

#[async_trait]
impl MeasurementRepositoryTrait for SqliteMeasurementRepository {
    async fn latest_by_kind(
        &self,
        cpf: &str,
        kind: &str,
    ) -> Result<Option<Measurement>, RepositoryError> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {MEASUREMENT_COLUMNS} FROM measurements
             WHERE cpf = ?1 AND kind = ?2
             ORDER BY epoch DESC LIMIT 1"
        ))?;

        match stmt.query_row(params![cpf, kind], map_measurement_row) {
            Ok(m) => Ok(Some(m)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(RepositoryError::Sqlite(e)),
        }
    }

    async fn range_by_epoch(
        &self,
        cpf: &str,
        kind: &str,
        from: i64,
        to: i64,
    ) -> Result<Vec<Measurement>, RepositoryError> {
        debug!("Range query for kind={} in [{}, {}]", kind, from, to);

        let conn = self.pool.get()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {MEASUREMENT_COLUMNS} FROM measurements
             WHERE cpf = ?1 AND kind = ?2 AND epoch >= ?3 AND epoch <= ?4
             ORDER BY epoch ASC"
        ))?;

        let rows = stmt.query_map(params![cpf, kind, from, to], map_measurement_row)?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    async fn range_by_epoch_global(
        &self,
        from: i64,
        to: i64,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<Measurement>, RepositoryError> {
        debug!(
            "Global range query in [{}, {}], offset={}, limit={}",
            from, to, offset, limit
        );

        let conn = self.pool.get()?;

        // Store order (rowid) keeps pagination windows stable
        let mut stmt = conn.prepare(&format!(
            "SELECT {MEASUREMENT_COLUMNS} FROM measurements
             WHERE epoch >= ?1 AND epoch <= ?2
             ORDER BY id LIMIT ?3 OFFSET ?4"
        ))?;

        let rows = stmt.query_map(
            params![from, to, limit as i64, offset as i64],
            map_measurement_row,
        )?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    async fn latest_in_value_range(
        &self,
        cpf: &str,
        kind: &str,
        min: f64,
        max: f64,
    ) -> Result<Option<Measurement>, RepositoryError> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {MEASUREMENT_COLUMNS} FROM measurements
             WHERE cpf = ?1 AND kind = ?2 AND value >= ?3 AND value <= ?4
             ORDER BY epoch DESC LIMIT 1"
        ))?;

        match stmt.query_row(params![cpf, kind, min, max], map_measurement_row) {
            Ok(m) => Ok(Some(m)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(RepositoryError::Sqlite(e)),
        }
    }

    async fn by_cpfs(&self, cpfs: &[String]) -> Result<Vec<Measurement>, RepositoryError> {
        if cpfs.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.pool.get()?;

        let placeholders = vec!["?"; cpfs.len()].join(", ");
        let mut stmt = conn.prepare(&format!(
            "SELECT {MEASUREMENT_COLUMNS} FROM measurements
             WHERE {CPF_NORMALIZED} IN ({placeholders})
             ORDER BY id"
        ))?;

        let rows = stmt.query_map(rusqlite::params_from_iter(cpfs.iter()), map_measurement_row)?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    async fn all(&self) -> Result<Vec<Measurement>, RepositoryError> {
        let conn = self.pool.get()?;

        let mut stmt = conn.prepare(&format!(
            "SELECT {MEASUREMENT_COLUMNS} FROM measurements ORDER BY id"
        ))?;

        let rows = stmt.query_map([], map_measurement_row)?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    async fn insert_batch(&self, rows: &[NewMeasurement]) -> Result<usize, RepositoryError> {
        debug!("Inserting measurement batch of {}", rows.len());

        let mut conn = self.pool.get()?;
        let tx = conn.transaction()?;

        let mut inserted = 0;
        {
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO measurements (cpf, kind, epoch, value)
                 VALUES (?1, ?2, ?3, ?4)",
            )?;

            for m in rows {
                inserted += stmt.execute(params![m.cpf, m.kind, m.epoch, m.value])?;
            }
        }

        tx.commit()?;
        Ok(inserted)
    }
}
