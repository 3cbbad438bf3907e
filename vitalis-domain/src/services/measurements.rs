use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::debug;

use vitalis_data::models::Measurement;
use vitalis_data::repository::MeasurementRepositoryTrait;

use crate::cpf;
use crate::entities::{
    CharacteristicSample, DayBucket, LatestCharacteristics, RangeSample, ValueSample,
};
use crate::timefmt;
use super::ServiceError;

/// The fixed set of measurement kinds reported by the latest-characteristics
/// endpoint and loaded by the importer.
pub const KNOWN_KINDS: &[&str] = &["ind_card", "ind_pulm"];

/// Pagination defaults and cap for the day-bucketed query
const DEFAULT_LIMIT: usize = 10;
const MAX_LIMIT: usize = 100;

/// Trait for measurement query operations
#[async_trait]
pub trait MeasurementServiceTrait: Send + Sync {
    /// Latest sample of each known kind for one patient. Kinds with no data
    /// map to `None`; an entirely absent patient is not an error here.
    async fn latest_characteristics(
        &self,
        cpf: &str,
    ) -> Result<LatestCharacteristics, ServiceError>;

    /// Samples for one patient + kind between two `yyyy-mm-dd` dates,
    /// both ends inclusive of the whole day, ascending by epoch
    async fn range(
        &self,
        cpf: &str,
        kind: &str,
        de: &str,
        ate: &str,
    ) -> Result<Vec<RangeSample>, ServiceError>;

    /// All samples on one calendar day, paginated, grouped by cpf then kind
    async fn by_day(
        &self,
        day: u32,
        month: u32,
        year: i32,
        skip: Option<usize>,
        limit: Option<usize>,
    ) -> Result<DayBucket, ServiceError>;

    /// Most recent sample for one patient + kind with value inside
    /// [min, max]
    async fn latest_in_value_range(
        &self,
        cpf: &str,
        kind: &str,
        min: f64,
        max: f64,
    ) -> Result<ValueSample, ServiceError>;

    /// Measurement dump as a CSV artifact, optionally restricted to a
    /// comma-separated cpf list
    async fn export_csv(&self, cpfs: Option<&str>) -> Result<Vec<u8>, ServiceError>;
}

/// Measurement query service
pub struct MeasurementService<R> {
    repository: R,
}

impl<R: MeasurementRepositoryTrait> MeasurementService<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }
}

fn to_sample(m: &Measurement) -> CharacteristicSample {
    CharacteristicSample {
        epoch: m.epoch,
        value: m.value,
        date: timefmt::format_epoch(m.epoch),
    }
}

/// Row shape written to the export CSV
#[derive(Serialize)]
struct ExportRow<'a> {
    cpf: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
    epoch: i64,
    value: f64,
    date: String,
}

#[async_trait]
impl<R: MeasurementRepositoryTrait> MeasurementServiceTrait for MeasurementService<R> {
    async fn latest_characteristics(
        &self,
        raw_cpf: &str,
    ) -> Result<LatestCharacteristics, ServiceError> {
        let cpf = cpf::normalize(raw_cpf);

        let mut result = BTreeMap::new();
        for kind in KNOWN_KINDS {
            let latest = self.repository.latest_by_kind(&cpf, kind).await?;
            result.insert(kind.to_string(), latest.as_ref().map(to_sample));
        }

        Ok(result)
    }

    async fn range(
        &self,
        raw_cpf: &str,
        kind: &str,
        de: &str,
        ate: &str,
    ) -> Result<Vec<RangeSample>, ServiceError> {
        let cpf = cpf::normalize(raw_cpf);

        let start_date = timefmt::parse_date(de).ok_or_else(|| {
            ServiceError::Validation("Invalid date format, use yyyy-mm-dd".to_string())
        })?;
        let end_date = timefmt::parse_date(ate).ok_or_else(|| {
            ServiceError::Validation("Invalid date format, use yyyy-mm-dd".to_string())
        })?;

        // The end bound covers the whole end day (23:59:59), matching the
        // day-bucketed query
        let (from, _) = timefmt::day_bounds(start_date);
        let (_, to) = timefmt::day_bounds(end_date);

        let rows = self.repository.range_by_epoch(&cpf, kind, from, to).await?;
        if rows.is_empty() {
            return Err(ServiceError::NotFound(
                "No measurements found in this interval".to_string(),
            ));
        }

        Ok(rows
            .iter()
            .map(|m| RangeSample {
                epoch: m.epoch,
                value: m.value,
                kind: m.kind.clone(),
                date: timefmt::format_epoch(m.epoch),
            })
            .collect())
    }

    async fn by_day(
        &self,
        day: u32,
        month: u32,
        year: i32,
        skip: Option<usize>,
        limit: Option<usize>,
    ) -> Result<DayBucket, ServiceError> {
        if year < 1900 {
            return Err(ServiceError::Validation("Invalid date".to_string()));
        }
        let date = NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| ServiceError::Validation("Invalid date".to_string()))?;

        let skip = skip.unwrap_or(0);
        let limit = limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

        let (from, to) = timefmt::day_bounds(date);
        debug!("Day bucket query {}..{} skip={} limit={}", from, to, skip, limit);

        let rows = self
            .repository
            .range_by_epoch_global(from, to, skip, limit)
            .await?;
        if rows.is_empty() {
            return Err(ServiceError::NotFound(
                "No measurements found for this date".to_string(),
            ));
        }

        let total = rows.len();
        let mut data: BTreeMap<String, BTreeMap<String, CharacteristicSample>> = BTreeMap::new();
        for m in &rows {
            data.entry(m.cpf.clone())
                .or_default()
                .insert(m.kind.clone(), to_sample(m));
        }

        Ok(DayBucket {
            skip,
            limit,
            total,
            data,
        })
    }

    async fn latest_in_value_range(
        &self,
        raw_cpf: &str,
        kind: &str,
        min: f64,
        max: f64,
    ) -> Result<ValueSample, ServiceError> {
        let cpf = cpf::normalize(raw_cpf);

        let hit = self
            .repository
            .latest_in_value_range(&cpf, kind, min, max)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(
                    "No measurement found for the given criteria".to_string(),
                )
            })?;

        Ok(ValueSample {
            cpf: hit.cpf,
            kind: hit.kind,
            value: hit.value,
            epoch: hit.epoch,
            date: timefmt::format_epoch(hit.epoch),
        })
    }

    async fn export_csv(&self, cpfs: Option<&str>) -> Result<Vec<u8>, ServiceError> {
        let rows = match cpfs {
            Some(list) => {
                let wanted: Vec<String> = list
                    .split(',')
                    .map(|c| cpf::normalize(c.trim()))
                    .filter(|c| !c.is_empty())
                    .collect();
                self.repository.by_cpfs(&wanted).await?
            }
            None => self.repository.all().await?,
        };

        if rows.is_empty() {
            return Err(ServiceError::NotFound("No data to export".to_string()));
        }

        let mut writer = csv::Writer::from_writer(Vec::new());
        for m in &rows {
            writer
                .serialize(ExportRow {
                    cpf: &m.cpf,
                    kind: &m.kind,
                    epoch: m.epoch,
                    value: m.value,
                    date: timefmt::format_epoch(m.epoch),
                })
                .map_err(|e| ServiceError::Repository(e.to_string()))?;
        }

        writer
            .into_inner()
            .map_err(|e| ServiceError::Repository(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vitalis_data::models::NewMeasurement;
    use vitalis_data::repository::mock::MockMeasurementRepository;

    const CPF: &str = "97464252420";

    // 2021-06-21 00:00:00 UTC
    const DAY_START: i64 = 1_624_233_600;

    async fn service_with(
        rows: Vec<NewMeasurement>,
    ) -> MeasurementService<MockMeasurementRepository> {
        let repo = MockMeasurementRepository::new();
        repo.insert_batch(&rows).await.unwrap();
        MeasurementService::new(repo)
    }

    #[tokio::test]
    async fn latest_characteristics_reports_null_for_missing_kinds() {
        let service = service_with(vec![
            NewMeasurement::new(CPF, "ind_card", 1_622_563_699, 0.715997),
        ])
        .await;

        let result = service.latest_characteristics(CPF).await.unwrap();
        assert_eq!(result.len(), KNOWN_KINDS.len());

        let card = result["ind_card"].as_ref().unwrap();
        assert_eq!(card.epoch, 1_622_563_699);
        assert_eq!(card.date, "01/06/2021 16:08:19");
        assert!(result["ind_pulm"].is_none());
    }

    #[tokio::test]
    async fn range_rejects_malformed_dates() {
        let service = service_with(vec![]).await;

        let err = service
            .range(CPF, "ind_card", "21-06-2021", "2021-06-22")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn range_includes_the_whole_end_day() {
        let end_of_day = DAY_START + 86_399;
        let service = service_with(vec![
            NewMeasurement::new(CPF, "ind_card", DAY_START, 0.1),
            NewMeasurement::new(CPF, "ind_card", end_of_day, 0.2),
            NewMeasurement::new(CPF, "ind_card", end_of_day + 1, 0.3),
        ])
        .await;

        let samples = service
            .range(CPF, "ind_card", "2021-06-21", "2021-06-21")
            .await
            .unwrap();
        let epochs: Vec<i64> = samples.iter().map(|s| s.epoch).collect();
        assert_eq!(epochs, vec![DAY_START, end_of_day]);
    }

    #[tokio::test]
    async fn empty_range_is_not_found() {
        let service = service_with(vec![]).await;

        let err = service
            .range(CPF, "ind_card", "2021-06-01", "2021-06-21")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn by_day_paginates_without_overlap() {
        let rows: Vec<NewMeasurement> = (0..8)
            .map(|i| {
                NewMeasurement::new(format!("{:011}", i), "ind_card", DAY_START + i, 0.5)
            })
            .collect();
        let service = service_with(rows).await;

        let first = service.by_day(21, 6, 2021, Some(0), Some(5)).await.unwrap();
        let second = service.by_day(21, 6, 2021, Some(5), Some(5)).await.unwrap();

        assert_eq!(first.total, 5);
        assert_eq!(second.total, 3);
        for cpf in first.data.keys() {
            assert!(!second.data.contains_key(cpf));
        }
    }

    #[tokio::test]
    async fn by_day_boundary_sample_is_included() {
        let end_of_day = DAY_START + 86_399;
        let service = service_with(vec![
            NewMeasurement::new(CPF, "ind_card", end_of_day, 0.5),
            NewMeasurement::new(CPF, "ind_pulm", end_of_day + 1, 0.6),
        ])
        .await;

        let bucket = service.by_day(21, 6, 2021, None, None).await.unwrap();
        assert_eq!(bucket.total, 1);
        assert!(bucket.data[CPF].contains_key("ind_card"));
        assert!(!bucket.data[CPF].contains_key("ind_pulm"));
    }

    #[tokio::test]
    async fn by_day_rejects_impossible_dates() {
        let service = service_with(vec![]).await;

        assert!(matches!(
            service.by_day(31, 2, 2021, None, None).await.unwrap_err(),
            ServiceError::Validation(_)
        ));
        assert!(matches!(
            service.by_day(1, 1, 1850, None, None).await.unwrap_err(),
            ServiceError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn value_range_picks_in_range_sample_over_newer_ones() {
        let service = service_with(vec![
            NewMeasurement::new(CPF, "ind_card", 100, 0.2),
            NewMeasurement::new(CPF, "ind_card", 200, 0.5),
            NewMeasurement::new(CPF, "ind_card", 300, 0.9),
        ])
        .await;

        let hit = service
            .latest_in_value_range(CPF, "ind_card", 0.3, 0.7)
            .await
            .unwrap();
        assert_eq!(hit.epoch, 200);
        assert!((hit.value - 0.5).abs() < f64::EPSILON);

        let err = service
            .latest_in_value_range(CPF, "ind_card", 1.5, 2.0)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn export_of_empty_store_is_not_found() {
        let service = service_with(vec![]).await;

        let err = service.export_csv(None).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        // Same for a filter that matches nothing
        let service = service_with(vec![
            NewMeasurement::new(CPF, "ind_card", 100, 0.2),
        ])
        .await;
        let err = service.export_csv(Some("000.000.000-00")).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn export_writes_header_and_rows() {
        let service = service_with(vec![
            NewMeasurement::new(CPF, "ind_card", 1_622_563_699, 0.715997),
        ])
        .await;

        let bytes = service.export_csv(Some("974.642.524-20")).await.unwrap();
        let text = String::from_utf8(bytes).unwrap();

        let mut lines = text.lines();
        assert_eq!(lines.next().unwrap(), "cpf,type,epoch,value,date");
        let row = lines.next().unwrap();
        assert!(row.starts_with("97464252420,ind_card,1622563699,0.715997,"));
    }
}
