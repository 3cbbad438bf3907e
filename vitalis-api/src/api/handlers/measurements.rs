use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use tracing::instrument;
use utoipa::IntoParams;

use vitalis_domain::entities::{DayBucket, LatestCharacteristics, RangeSample, ValueSample};

use crate::api::routes::AppState;
use super::ErrorResponse;

/// Latest sample of each known measurement kind for one patient.
/// Kinds with no samples are reported as null rather than omitted.
#[utoipa::path(
    get,
    path = "/patients/{cpf}/characteristics",
    params(
        ("cpf" = String, Path, description = "Patient cpf")
    ),
    responses(
        (status = 200, description = "Map of kind to latest sample or null"),
    ),
    tag = "measurements"
)]
#[instrument(skip(state))]
pub async fn latest_characteristics(
    State(state): State<AppState>,
    Path(cpf): Path<String>,
) -> Result<Json<LatestCharacteristics>, ErrorResponse> {
    let result = state.measurements.latest_characteristics(&cpf).await?;
    Ok(Json(result))
}

/// Query parameters bounding a time-range query, inclusive calendar dates
#[derive(Debug, Deserialize, IntoParams)]
pub struct RangeParams {
    /// Start date, yyyy-mm-dd
    pub de: String,
    /// End date, yyyy-mm-dd (the whole day is included)
    pub ate: String,
}

/// Samples of one kind for one patient between two dates, ascending
#[utoipa::path(
    get,
    path = "/patients/{cpf}/characteristics/{kind}",
    params(
        ("cpf" = String, Path, description = "Patient cpf"),
        ("kind" = String, Path, description = "Measurement type tag, e.g. ind_card"),
        RangeParams
    ),
    responses(
        (status = 200, description = "Samples in the interval, ascending by epoch", body = [RangeSample]),
        (status = 400, description = "Malformed date", body = ErrorResponse),
        (status = 404, description = "No samples in the interval", body = ErrorResponse),
    ),
    tag = "measurements"
)]
#[instrument(skip(state))]
pub async fn range_by_dates(
    State(state): State<AppState>,
    Path((cpf, kind)): Path<(String, String)>,
    Query(params): Query<RangeParams>,
) -> Result<Json<Vec<RangeSample>>, ErrorResponse> {
    let samples = state
        .measurements
        .range(&cpf, &kind, &params.de, &params.ate)
        .await?;
    Ok(Json(samples))
}

/// Pagination parameters for the day-bucketed query
#[derive(Debug, Deserialize, IntoParams)]
pub struct PageParams {
    /// Number of rows to skip (default 0)
    pub skip: Option<usize>,
    /// Maximum rows to return, capped at 100 (default 10)
    pub limit: Option<usize>,
}

/// All samples on one calendar day, paginated and grouped by cpf then kind
#[utoipa::path(
    get,
    path = "/characteristics/{day}/{month}/{year}",
    params(
        ("day" = u32, Path, description = "Day of month, 1-31"),
        ("month" = u32, Path, description = "Month, 1-12"),
        ("year" = i32, Path, description = "Year, 1900 or later"),
        PageParams
    ),
    responses(
        (status = 200, description = "Grouped samples with pagination echo", body = DayBucket),
        (status = 400, description = "Invalid date", body = ErrorResponse),
        (status = 404, description = "No samples on that day", body = ErrorResponse),
    ),
    tag = "measurements"
)]
#[instrument(skip(state))]
pub async fn by_day(
    State(state): State<AppState>,
    Path((day, month, year)): Path<(u32, u32, i32)>,
    Query(params): Query<PageParams>,
) -> Result<Json<DayBucket>, ErrorResponse> {
    let bucket = state
        .measurements
        .by_day(day, month, year, params.skip, params.limit)
        .await?;
    Ok(Json(bucket))
}

/// Value bounds for the latest-in-range query; both are required
#[derive(Debug, Deserialize, IntoParams)]
pub struct ValueRangeParams {
    /// Lower bound, inclusive
    pub valor_min: f64,
    /// Upper bound, inclusive
    pub valor_max: f64,
}

/// Most recent sample for one patient + kind with value inside the bounds
#[utoipa::path(
    get,
    path = "/patients/{cpf}/characteristic/{kind}/value",
    params(
        ("cpf" = String, Path, description = "Patient cpf"),
        ("kind" = String, Path, description = "Measurement type tag"),
        ValueRangeParams
    ),
    responses(
        (status = 200, description = "Latest qualifying sample", body = ValueSample),
        (status = 404, description = "No sample within the bounds", body = ErrorResponse),
        (status = 500, description = "Store error", body = ErrorResponse),
    ),
    tag = "measurements"
)]
#[instrument(skip(state))]
pub async fn latest_by_value_range(
    State(state): State<AppState>,
    Path((cpf, kind)): Path<(String, String)>,
    Query(params): Query<ValueRangeParams>,
) -> Result<Json<ValueSample>, ErrorResponse> {
    let sample = state
        .measurements
        .latest_in_value_range(&cpf, &kind, params.valor_min, params.valor_max)
        .await?;
    Ok(Json(sample))
}
