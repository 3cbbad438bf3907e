//! Response shapes produced by the query services.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One sample as returned by the latest-characteristics and day-bucket
/// endpoints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CharacteristicSample {
    /// Sample timestamp, seconds since the Unix epoch
    pub epoch: i64,

    /// Sample value
    pub value: f64,

    /// Timestamp rendered as dd/mm/yyyy HH:MM:SS (UTC)
    pub date: String,
}

/// One sample of a time-range query, annotated with its type tag
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RangeSample {
    pub epoch: i64,
    pub value: f64,

    /// Measurement type tag
    #[serde(rename = "type")]
    pub kind: String,

    pub date: String,
}

/// Latest sample matching a value-range query
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ValueSample {
    pub cpf: String,

    #[serde(rename = "type")]
    pub kind: String,

    pub value: f64,
    pub epoch: i64,
    pub date: String,
}

/// Paginated, date-bucketed query result: samples for one calendar day
/// grouped by cpf and then by measurement kind.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DayBucket {
    /// Offset echoed back from the request
    pub skip: usize,

    /// Limit echoed back from the request (after clamping)
    pub limit: usize,

    /// Number of raw rows fetched, before grouping
    pub total: usize,

    /// cpf -> kind -> sample
    pub data: BTreeMap<String, BTreeMap<String, CharacteristicSample>>,
}

/// Map of each known measurement kind to its latest sample, if any
pub type LatestCharacteristics = BTreeMap<String, Option<CharacteristicSample>>;
