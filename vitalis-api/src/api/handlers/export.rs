use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{info, instrument};
use utoipa::IntoParams;

use crate::api::routes::AppState;
use super::ErrorResponse;

/// Query parameters for the export endpoint
#[derive(Debug, Deserialize, IntoParams)]
pub struct ExportParams {
    /// Comma-separated cpf list; omit to export everything
    pub cpfs: Option<String>,
}

/// Dump measurements as a downloadable CSV file
#[utoipa::path(
    get,
    path = "/export",
    params(ExportParams),
    responses(
        (status = 200, description = "CSV file download", content_type = "text/csv"),
        (status = 404, description = "Nothing to export", body = ErrorResponse),
        (status = 500, description = "Store error", body = ErrorResponse),
    ),
    tag = "export"
)]
#[instrument(skip(state))]
pub async fn export_csv(
    State(state): State<AppState>,
    Query(params): Query<ExportParams>,
) -> Result<Response, ErrorResponse> {
    let bytes = state
        .measurements
        .export_csv(params.cpfs.as_deref())
        .await?;

    info!("Exporting {} bytes of CSV", bytes.len());

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"export.csv\"",
            ),
        ],
        bytes,
    )
        .into_response())
}
