use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use tracing::{info, instrument};
use utoipa::IntoParams;

use crate::api::routes::AppState;
use crate::entities::PatientResponse;
use super::ErrorResponse;

/// Query parameters for listing patients
#[derive(Debug, Deserialize, IntoParams)]
pub struct ListPatientsParams {
    /// Name substring filter, case-insensitive
    pub nome: Option<String>,
}

/// List patients, optionally filtered by a name substring
#[utoipa::path(
    get,
    path = "/patients",
    params(ListPatientsParams),
    responses(
        (status = 200, description = "Patients matching the filter", body = [PatientResponse]),
        (status = 500, description = "Store error", body = ErrorResponse),
    ),
    tag = "patients"
)]
#[instrument(skip(state))]
pub async fn list_patients(
    State(state): State<AppState>,
    Query(params): Query<ListPatientsParams>,
) -> Result<Json<Vec<PatientResponse>>, ErrorResponse> {
    let patients = state.patients.list(params.nome.as_deref()).await?;

    info!("Listed {} patients", patients.len());
    Ok(Json(patients.into_iter().map(PatientResponse::from).collect()))
}

/// Get one patient by cpf (formatted or bare)
#[utoipa::path(
    get,
    path = "/patients/{cpf}",
    params(
        ("cpf" = String, Path, description = "Patient cpf, e.g. 974.642.524-20 or 97464252420")
    ),
    responses(
        (status = 200, description = "Patient found", body = PatientResponse),
        (status = 404, description = "Patient not found", body = ErrorResponse),
    ),
    tag = "patients"
)]
#[instrument(skip(state))]
pub async fn get_patient(
    State(state): State<AppState>,
    Path(cpf): Path<String>,
) -> Result<Json<PatientResponse>, ErrorResponse> {
    let patient = state.patients.get_by_cpf(&cpf).await?;
    Ok(Json(PatientResponse::from(patient)))
}
