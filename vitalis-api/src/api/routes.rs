use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::debug;

use vitalis_domain::services::{MeasurementServiceTrait, PatientServiceTrait};

use crate::api::handlers::{export, health, measurements, patients};
use crate::openapi::configure_swagger_routes;

/// Shared handler state: the two query services behind trait objects
#[derive(Clone)]
pub struct AppState {
    pub patients: Arc<dyn PatientServiceTrait>,
    pub measurements: Arc<dyn MeasurementServiceTrait>,
}

impl AppState {
    pub fn new(
        patients: Arc<dyn PatientServiceTrait>,
        measurements: Arc<dyn MeasurementServiceTrait>,
    ) -> Self {
        Self {
            patients,
            measurements,
        }
    }
}

/// Create the application router
pub fn create_application(state: AppState) -> Router {
    debug!("Creating application router");

    let api_routes = Router::new()
        .route("/patients", get(patients::list_patients))
        .route("/patients/:cpf", get(patients::get_patient))
        .route(
            "/patients/:cpf/characteristics",
            get(measurements::latest_characteristics),
        )
        .route(
            "/patients/:cpf/characteristics/:kind",
            get(measurements::range_by_dates),
        )
        .route(
            "/patients/:cpf/characteristic/:kind/value",
            get(measurements::latest_by_value_range),
        )
        .route(
            "/characteristics/:day/:month/:year",
            get(measurements::by_day),
        )
        .route("/export", get(export::export_csv))
        .route("/health", get(health::health_check))
        .with_state(state);

    debug!("API routes configured");

    api_routes
        .merge(configure_swagger_routes())
        // The front end is served from another origin
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
