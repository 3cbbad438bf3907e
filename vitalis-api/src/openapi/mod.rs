use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Configure Swagger UI endpoints
pub fn configure_swagger_routes() -> SwaggerUi {
    SwaggerUi::new("/api-docs").url("/api-docs/openapi.json", ApiDoc::openapi())
}

// API Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Vitalis API",
        description = "Query API for patient records and clinical measurements"
    ),
    paths(
        crate::api::handlers::health::health_check,
        crate::api::handlers::patients::list_patients,
        crate::api::handlers::patients::get_patient,
        crate::api::handlers::measurements::latest_characteristics,
        crate::api::handlers::measurements::range_by_dates,
        crate::api::handlers::measurements::by_day,
        crate::api::handlers::measurements::latest_by_value_range,
        crate::api::handlers::export::export_csv,
    ),
    components(
        schemas(
            crate::entities::PatientResponse,
            crate::api::handlers::ErrorResponse,
            crate::api::handlers::health::HealthResponse,
            vitalis_domain::entities::CharacteristicSample,
            vitalis_domain::entities::RangeSample,
            vitalis_domain::entities::ValueSample,
            vitalis_domain::entities::DayBucket,
        )
    ),
    tags(
        (name = "patients", description = "Patient demographic queries"),
        (name = "measurements", description = "Clinical measurement queries"),
        (name = "export", description = "Tabular data export"),
        (name = "health", description = "Service health"),
    )
)]
pub struct ApiDoc;
