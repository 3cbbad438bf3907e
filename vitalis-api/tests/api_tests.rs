use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;

use vitalis_api::api::{create_application, AppState};
use vitalis_data::database::DatabasePool;
use vitalis_data::models::{NewMeasurement, NewPatient};
use vitalis_data::repository::{
    MeasurementRepositoryTrait, PatientRepositoryTrait, SqliteMeasurementRepository,
    SqlitePatientRepository,
};
use vitalis_domain::services::{MeasurementService, PatientService};

// Ensure tracing is initialized only once
static INIT: std::sync::Once = std::sync::Once::new();
fn initialize() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("info")
            .with_test_writer()
            .try_init();
    });
}

// 2021-06-21 00:00:00 UTC
const DAY_START: i64 = 1_624_233_600;
const DAY_END: i64 = DAY_START + 86_399;

/// Build the app on an in-memory database seeded with two patients and a
/// handful of samples clustered around 2021-06-21.
async fn test_app() -> Router {
    initialize();

    let pool = DatabasePool::connect_in_memory().expect("in-memory pool");
    pool.run_migrations().expect("migrations");

    let patients = SqlitePatientRepository::new(pool.clone());
    let measurements = SqliteMeasurementRepository::new(pool);

    // Stored formatted on purpose; lookups must still match bare input
    let mut ana = NewPatient::new("Ana Souza", "529.310.074-20");
    ana.age = Some(34);
    ana.city = Some("Recife".to_string());
    ana.password = Some("s3cret".to_string());
    let bruno = NewPatient::new("Bruno Lima", "11122233344");

    patients
        .insert_batch(&[ana, bruno])
        .await
        .expect("seed patients");

    measurements
        .insert_batch(&[
            NewMeasurement::new("52931007420", "ind_card", DAY_START, 0.4),
            NewMeasurement::new("52931007420", "ind_card", DAY_START + 40_000, 0.5),
            NewMeasurement::new("52931007420", "ind_card", DAY_END, 0.9),
            NewMeasurement::new("52931007420", "ind_pulm", DAY_START + 100, 0.7),
            // Previous day, must never leak into the 2021-06-21 queries
            NewMeasurement::new("11122233344", "ind_card", DAY_START - 1, 0.2),
        ])
        .await
        .expect("seed measurements");

    create_application(AppState::new(
        std::sync::Arc::new(PatientService::new(patients)),
        std::sync::Arc::new(MeasurementService::new(measurements)),
    ))
}

async fn get(app: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn get_json(app: Router, uri: &str) -> (StatusCode, Value) {
    let (status, body) = get(app, uri).await;
    let json = serde_json::from_slice(&body).unwrap();
    (status, json)
}

#[tokio::test]
async fn health_endpoint_answers() {
    let (status, json) = get_json(test_app().await, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "healthy");
    assert!(json["uptime_seconds"].is_u64());
}

#[tokio::test]
async fn list_patients_returns_everyone() {
    let (status, json) = get_json(test_app().await, "/patients").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn list_patients_filters_by_name_substring() {
    let (status, json) = get_json(test_app().await, "/patients?nome=ana").await;

    assert_eq!(status, StatusCode::OK);
    let list = json.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["name"], "Ana Souza");
}

#[tokio::test]
async fn get_patient_matches_bare_cpf_against_formatted_storage() {
    let (status, json) = get_json(test_app().await, "/patients/52931007420").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "Ana Souza");
    assert_eq!(json["city"], "Recife");
    // The password column exists in storage but is never served
    assert!(json.get("password").is_none());
}

#[tokio::test]
async fn get_patient_matches_formatted_cpf() {
    let (status, json) = get_json(test_app().await, "/patients/529.310.074-20").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["name"], "Ana Souza");
}

#[tokio::test]
async fn get_unknown_patient_is_404() {
    let (status, json) = get_json(test_app().await, "/patients/00000000000").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "not_found");
}

#[tokio::test]
async fn latest_characteristics_reports_null_for_missing_kinds() {
    // Bruno only has ind_card samples
    let (status, json) = get_json(test_app().await, "/patients/11122233344/characteristics").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["ind_card"]["value"], 0.2);
    assert!(json["ind_pulm"].is_null());
}

#[tokio::test]
async fn range_returns_ascending_samples_inclusive_of_both_days() {
    let (status, json) = get_json(
        test_app().await,
        "/patients/529.310.074-20/characteristics/ind_card?de=2021-06-21&ate=2021-06-21",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let list = json.as_array().unwrap();
    // Both day-boundary samples included, previous-day one excluded
    assert_eq!(list.len(), 3);
    assert_eq!(list[0]["epoch"].as_i64().unwrap(), DAY_START);
    assert_eq!(list[2]["epoch"].as_i64().unwrap(), DAY_END);
    assert_eq!(list[0]["type"], "ind_card");
    assert!(list[0]["date"].as_str().unwrap().starts_with("21/06/2021"));
}

#[tokio::test]
async fn range_with_malformed_date_is_400() {
    let (status, json) = get_json(
        test_app().await,
        "/patients/52931007420/characteristics/ind_card?de=21-06-2021&ate=2021-06-21",
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "validation_error");
}

#[tokio::test]
async fn empty_range_is_404() {
    let (status, _) = get_json(
        test_app().await,
        "/patients/52931007420/characteristics/ind_card?de=1999-01-01&ate=1999-01-02",
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn day_bucket_groups_by_cpf_then_kind() {
    let (status, json) = get_json(test_app().await, "/characteristics/21/6/2021").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["skip"], 0);
    assert_eq!(json["limit"], 10);
    assert_eq!(json["total"], 4);

    let ana = &json["data"]["52931007420"];
    assert!(ana["ind_card"].is_object());
    assert_eq!(ana["ind_pulm"]["value"], 0.7);
    // Bruno's only sample is one second before midnight of the 21st
    assert!(json["data"].get("11122233344").is_none());
}

#[tokio::test]
async fn day_bucket_pagination_echoes_and_limits() {
    let (status, json) = get_json(test_app().await, "/characteristics/21/6/2021?skip=0&limit=2").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["limit"], 2);
    assert_eq!(json["total"], 2);
}

#[tokio::test]
async fn day_bucket_invalid_date_is_400() {
    let (status, _) = get_json(test_app().await, "/characteristics/31/2/2021").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn day_with_no_samples_is_404() {
    let (status, _) = get_json(test_app().await, "/characteristics/1/1/1999").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn value_range_picks_latest_qualifying_sample() {
    let (status, json) = get_json(
        test_app().await,
        "/patients/52931007420/characteristic/ind_card/value?valor_min=0.3&valor_max=0.6",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    // 0.9 is out of bounds, 0.5 is the latest within them
    assert_eq!(json["value"], 0.5);
    assert_eq!(json["type"], "ind_card");
    assert_eq!(json["cpf"], "52931007420");
}

#[tokio::test]
async fn value_range_with_no_match_is_404() {
    let (status, _) = get_json(
        test_app().await,
        "/patients/52931007420/characteristic/ind_card/value?valor_min=5.0&valor_max=9.0",
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn export_streams_csv_with_attachment_headers() {
    let app = test_app().await;
    let response = app
        .oneshot(
            Request::builder()
                .method("GET")
                .uri("/export?cpfs=52931007420")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()["content-type"],
        "text/csv; charset=utf-8"
    );
    assert_eq!(
        response.headers()["content-disposition"],
        "attachment; filename=\"export.csv\""
    );

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let text = String::from_utf8(bytes.to_vec()).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next().unwrap(), "cpf,type,epoch,value,date");
    // Header plus the 4 samples for that cpf
    assert_eq!(text.lines().count(), 5);
}

#[tokio::test]
async fn export_of_unknown_cpf_is_404() {
    let (status, json) = get_json(test_app().await, "/export?cpfs=00000000000").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"], "not_found");
}
