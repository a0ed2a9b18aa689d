use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use rust_xlsxwriter::Workbook;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use vehicle_registry::config::EnvironmentConfig;
use vehicle_registry::mappers::VehicleMapper;
use vehicle_registry::models::ImportedVehicleRow;
use vehicle_registry::queue::VehicleMessagePublisher;
use vehicle_registry::repositories::InMemoryVehicleRepository;
use vehicle_registry::routes::create_app;
use vehicle_registry::services::VehicleService;
use vehicle_registry::state::AppState;
use vehicle_registry::utils::errors::AppResult;

/// Publicador que guarda las filas en memoria en lugar de usar Redis
#[derive(Default)]
struct RecordingPublisher {
    sent: Mutex<Vec<ImportedVehicleRow>>,
}

#[async_trait]
impl VehicleMessagePublisher for RecordingPublisher {
    async fn send_message(&self, row: &ImportedVehicleRow) -> AppResult<()> {
        self.sent.lock().unwrap().push(row.clone());
        Ok(())
    }
}

struct TestApp {
    router: Router,
    publisher: Arc<RecordingPublisher>,
    import_dir: TempDir,
}

fn create_test_app() -> TestApp {
    let import_dir = tempfile::tempdir().unwrap();
    let publisher = Arc::new(RecordingPublisher::default());

    let service = VehicleService::new(
        Arc::new(InMemoryVehicleRepository::new()),
        publisher.clone(),
        VehicleMapper::default(),
        import_dir.path().to_path_buf(),
    );
    let state = AppState::new(Arc::new(service), EnvironmentConfig::default());

    TestApp {
        router: create_app(state),
        publisher,
        import_dir,
    }
}

impl TestApp {
    async fn send(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    fn import_path(&self) -> PathBuf {
        self.import_dir.path().to_path_buf()
    }
}

fn corolla() -> Value {
    json!({
        "plate": "ABC1234",
        "chassis": "9BWZZZ377VT004251",
        "registrationNumber": "12345678900",
        "model": "Corolla",
        "make": "Toyota",
        "year": 2023
    })
}

fn civic() -> Value {
    json!({
        "plate": "BRA2E19",
        "chassis": "9BWZZZ377VT004252",
        "registrationNumber": "12345678901",
        "model": "Civic",
        "make": "Honda",
        "year": 2020
    })
}

fn write_spreadsheet(path: &Path, rows: &[[&str; 6]]) {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    let headers = ["plate", "chassis", "registrationNumber", "model", "make", "year"];
    for (col, header) in headers.iter().enumerate() {
        sheet.write_string(0, col as u16, *header).unwrap();
    }
    for (row_idx, row) in rows.iter().enumerate() {
        for (col, value) in row.iter().enumerate() {
            sheet.write_string(row_idx as u32 + 1, col as u16, *value).unwrap();
        }
    }
    workbook.save(path).unwrap();
}

#[tokio::test]
async fn test_health_check() {
    let app = create_test_app();
    let (status, body) = app.send("GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_create_vehicle_returns_formatted_response() {
    let app = create_test_app();
    let (status, body) = app.send("POST", "/vehicles", Some(corolla())).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["plate"], "ABC1234");
    assert_eq!(body["registrationNumber"], "12345678900");
    assert_eq!(body["year"], 2023);
    assert!(body["id"].as_str().is_some());
    // dd/MM/yyyy HH:mm:ss
    let created_at = body["createdAt"].as_str().unwrap();
    assert_eq!(created_at.len(), 19);
    assert_eq!(&created_at[2..3], "/");
}

#[tokio::test]
async fn test_create_duplicate_reports_every_conflicting_field() {
    let app = create_test_app();
    app.send("POST", "/vehicles", Some(corolla())).await;

    let mut duplicate = civic();
    duplicate["plate"] = json!("ABC1234");
    duplicate["chassis"] = json!("9BWZZZ377VT004251");

    let (status, body) = app.send("POST", "/vehicles", Some(duplicate)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["conflicts"]["plate"], "ABC1234");
    assert_eq!(body["conflicts"]["chassis"], "9BWZZZ377VT004251");
    assert!(body["conflicts"].get("registrationNumber").is_none());
}

#[tokio::test]
async fn test_create_rejects_invalid_plate() {
    let app = create_test_app();
    let mut invalid = corolla();
    invalid["plate"] = json!("AB-1234");

    let (status, body) = app.send("POST", "/vehicles", Some(invalid)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_create_rejects_malformed_json() {
    let app = create_test_app();
    let (status, _) = app
        .send("POST", "/vehicles", Some(json!({"plate": "ABC1234"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_with_search_and_pagination() {
    let app = create_test_app();
    app.send("POST", "/vehicles", Some(corolla())).await;
    app.send("POST", "/vehicles", Some(civic())).await;

    let (status, body) = app.send("GET", "/vehicles", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 2);
    assert_eq!(body["page"], 1);
    assert_eq!(body["limit"], 10);
    assert_eq!(body["lastPage"], 1);

    let (_, body) = app.send("GET", "/vehicles?search=civic", None).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["model"], "Civic");

    let (_, body) = app.send("GET", "/vehicles?search=2023", None).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["plate"], "ABC1234");

    let (_, body) = app.send("GET", "/vehicles?page=2&limit=1", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["lastPage"], 2);
    assert_eq!(body["data"][0]["plate"], "BRA2E19");
}

#[tokio::test]
async fn test_list_rejects_page_past_the_end() {
    let app = create_test_app();
    app.send("POST", "/vehicles", Some(corolla())).await;

    let (status, body) = app.send("GET", "/vehicles?page=5", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains('1'));
}

#[tokio::test]
async fn test_list_on_empty_store_tolerates_any_page() {
    let app = create_test_app();
    let (status, body) = app.send("GET", "/vehicles?page=7", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 0);
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn test_malformed_id_is_bad_request() {
    let app = create_test_app();

    let (status, _) = app.send("GET", "/vehicles/123", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .send("PUT", "/vehicles/123", Some(json!({"model": "X"})))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.send("DELETE", "/vehicles/123", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_with_own_values_and_with_taken_values() {
    let app = create_test_app();
    let (_, first) = app.send("POST", "/vehicles", Some(corolla())).await;
    app.send("POST", "/vehicles", Some(civic())).await;
    let uri = format!("/vehicles/{}", first["id"].as_str().unwrap());

    let (status, body) = app
        .send("PUT", &uri, Some(json!({"chassis": "9BWZZZ377VT004251", "model": "Corolla Cross"})))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["model"], "Corolla Cross");
    assert_eq!(body["plate"], "ABC1234");

    let (status, body) = app
        .send("PUT", &uri, Some(json!({"plate": "BRA2E19"})))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["conflicts"]["plate"], "BRA2E19");
}

#[tokio::test]
async fn test_delete_then_lookup_is_not_found() {
    let app = create_test_app();
    let (_, created) = app.send("POST", "/vehicles", Some(corolla())).await;
    let uri = format!("/vehicles/{}", created["id"].as_str().unwrap());

    let (status, _) = app.send("DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.send("GET", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.send("DELETE", &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_import_publishes_each_row() {
    let app = create_test_app();
    write_spreadsheet(
        &app.import_path().join("vehicles.xlsx"),
        &[
            ["ABC1234", "9BWZZZ377VT004251", "12345678900", "Corolla", "Toyota", "2023"],
            ["BRA2E19", "9BWZZZ377VT004252", "12345678901", "Civic", "Honda", "2020"],
        ],
    );

    let (status, body) = app.send("POST", "/vehicles/import", None).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["sent"], 2);

    let sent = app.publisher.sent.lock().unwrap();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].plate.as_deref(), Some("ABC1234"));
    assert_eq!(sent[1].year, Some(2020));
}

#[tokio::test]
async fn test_import_without_spreadsheet_is_bad_request() {
    let app = create_test_app();

    let (status, _) = app.send("POST", "/vehicles/import", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(app.publisher.sent.lock().unwrap().is_empty());
}
