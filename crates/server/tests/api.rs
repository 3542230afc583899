//! Route-level tests driven through `tower::ServiceExt::oneshot`.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use cotiza_search::SearchClient;
use cotiza_server::{create_router, AppState};
use cotiza_store::{StoreConfig, WorkbookStore};
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tempfile::tempdir;
use tower::ServiceExt;
use wiremock::matchers::{method, path as url_path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn state_at(dir: &Path) -> Arc<AppState> {
    Arc::new(AppState {
        store: WorkbookStore::new(StoreConfig::new(dir.join("plantilla.xlsx"))),
        search: None,
    })
}

fn app(state: &Arc<AppState>) -> Router {
    create_router(Arc::clone(state))
}

async fn split(response: axum::response::Response) -> (StatusCode, Value) {
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn get(state: &Arc<AppState>, uri: &str) -> (StatusCode, Value) {
    let response = app(state)
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    split(response).await
}

async fn post_json(state: &Arc<AppState>, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let response = app(state).oneshot(request).await.unwrap();
    split(response).await
}

async fn post_empty(state: &Arc<AppState>, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = app(state).oneshot(request).await.unwrap();
    split(response).await
}

async fn seed_workbook(state: &Arc<AppState>) {
    let (status, _) = post_json(
        state,
        "/save",
        json!({
            "sheets": {
                "Recursos": [
                    ["Descripción", "Fuente", "Precio"],
                    ["Cemento gris 50kg", "Homecenter", "$28.900"]
                ],
                "Ppto": [["Item", "Total"]]
            }
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_health_reports_service_and_version() {
    let dir = tempdir().unwrap();
    let state = state_at(dir.path());

    let (status, body) = get(&state, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["service"], "cotiza-server");
    assert!(!body["data"]["version"].as_str().unwrap().is_empty());
    assert!(body.get("error").is_none());
}

#[tokio::test]
async fn test_template_without_workbook_is_404() {
    let dir = tempdir().unwrap();
    let state = state_at(dir.path());

    let (status, body) = get(&state, "/template").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Workbook not found"));
}

#[tokio::test]
async fn test_save_then_template_roundtrip() {
    let dir = tempdir().unwrap();
    let state = state_at(dir.path());

    let (status, body) = post_json(
        &state,
        "/save",
        json!({ "sheets": { "Recursos": [["Descripción"], ["Cemento gris 50kg"]] } }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Workbook saved");
    assert_eq!(body["data"]["sheetsSaved"], 1);
    // First save creates the file, so there is nothing to back up
    assert!(body["data"].get("backup").is_none());

    let (status, body) = get(&state, "/template").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["sheets"]["Recursos"][1][0], "Cemento gris 50kg");
    assert!(body["data"]["fileSize"].as_u64().unwrap() > 0);
}

#[tokio::test]
async fn test_save_with_empty_sheets_is_400() {
    let dir = tempdir().unwrap();
    let state = state_at(dir.path());

    let (status, body) = post_json(&state, "/save", json!({ "sheets": {} })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_add_dataset_appends_formatted_rows() {
    let dir = tempdir().unwrap();
    let state = state_at(dir.path());
    seed_workbook(&state).await;

    let (status, body) = post_json(
        &state,
        "/add-dataset",
        json!({
            "sheetName": "Recursos",
            "products": [{
                "title": "Arena lavada m3",
                "price": "$48.000",
                "source": "Homecenter",
                "searchTerm": "arena lavada",
                "origin": "web"
            }],
            "format": "recursos"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Rows added");
    assert_eq!(body["data"]["startRow"], 2);
    assert_eq!(body["data"]["rowsAdded"], 1);
    assert_eq!(body["data"]["sheetCreated"], false);
    assert!(body["data"]["backup"]
        .as_str()
        .unwrap()
        .starts_with("plantilla_backup_"));

    let (_, body) = get(&state, "/template").await;
    let recursos = &body["data"]["sheets"]["Recursos"];
    assert_eq!(recursos.as_array().unwrap().len(), 3);
    assert_eq!(recursos[2][0], "Arena lavada m3");
    assert_eq!(recursos[2][2], json!(48000.0));
}

#[tokio::test]
async fn test_add_dataset_ppto_layout_at_offset() {
    let dir = tempdir().unwrap();
    let state = state_at(dir.path());
    seed_workbook(&state).await;

    let (status, body) = post_json(
        &state,
        "/add-dataset",
        json!({
            "sheetName": "Ppto",
            "products": [{ "title": "Cemento gris 50kg", "price": "$28.900" }],
            "startRow": 1,
            "format": "ppto"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["startRow"], 1);

    let (_, body) = get(&state, "/template").await;
    let row = &body["data"]["sheets"]["Ppto"][1];
    assert_eq!(row[0], json!(1.0)); // batch index is 1-based
    assert_eq!(row[1], "Cemento gris 50kg");
    assert_eq!(row[3], json!(28900.0));
    assert_eq!(row[4], json!(28900.0));
}

#[tokio::test]
async fn test_add_dataset_validation_errors() {
    let dir = tempdir().unwrap();
    let state = state_at(dir.path());
    seed_workbook(&state).await;

    let (status, _) = post_json(
        &state,
        "/add-dataset",
        json!({ "sheetName": "  ", "products": [{ "title": "x" }] }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = post_json(
        &state,
        "/add-dataset",
        json!({ "sheetName": "Recursos", "products": [] }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_add_dataset_without_workbook_is_404() {
    let dir = tempdir().unwrap();
    let state = state_at(dir.path());

    let (status, body) = post_json(
        &state,
        "/add-dataset",
        json!({ "sheetName": "Recursos", "products": [{ "title": "x" }] }),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_add_dataset_start_row_past_the_grid_is_400() {
    let dir = tempdir().unwrap();
    let state = state_at(dir.path());
    seed_workbook(&state).await;

    let (status, body) = post_json(
        &state,
        "/add-dataset",
        json!({
            "sheetName": "Recursos",
            "products": [{ "title": "Cemento gris 50kg", "price": "$28.900" }],
            "startRow": 50_000_000,
            "format": "recursos"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
    assert!(body["error"].as_str().unwrap().starts_with("Start row"));
}

#[tokio::test]
async fn test_export_names_and_validation() {
    let dir = tempdir().unwrap();
    let state = state_at(dir.path());
    seed_workbook(&state).await;

    // Without a body the export gets a timestamped name
    let (status, body) = post_empty(&state, "/export").await;
    assert_eq!(status, StatusCode::OK);
    let name = body["data"]["fileName"].as_str().unwrap();
    assert!(name.starts_with("plantilla_export_"));
    assert!(name.ends_with(".xlsx"));

    let (status, body) = post_json(&state, "/export", json!({ "fileName": "obra_norte" })).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["fileName"], "obra_norte.xlsx");

    let (status, _) = post_json(&state, "/export", json!({ "fileName": "../fuera" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_backups_and_restore_flow() {
    let dir = tempdir().unwrap();
    let state = state_at(dir.path());
    seed_workbook(&state).await;

    // Replacing the book backs up the seeded version first
    let (status, body) = post_json(
        &state,
        "/save",
        json!({ "sheets": { "Nuevo": [["solo"]] } }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let backup_name = body["data"]["backup"].as_str().unwrap().to_string();

    let (status, body) = get(&state, "/backups").await;
    assert_eq!(status, StatusCode::OK);
    let backups = body["data"].as_array().unwrap();
    assert_eq!(backups.len(), 1);
    assert_eq!(backups[0]["name"], backup_name.as_str());
    assert!(backups[0]["size"].as_u64().unwrap() > 0);
    assert!(backups[0].get("modified").is_some());

    let (status, body) = post_empty(&state, &format!("/restore/{backup_name}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Workbook restored");
    assert_eq!(body["data"]["restored"], backup_name.as_str());

    let (_, body) = get(&state, "/template").await;
    let sheets = body["data"]["sheets"].as_object().unwrap();
    assert!(sheets.contains_key("Recursos"));
    assert!(!sheets.contains_key("Nuevo"));
}

#[tokio::test]
async fn test_restore_unknown_backup_is_404() {
    let dir = tempdir().unwrap();
    let state = state_at(dir.path());
    seed_workbook(&state).await;

    let (status, body) = post_empty(
        &state,
        "/restore/plantilla_backup_2020-01-01T00-00-00-000Z.xlsx",
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_restore_rejects_traversal() {
    let dir = tempdir().unwrap();
    let state = state_at(dir.path());
    seed_workbook(&state).await;

    let (status, _) = post_empty(&state, "/restore/..%2Fplantilla.xlsx").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_blank_query_is_400() {
    let dir = tempdir().unwrap();
    let state = state_at(dir.path());

    let (status, _) = get(&state, "/search").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(&state, "/search?q=%20").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_search_without_upstream_is_500() {
    let dir = tempdir().unwrap();
    let state = state_at(dir.path());

    let (status, body) = get(&state, "/search?q=cemento").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Search upstream not configured");
}

#[tokio::test]
async fn test_search_proxies_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(url_path("/buscar"))
        .and(query_param("q", "cemento"))
        .and(query_param("gl", "co"))
        .and(query_param("hl", "es"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                { "title": "Cemento gris 50kg", "price": "$28.900", "source": "Homecenter" },
                { "title": "Cemento blanco" }
            ]
        })))
        .mount(&server)
        .await;

    let dir = tempdir().unwrap();
    let state = Arc::new(AppState {
        store: WorkbookStore::new(StoreConfig::new(dir.path().join("plantilla.xlsx"))),
        search: Some(SearchClient::new(format!("{}/buscar", server.uri())).unwrap()),
    });

    let (status, body) = get(&state, "/search?q=cemento").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["query"], "cemento");
    assert_eq!(body["data"]["count"], 2);
    assert_eq!(body["data"]["results"][0]["price"], "$28.900");
    assert_eq!(body["data"]["results"][1]["type"], "product");
    assert_eq!(body["data"]["results"][1]["source"], "");
}
