use crate::response::{bad_request, store_error_response, ApiResponse};
use crate::AppState;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use cotiza_search::SearchHit;
use cotiza_sheet::CellValue;
use cotiza_store::{
    AddOutcome, BackupInfo, ExportInfo, Product, RowFormat, SaveOutcome, WorkbookReport,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

#[derive(Debug, Serialize)]
pub struct HealthInfo {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// GET /health
pub async fn health() -> Json<ApiResponse<HealthInfo>> {
    Json(ApiResponse::ok(HealthInfo {
        status: "ok".to_string(),
        service: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

/// GET /template
pub async fn get_template(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<ApiResponse<WorkbookReport>>) {
    match state.store.load().await {
        Ok(report) => (StatusCode::OK, Json(ApiResponse::ok(report))),
        Err(e) => store_error_response(&e),
    }
}

#[derive(Debug, Deserialize)]
pub struct SaveRequest {
    #[serde(default)]
    pub sheets: IndexMap<String, Vec<Vec<CellValue>>>,
}

/// POST /save
pub async fn save_sheets(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SaveRequest>,
) -> (StatusCode, Json<ApiResponse<SaveOutcome>>) {
    if req.sheets.is_empty() {
        return bad_request("Request must carry at least one sheet");
    }

    match state.store.save_sheets(req.sheets).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(ApiResponse::with_message("Workbook saved", outcome)),
        ),
        Err(e) => store_error_response(&e),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddDatasetRequest {
    #[serde(default)]
    pub sheet_name: String,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub start_row: Option<usize>,
    #[serde(default)]
    pub format: RowFormat,
}

/// POST /add-dataset
pub async fn add_dataset(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AddDatasetRequest>,
) -> (StatusCode, Json<ApiResponse<AddOutcome>>) {
    if req.sheet_name.trim().is_empty() {
        return bad_request("sheetName must not be blank");
    }
    if req.products.is_empty() {
        return bad_request("products must not be empty");
    }

    match state
        .store
        .add_rows(&req.sheet_name, &req.products, req.start_row, req.format)
        .await
    {
        Ok(outcome) => (
            StatusCode::OK,
            Json(ApiResponse::with_message("Rows added", outcome)),
        ),
        Err(e) => store_error_response(&e),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    #[serde(default)]
    pub file_name: Option<String>,
}

/// POST /export
///
/// The body is optional; without one the export gets a timestamped name.
pub async fn export_copy(
    State(state): State<Arc<AppState>>,
    body: Option<Json<ExportRequest>>,
) -> (StatusCode, Json<ApiResponse<ExportInfo>>) {
    let file_name = body.and_then(|Json(req)| req.file_name);

    match state.store.export_copy(file_name).await {
        Ok(info) => (
            StatusCode::OK,
            Json(ApiResponse::with_message("Workbook exported", info)),
        ),
        Err(e) => store_error_response(&e),
    }
}

/// GET /backups
pub async fn list_backups(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<ApiResponse<Vec<BackupInfo>>>) {
    match state.store.list_backups().await {
        Ok(backups) => (StatusCode::OK, Json(ApiResponse::ok(backups))),
        Err(e) => store_error_response(&e),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreInfo {
    pub restored: String,
}

/// POST /restore/:backup_name
pub async fn restore_backup(
    State(state): State<Arc<AppState>>,
    Path(backup_name): Path<String>,
) -> (StatusCode, Json<ApiResponse<RestoreInfo>>) {
    match state.store.restore_backup(&backup_name).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::with_message(
                "Workbook restored",
                RestoreInfo {
                    restored: backup_name,
                },
            )),
        ),
        Err(e) => store_error_response(&e),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Serialize)]
pub struct SearchResults {
    pub query: String,
    pub count: usize,
    pub results: Vec<SearchHit>,
}

/// GET /search?q=term
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> (StatusCode, Json<ApiResponse<SearchResults>>) {
    let term = params.q.trim();
    if term.is_empty() {
        return bad_request("Query parameter q must not be blank");
    }

    let Some(client) = &state.search else {
        error!("search requested but no upstream is configured");
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::err("Search upstream not configured")),
        );
    };

    match client.search(term).await {
        Ok(results) => (
            StatusCode::OK,
            Json(ApiResponse::ok(SearchResults {
                query: term.to_string(),
                count: results.len(),
                results,
            })),
        ),
        Err(e) => {
            error!(error = %e, "search upstream failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::err(e.to_string())),
            )
        }
    }
}
