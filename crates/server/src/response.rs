use axum::http::StatusCode;
use axum::Json;
use cotiza_store::StoreError;
use serde::Serialize;
use tracing::error;

/// Envelope every route answers with.
///
/// `None` fields are skipped during serialization, so successful bodies
/// carry `success`/`data` (plus `message` on mutations) and failures carry
/// `success`/`error`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        ApiResponse {
            success: true,
            message: None,
            data: Some(data),
            error: None,
        }
    }

    pub fn with_message(message: impl Into<String>, data: T) -> Self {
        ApiResponse {
            success: true,
            message: Some(message.into()),
            data: Some(data),
            error: None,
        }
    }

    pub fn err(error: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            message: None,
            data: None,
            error: Some(error.into()),
        }
    }
}

/// Map a store failure onto the HTTP status taxonomy.
///
/// Missing workbook or backup means the resource is absent (404), a rejected
/// file name or row index is the caller's fault (400), everything else is
/// ours (500). The body is always the structured envelope, never a raw trace.
pub fn store_error_response<T: Serialize>(err: &StoreError) -> (StatusCode, Json<ApiResponse<T>>) {
    let status = match err {
        StoreError::WorkbookNotFound { .. } | StoreError::BackupNotFound { .. } => {
            StatusCode::NOT_FOUND
        }
        StoreError::InvalidFileName { .. } | StoreError::RowOutOfRange { .. } => {
            StatusCode::BAD_REQUEST
        }
        StoreError::Sheet(_) | StoreError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error!(error = %err, status = %status, "store operation failed");
    (status, Json(ApiResponse::err(err.to_string())))
}

pub fn bad_request<T: Serialize>(message: impl Into<String>) -> (StatusCode, Json<ApiResponse<T>>) {
    (StatusCode::BAD_REQUEST, Json(ApiResponse::err(message)))
}
