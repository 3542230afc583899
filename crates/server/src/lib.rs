//! # cotiza-server
//!
//! HTTP surface for the quotation workbook service. Routes are thin
//! wrappers over [`cotiza_store::WorkbookStore`] and
//! [`cotiza_search::SearchClient`]; every response body is the
//! [`response::ApiResponse`] envelope.

use axum::routing::{get, post};
use axum::Router;
use cotiza_search::SearchClient;
use cotiza_store::WorkbookStore;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

pub mod handlers;
pub mod response;

pub use response::ApiResponse;

/// Shared application state
pub struct AppState {
    pub store: WorkbookStore,
    /// Absent when no upstream search URL was configured.
    pub search: Option<SearchClient>,
}

/// Create the application router.
///
/// This is separated from serving to allow testing the routes without a
/// socket.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health))
        .route("/template", get(handlers::get_template))
        .route("/save", post(handlers::save_sheets))
        .route("/add-dataset", post(handlers::add_dataset))
        .route("/export", post(handlers::export_copy))
        .route("/backups", get(handlers::list_backups))
        .route("/restore/:backup_name", post(handlers::restore_backup))
        .route("/search", get(handlers::search))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Bind and serve until a shutdown signal arrives.
pub async fn run_server(host: &str, port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("cotiza-server listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("shutdown signal received, stopping server");
}
