use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::response::Html;
use axum::routing::{get, post};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use zipkey_registry::Registry;

use crate::{download, pages, upload};

/// Estado compartilhado pelos handlers.
pub struct AppState {
    pub registry: Registry,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(registry: Registry, upload_dir: PathBuf, max_upload_bytes: usize) -> Self {
        Self {
            registry,
            upload_dir,
            max_upload_bytes,
        }
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/index.html", get(index))
        .route("/download.html", get(download_page))
        .route("/upload", post(upload::upload_file))
        .route("/download", get(download::download_form))
        .route("/download/{code}", get(download::download_file))
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve até `shutdown` completar; requests em andamento terminam antes.
pub async fn serve<F>(listener: TcpListener, state: Arc<AppState>, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn index() -> Html<String> {
    Html(pages::index())
}

async fn download_page() -> Html<String> {
    Html(pages::download())
}
