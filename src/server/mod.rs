//! HTTP API: upload a document as multipart field `file`, get Markdown back
//! as JSON, a `.md` attachment, or a ZIP with the images.

mod error;
mod routes;

pub use error::ApiError;
pub use routes::content_disposition;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};

use crate::config::Settings;

const MAX_UPLOAD_BYTES: usize = 100 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    settings: Arc<Settings>,
}

pub fn router(settings: Settings) -> Router {
    let state = AppState {
        settings: Arc::new(settings),
    };
    Router::new()
        .route("/", get(routes::root))
        .route("/health", get(routes::health))
        .route("/convert", post(routes::convert))
        .route("/convert/file", post(routes::convert_file))
        .route("/convert/zip", post(routes::convert_zip))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}
