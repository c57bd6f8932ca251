//! Lexis Server Library
//!
//! A self-hosted translation gateway for text, office documents, PDFs and
//! images. The binary in `main.rs` wires configuration and providers; the
//! router is exposed here so integration tests can drive it directly.
//!
//! # Modules
//!
//! - `translate`: Provider trait, bounded cache and batch path
//! - `document`: DOCX/PPTX/text codecs and the extract → translate → re-inject pipeline
//! - `ocr`: Text detection for images
//! - `overlay`: Region blur and translated-text redraw
//! - `export`: Text → PDF rendering

pub mod config;
pub mod document;
pub mod error;
pub mod export;
pub mod ocr;
pub mod overlay;
pub mod routes;
pub mod state;
pub mod translate;

use axum::{extract::DefaultBodyLimit, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use config::Config;
pub use error::AppError;
pub use state::AppState;

/// Build the HTTP application
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let body_limit = state.config().server.max_upload_bytes;

    Router::new()
        .merge(routes::home::router())
        .merge(routes::translate::router())
        .merge(routes::documents::router())
        .merge(routes::images::router())
        .merge(routes::export::router())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
