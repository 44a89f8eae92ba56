//! recipe-server library - Recipe Manager HTTP service
//!
//! Exposes the router and state for the binary and for integration tests.

use axum::extract::DefaultBodyLimit;
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod uploads;

pub use crate::error::{ApiError, ApiResult};

use crate::db::RecipeRepository;
use crate::uploads::{ImageStore, PUBLIC_PREFIX};

/// Room for the text fields and multipart framing on top of the image
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Recipe repository (owns the connection pool)
    pub recipes: RecipeRepository,
    /// Uploaded image storage
    pub images: ImageStore,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, images: ImageStore) -> Self {
        Self {
            recipes: RecipeRepository::new(db),
            images,
        }
    }
}

/// Build application router
///
/// Recipe API under `/api/recipes`, stored images under `/uploads`,
/// health at `/health`.
pub fn build_router(state: AppState) -> Router {
    let body_limit = state.images.max_bytes() + FORM_OVERHEAD_BYTES;
    let uploads = ServeDir::new(state.images.dir());

    Router::new()
        .merge(api::recipe_routes())
        .merge(api::health_routes())
        .nest_service(PUBLIC_PREFIX, uploads)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
