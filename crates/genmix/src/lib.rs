//! HTTP service and command-line front end for the genmix aggregation pipeline.

pub mod assets;
pub mod config;
pub mod cors;
pub mod process;
pub mod routes;
pub mod state;
pub mod upstream;

use std::sync::Arc;

use axum::{middleware, routing::get, Router};

pub use state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(assets::index))
        .route("/data", get(routes::data))
        .route("/{*path}", get(assets::asset))
        .layer(middleware::from_fn(cors::allow_any_origin))
        .with_state(state)
}
