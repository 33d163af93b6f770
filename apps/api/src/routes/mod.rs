pub mod health;
pub mod index;

use axum::{
    routing::{get, post},
    Router,
};

use crate::sheet::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index::index_handler))
        .route("/health", get(health::health_handler))
        .route("/gen_strokes", post(handlers::handle_gen_strokes))
        .with_state(state)
}
