pub mod health;

use axum::{routing::get, Router};

use crate::recommend::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/recommend", get(handlers::handle_recommend))
        .route("/api/assessments", get(handlers::handle_list_assessments))
        .with_state(state)
}
