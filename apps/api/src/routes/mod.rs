pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::analysis::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route(
            "/",
            get(health::liveness_handler).post(handlers::handle_analyze_all),
        )
        .route("/health", get(health::health_handler))
        .route("/new-resume", post(handlers::handle_analyze_resume))
        .with_state(state)
}
