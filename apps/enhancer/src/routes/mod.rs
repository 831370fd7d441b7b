pub mod health;
pub mod ui;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::session::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(ui::index_handler))
        .route("/health", get(health::health_handler))
        .route("/api/v1/sessions", post(handlers::handle_create_session))
        .route("/api/v1/sessions/:id", get(handlers::handle_get_session))
        .route(
            "/api/v1/sessions/:id/analysis",
            post(handlers::handle_analysis),
        )
        .route("/api/v1/sessions/:id/enhance", post(handlers::handle_enhance))
        .route(
            "/api/v1/sessions/:id/enhanced.docx",
            get(handlers::handle_download),
        )
        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(state)
}
