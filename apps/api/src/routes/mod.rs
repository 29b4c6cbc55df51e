pub mod health;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::editor::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Schema
        .route("/api/v1/resumes/validate", post(handlers::handle_validate))
        // Editing sessions
        .route("/api/v1/sessions", post(handlers::handle_open_session))
        .route(
            "/api/v1/sessions/:id",
            get(handlers::handle_get_session).delete(handlers::handle_close_session),
        )
        .route(
            "/api/v1/sessions/:id/fields",
            patch(handlers::handle_update_field),
        )
        .route(
            "/api/v1/sessions/:id/sections/:section",
            post(handlers::handle_add_item),
        )
        .route(
            "/api/v1/sessions/:id/sections/:section/:index",
            patch(handlers::handle_update_item).delete(handlers::handle_remove_item),
        )
        .route("/api/v1/sessions/:id/save", post(handlers::handle_save))
        .route("/api/v1/sessions/:id/delete", post(handlers::handle_delete))
        .route("/api/v1/sessions/:id/preview", get(handlers::handle_preview))
        .route("/api/v1/sessions/:id/import", post(handlers::handle_import))
        .route("/api/v1/sessions/:id/export", get(handlers::handle_export))
        .with_state(state)
}
