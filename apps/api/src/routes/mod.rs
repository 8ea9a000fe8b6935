pub mod health;

use axum::{
    routing::{get, patch, post, put},
    Router,
};

use crate::export::handlers as export;
use crate::render::handlers as render;
use crate::state::AppState;
use crate::store::handlers as store;
use crate::sync::handlers as sync;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Document
        .route("/api/v1/resume", get(store::handle_get_resume))
        .route(
            "/api/v1/resume/personal-info",
            patch(store::handle_update_personal_info),
        )
        .route("/api/v1/resume/education", post(store::handle_add_education))
        .route(
            "/api/v1/resume/education/:id",
            patch(store::handle_update_education).delete(store::handle_remove_education),
        )
        .route(
            "/api/v1/resume/experience",
            post(store::handle_add_experience),
        )
        .route(
            "/api/v1/resume/experience/:id",
            patch(store::handle_update_experience).delete(store::handle_remove_experience),
        )
        .route(
            "/api/v1/resume/experience/:id/bullets",
            post(store::handle_add_bullet),
        )
        .route(
            "/api/v1/resume/experience/:id/bullets/:index",
            put(store::handle_update_bullet).delete(store::handle_remove_bullet),
        )
        .route("/api/v1/resume/skills", post(store::handle_add_skill))
        .route(
            "/api/v1/resume/skills/:id",
            patch(store::handle_update_skill).delete(store::handle_remove_skill),
        )
        .route("/api/v1/resume/projects", post(store::handle_add_project))
        .route(
            "/api/v1/resume/projects/:id",
            patch(store::handle_update_project).delete(store::handle_remove_project),
        )
        .route("/api/v1/resume/template", put(store::handle_set_template))
        .route("/api/v1/resume/reset", post(store::handle_reset))
        // Persistence
        .route("/api/v1/resume/save", post(sync::handle_save))
        .route("/api/v1/resume/sync", get(sync::handle_sync_status))
        .route(
            "/api/v1/session",
            post(sync::handle_sign_in).delete(sync::handle_sign_out),
        )
        // Preview & export
        .route("/api/v1/resume/preview", get(render::handle_preview))
        .route("/api/v1/resume/export", post(export::handle_export))
        .with_state(state)
}
