pub mod health;
pub mod resumes;
pub mod roles;
pub mod storage;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/api/v1/resumes",
            post(resumes::handle_register).get(resumes::handle_list),
        )
        .route("/api/v1/resumes/text", post(resumes::handle_submit_text))
        .route("/api/v1/resumes/process", post(resumes::handle_process))
        .route(
            "/api/v1/resumes/classified",
            get(resumes::handle_list_classified),
        )
        .route(
            "/api/v1/resumes/:id/status",
            patch(resumes::handle_review_status),
        )
        .route("/api/v1/resumes/:id/source", get(resumes::handle_source_url))
        .route(
            "/api/v1/storage/uploads",
            post(storage::handle_presign_upload),
        )
        .route(
            "/api/v1/roles",
            post(roles::handle_register).get(roles::handle_list),
        )
        .with_state(state)
}
