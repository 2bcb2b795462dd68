use std::time::Duration;

use axum::extract::State;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::storage::object_key;

#[derive(Debug, Serialize)]
pub struct PresignUploadResponse {
    pub key: String,
    pub url: String,
    pub expires_in_secs: u64,
}

/// POST /api/v1/storage/uploads
///
/// Issues a presigned PUT URL against a freshly derived key for client-side
/// direct upload. The key is never reused, so a retried upload cannot
/// collide with a prior attempt.
pub async fn handle_presign_upload(
    State(state): State<AppState>,
) -> Result<Json<PresignUploadResponse>, AppError> {
    let key = object_key(&state.config.organization_id, Uuid::new_v4());
    let expires_in = Duration::from_secs(state.config.presign_expiry_secs);
    let url = state.storage.presigned_put_url(&key, expires_in).await?;
    Ok(Json(PresignUploadResponse {
        key,
        url,
        expires_in_secs: expires_in.as_secs(),
    }))
}
