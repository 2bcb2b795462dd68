use axum::extract::{Multipart, State};
use axum::Json;
use bytes::Bytes;

use crate::errors::AppError;
use crate::extract::{self, MediaType};
use crate::models::role::{RoleDetails, RoleRegisterResponse};
use crate::state::AppState;

/// POST /api/v1/roles
///
/// Multipart intake: a `name` field plus a `file` part carrying the job
/// description (the role's scoring criteria).
pub async fn handle_register(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<RoleRegisterResponse>, AppError> {
    let mut name: Option<String> = None;
    let mut description: Option<(String, MediaType, Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart request: {e}")))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "name" => {
                let raw = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read 'name': {e}")))?;
                name = Some(raw.trim().to_string());
            }
            "file" => {
                let filename = field.file_name().unwrap_or("role").to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let media = MediaType::from_content_type(&content_type)
                    .map_err(|e| AppError::Validation(format!("{e} (file '{filename}')")))?;
                let bytes = field.bytes().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read file '{filename}': {e}"))
                })?;
                description = Some((filename, media, bytes));
            }
            _ => {}
        }
    }

    let name = name
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::Validation("Missing 'name' field".into()))?;
    let (filename, media, bytes) = description.ok_or_else(|| {
        AppError::Validation("Missing 'file' field with the role description".into())
    })?;

    let description_text = extract::extract_text(media, &bytes).map_err(|e| {
        AppError::Validation(format!("Failed to extract text from '{filename}': {e}"))
    })?;

    let id = state.roles.insert(&name, &description_text).await?;
    Ok(Json(RoleRegisterResponse { id }))
}

/// GET /api/v1/roles
pub async fn handle_list(
    State(state): State<AppState>,
) -> Result<Json<Vec<RoleDetails>>, AppError> {
    let roles = state.roles.list().await?;
    Ok(Json(roles.into_iter().map(RoleDetails::from).collect()))
}
