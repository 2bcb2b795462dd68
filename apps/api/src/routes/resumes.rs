use std::time::Duration;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::assessment::scheduler::Scheduler;
use crate::errors::AppError;
use crate::extract::{self, MediaType};
use crate::models::resume::{
    Classifier, FileRegisterResult, ListClassifiedResponse, ProcessResponse, RegisterResponse,
    ResumeDetails, ResumeSummary, RoleRef, Status, SubmitTextRequest, SubmitTextResponse,
};
use crate::repo::{ResumeFilter, RoleStore};
use crate::state::AppState;
use crate::storage::batch::{upload_batch, UploadItem};
use crate::storage::object_key;

/// Normalizes an intake role reference to a role id, verifying the role
/// exists. Legacy tags resolve by role-name lookup and are never persisted.
pub(crate) async fn resolve_role_ref(
    role_ref: &RoleRef,
    roles: &dyn RoleStore,
) -> Result<Uuid, AppError> {
    match role_ref {
        RoleRef::RoleId(id) => Ok(roles
            .get(*id)
            .await?
            .ok_or_else(|| AppError::Validation(format!("Role {id} not found")))?
            .id),
        RoleRef::LegacyRole(tag) => Ok(roles
            .find_by_name(tag.role_name())
            .await?
            .ok_or_else(|| {
                AppError::Validation(format!(
                    "No role registered for legacy tag '{}'",
                    tag.role_name()
                ))
            })?
            .id),
    }
}

struct IncomingFile {
    filename: String,
    media: MediaType,
    bytes: Bytes,
}

enum PreparedFile {
    Ready { key: String, text: String },
    Failed(String),
}

/// POST /api/v1/resumes
///
/// Multipart intake: repeated `file` parts plus a `role_id` (or deprecated
/// `legacy_role` tag). Media types are validated up front; after that, every
/// file succeeds or fails on its own and the response always carries one
/// result per file.
pub async fn handle_register(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<RegisterResponse>, AppError> {
    let mut role_ref: Option<RoleRef> = None;
    let mut files: Vec<IncomingFile> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Malformed multipart request: {e}")))?
    {
        let field_name = field.name().unwrap_or_default().to_string();
        match field_name.as_str() {
            "role_id" => {
                let raw = read_text_field(field, "role_id").await?;
                let id = Uuid::parse_str(raw.trim())
                    .map_err(|_| AppError::Validation("'role_id' must be a valid UUID".into()))?;
                role_ref = Some(RoleRef::RoleId(id));
            }
            "legacy_role" => {
                let raw = read_text_field(field, "legacy_role").await?;
                let tag = raw.trim().parse().map_err(AppError::Validation)?;
                role_ref = Some(RoleRef::LegacyRole(tag));
            }
            "file" => {
                let filename = field.file_name().unwrap_or("resume").to_string();
                let content_type = field.content_type().unwrap_or_default().to_string();
                let media = MediaType::from_content_type(&content_type)
                    .map_err(|e| AppError::Validation(format!("{e} (file '{filename}')")))?;
                let bytes = field.bytes().await.map_err(|e| {
                    AppError::Validation(format!("Failed to read file '{filename}': {e}"))
                })?;
                files.push(IncomingFile {
                    filename,
                    media,
                    bytes,
                });
            }
            _ => {}
        }
    }

    let role_ref = role_ref.ok_or_else(|| {
        AppError::Validation("Missing 'role_id' (or deprecated 'legacy_role') field".into())
    })?;
    let role_id = resolve_role_ref(&role_ref, state.roles.as_ref()).await?;
    if files.is_empty() {
        return Err(AppError::Validation("No files provided".into()));
    }

    // Extract text per file; an unreadable file stays with its slot.
    let prepared: Vec<PreparedFile> = files
        .iter()
        .map(|f| match extract::extract_text(f.media, &f.bytes) {
            Ok(text) => PreparedFile::Ready {
                key: object_key(&state.config.organization_id, Uuid::new_v4()),
                text,
            },
            Err(e) => PreparedFile::Failed(e.to_string()),
        })
        .collect();

    // Upload the extractable originals, bounded concurrency, per-file
    // isolation. Outcomes come back in item order.
    let items: Vec<UploadItem> = files
        .iter()
        .zip(&prepared)
        .filter_map(|(f, p)| match p {
            PreparedFile::Ready { key, .. } => Some(UploadItem {
                key: key.clone(),
                bytes: f.bytes.clone(),
            }),
            PreparedFile::Failed(_) => None,
        })
        .collect();
    let outcomes = upload_batch(
        state.storage.as_ref(),
        items,
        state.config.upload_concurrency,
        Duration::from_secs(state.config.upload_timeout_secs),
    )
    .await;
    let mut outcome_iter = outcomes.into_iter();

    let mut ids = Vec::new();
    let mut results = Vec::new();
    for (file, prep) in files.iter().zip(prepared) {
        let result = match prep {
            PreparedFile::Failed(error) => FileRegisterResult {
                filename: file.filename.clone(),
                id: None,
                error: Some(error),
            },
            PreparedFile::Ready { key, text } => match outcome_iter.next() {
                Some(outcome) if outcome.success => {
                    match state
                        .resumes
                        .insert(role_id, Status::Pending, &text, Some(&key))
                        .await
                    {
                        Ok(id) => {
                            ids.push(id);
                            FileRegisterResult {
                                filename: file.filename.clone(),
                                id: Some(id),
                                error: None,
                            }
                        }
                        Err(e) => {
                            tracing::error!("Failed to save resume '{}': {e}", file.filename);
                            FileRegisterResult {
                                filename: file.filename.clone(),
                                id: None,
                                error: Some("failed to save resume".into()),
                            }
                        }
                    }
                }
                Some(outcome) => FileRegisterResult {
                    filename: file.filename.clone(),
                    id: None,
                    error: outcome.error.or_else(|| Some("upload failed".into())),
                },
                None => FileRegisterResult {
                    filename: file.filename.clone(),
                    id: None,
                    error: Some("upload result missing".into()),
                },
            },
        };
        results.push(result);
    }

    Ok(Json(RegisterResponse { ids, results }))
}

async fn read_text_field(
    field: axum::extract::multipart::Field<'_>,
    name: &str,
) -> Result<String, AppError> {
    field
        .text()
        .await
        .map_err(|e| AppError::Validation(format!("Failed to read '{name}' field: {e}")))
}

/// POST /api/v1/resumes/text
/// Direct text submission; no object-storage upload involved.
pub async fn handle_submit_text(
    State(state): State<AppState>,
    Json(req): Json<SubmitTextRequest>,
) -> Result<Json<SubmitTextResponse>, AppError> {
    if req.content.trim().is_empty() {
        return Err(AppError::Validation("'content' must not be empty".into()));
    }
    let role_id = resolve_role_ref(&req.role_ref, state.roles.as_ref()).await?;
    let id = state
        .resumes
        .insert(role_id, Status::Pending, &req.content, None)
        .await?;
    Ok(Json(SubmitTextResponse { id }))
}

/// POST /api/v1/resumes/process
/// Runs one scheduler pass and returns the ids completed this pass.
/// Failures are visible only through subsequent status queries.
pub async fn handle_process(
    State(state): State<AppState>,
) -> Result<Json<ProcessResponse>, AppError> {
    let scheduler = Scheduler::new(
        state.resumes.clone(),
        state.roles.clone(),
        state.assessor.clone(),
        state.config.scheduler_batch_size,
    );
    let ids = scheduler
        .run_pass(&CancellationToken::new())
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    Ok(Json(ProcessResponse { ids }))
}

#[derive(Debug, Deserialize)]
pub struct ListParams {
    pub role_id: Option<Uuid>,
    pub status: Option<Status>,
    pub classifier: Option<Classifier>,
    pub limit: Option<i64>,
}

/// GET /api/v1/resumes
pub async fn handle_list(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<ResumeSummary>>, AppError> {
    let filter = ResumeFilter {
        role_id: params.role_id,
        status: params.status,
        classifier: params.classifier,
        limit: params.limit.unwrap_or(100).clamp(1, 500),
    };
    let rows = state.resumes.select_by_filters(&filter).await?;
    Ok(Json(rows.into_iter().map(ResumeSummary::from).collect()))
}

/// GET /api/v1/resumes/classified
/// Completed resumes grouped into the three fitness buckets.
pub async fn handle_list_classified(
    State(state): State<AppState>,
) -> Result<Json<ListClassifiedResponse>, AppError> {
    let rows = state
        .resumes
        .select_by_filters(&ResumeFilter {
            status: Some(Status::Complete),
            ..Default::default()
        })
        .await?;

    let mut response = ListClassifiedResponse {
        very_fit: Vec::new(),
        fit: Vec::new(),
        not_fit: Vec::new(),
    };
    for row in &rows {
        // A completed row missing assessment details is skipped, not fatal.
        let Some(details) = ResumeDetails::from_row(row) else {
            tracing::error!("Resume {} is complete but missing assessment details", row.id);
            continue;
        };
        match Classifier::from_fitness_score(details.fitness_score) {
            Classifier::VeryFit => response.very_fit.push(details),
            Classifier::Fit => response.fit.push(details),
            Classifier::NotFit => response.not_fit.push(details),
        }
    }
    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
pub struct ReviewStatusRequest {
    pub status: Status,
}

/// PATCH /api/v1/resumes/:id/status
///
/// Human-review action. Only `complete` documents can be assessed, and only
/// `failed` documents can be re-queued; the pipeline owns every other
/// transition. Scores are never touched here.
pub async fn handle_review_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<ReviewStatusRequest>,
) -> Result<StatusCode, AppError> {
    let row = state
        .resumes
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))?;
    let current: Status = row
        .status
        .parse()
        .map_err(|e: String| AppError::Internal(anyhow::anyhow!(e)))?;

    let allowed = matches!(
        (current, req.status),
        (
            Status::Complete,
            Status::AssessedFit | Status::AssessedHold | Status::AssessedUnfit
        ) | (Status::Failed, Status::Pending)
    );
    if !allowed {
        return Err(AppError::Validation(format!(
            "Cannot transition resume from '{current}' to '{}'",
            req.status
        )));
    }

    state.resumes.update_status(id, req.status).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct SourceUrlResponse {
    pub url: String,
    pub expires_in_secs: u64,
}

/// GET /api/v1/resumes/:id/source
/// Presigned GET URL for the stored original upload.
pub async fn handle_source_url(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SourceUrlResponse>, AppError> {
    let row = state
        .resumes
        .get(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} not found")))?;
    let key = row
        .source_key
        .ok_or_else(|| AppError::NotFound(format!("Resume {id} has no stored source file")))?;

    let expires_in = Duration::from_secs(state.config.presign_expiry_secs);
    let url = state.storage.presigned_get_url(&key, expires_in).await?;
    Ok(Json(SourceUrlResponse {
        url,
        expires_in_secs: expires_in.as_secs(),
    }))
}
