//! Persistence contracts for resumes and roles.
//!
//! The scheduler and handlers only talk to these traits; Postgres
//! implementations live in [`pg`]. All mutating operations commit durably
//! before returning, and every multi-row mutation is a single atomic
//! statement.

pub mod pg;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::resume::{Classifier, ResumeRow, Status};
use crate::models::role::RoleRow;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("store error: {0}")]
    Store(String),
}

impl From<RepoError> for crate::errors::AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::Database(e) => crate::errors::AppError::Database(e),
            RepoError::Store(msg) => crate::errors::AppError::Internal(anyhow::anyhow!(msg)),
        }
    }
}

/// Optional filters for resume listing. Results are always ordered by
/// `created_at` ascending (oldest first) and bounded by `limit`.
#[derive(Debug, Clone)]
pub struct ResumeFilter {
    pub role_id: Option<Uuid>,
    pub status: Option<Status>,
    pub classifier: Option<Classifier>,
    pub limit: i64,
}

impl Default for ResumeFilter {
    fn default() -> Self {
        ResumeFilter {
            role_id: None,
            status: None,
            classifier: None,
            limit: 100,
        }
    }
}

#[async_trait]
pub trait ResumeStore: Send + Sync {
    async fn select_by_filters(&self, filter: &ResumeFilter) -> Result<Vec<ResumeRow>, RepoError>;

    async fn get(&self, id: Uuid) -> Result<Option<ResumeRow>, RepoError>;

    async fn insert(
        &self,
        role_id: Uuid,
        status: Status,
        content: &str,
        source_key: Option<&str>,
    ) -> Result<Uuid, RepoError>;

    /// Flips the given ids from `pending` to `in_progress` in one atomic
    /// statement and returns the ids actually flipped. This is the
    /// mutual-exclusion point between concurrent scheduler passes: an id
    /// already reserved elsewhere is simply absent from the returned set.
    async fn reserve_pending(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, RepoError>;

    /// Writes all three score fields and transitions to `complete` in a
    /// single statement; scores and status can never diverge.
    async fn complete_with_scores(
        &self,
        id: Uuid,
        base_requirement_score: i32,
        commentary: &str,
        fitness_score: i32,
    ) -> Result<(), RepoError>;

    async fn update_status(&self, id: Uuid, status: Status) -> Result<(), RepoError>;

    /// Transitions every given id in one atomic statement.
    async fn bulk_update_status(&self, ids: &[Uuid], status: Status) -> Result<(), RepoError>;
}

#[async_trait]
pub trait RoleStore: Send + Sync {
    async fn insert(&self, name: &str, description: &str) -> Result<Uuid, RepoError>;

    async fn get(&self, id: Uuid) -> Result<Option<RoleRow>, RepoError>;

    async fn find_by_name(&self, name: &str) -> Result<Option<RoleRow>, RepoError>;

    async fn list(&self) -> Result<Vec<RoleRow>, RepoError>;
}
