//! Assessment scheduler — the pipeline core.
//!
//! One pass drives `pending -> in_progress -> complete | failed` for a
//! bounded batch of documents. The claim is a plain read; the reservation is
//! the atomic mutual-exclusion point, so two concurrent passes never process
//! the same document twice. Failures are isolated per document; only a
//! failing reservation aborts the whole run.

use std::collections::HashSet;
use std::sync::Arc;

use anyhow::Context;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::assessment::client::Assessor;
use crate::models::resume::{ResumeRow, Status};
use crate::repo::{RepoError, ResumeFilter, ResumeStore, RoleStore};

#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("failed to claim pending documents: {0}")]
    Claim(#[source] RepoError),

    #[error("failed to reserve claimed documents: {0}")]
    Reserve(#[source] RepoError),
}

pub struct Scheduler {
    resumes: Arc<dyn ResumeStore>,
    roles: Arc<dyn RoleStore>,
    assessor: Arc<dyn Assessor>,
    batch_size: usize,
}

impl Scheduler {
    pub fn new(
        resumes: Arc<dyn ResumeStore>,
        roles: Arc<dyn RoleStore>,
        assessor: Arc<dyn Assessor>,
        batch_size: usize,
    ) -> Self {
        Self {
            resumes,
            roles,
            assessor,
            batch_size,
        }
    }

    /// Runs one claim/reserve/assess pass and returns the ids that reached
    /// `complete`. Documents that failed stay queryable in `failed`.
    pub async fn run_pass(&self, cancel: &CancellationToken) -> Result<Vec<Uuid>, SchedulerError> {
        // Claim: oldest pending first, bounded.
        let filter = ResumeFilter {
            status: Some(Status::Pending),
            limit: self.batch_size as i64,
            ..Default::default()
        };
        let pending = self
            .resumes
            .select_by_filters(&filter)
            .await
            .map_err(SchedulerError::Claim)?;
        if pending.is_empty() {
            return Ok(Vec::new());
        }
        let claimed_ids: Vec<Uuid> = pending.iter().map(|r| r.id).collect();

        // Reserve. A claimed batch must never linger in pending (another
        // pass would claim it again) nor be dropped silently, so a failing
        // reservation marks the whole claim failed and aborts the run.
        let reserved: HashSet<Uuid> = match self.resumes.reserve_pending(&claimed_ids).await {
            Ok(ids) => ids.into_iter().collect(),
            Err(e) => {
                if let Err(mark_err) = self
                    .resumes
                    .bulk_update_status(&claimed_ids, Status::Failed)
                    .await
                {
                    warn!("Failed to mark unreserved batch as failed: {mark_err}");
                }
                return Err(SchedulerError::Reserve(e));
            }
        };

        // Ids missing from the reservation were taken by a concurrent pass.
        let batch: Vec<&ResumeRow> = pending.iter().filter(|r| reserved.contains(&r.id)).collect();
        info!(
            "Assessment pass: claimed {}, reserved {}",
            claimed_ids.len(),
            batch.len()
        );

        let mut completed = Vec::new();
        for (position, doc) in batch.iter().enumerate() {
            if cancel.is_cancelled() {
                // Finish nothing new; release what we never started.
                let unstarted: Vec<Uuid> = batch[position..].iter().map(|d| d.id).collect();
                if let Err(e) = self
                    .resumes
                    .bulk_update_status(&unstarted, Status::Pending)
                    .await
                {
                    warn!("Failed to release unstarted documents: {e}");
                }
                info!(
                    "Assessment pass cancelled; released {} unstarted documents",
                    unstarted.len()
                );
                break;
            }

            match self.assess_one(doc).await {
                Ok(()) => {
                    info!(resume_id = %doc.id, "Assessment complete");
                    completed.push(doc.id);
                }
                Err(cause) => {
                    warn!(resume_id = %doc.id, "Assessment failed: {cause:#}");
                    if let Err(e) = self.resumes.update_status(doc.id, Status::Failed).await {
                        warn!(resume_id = %doc.id, "Failed to mark document as failed: {e}");
                    }
                }
            }
        }

        Ok(completed)
    }

    async fn assess_one(&self, doc: &ResumeRow) -> anyhow::Result<()> {
        let role = self
            .roles
            .get(doc.role_id)
            .await
            .context("role lookup failed")?
            .with_context(|| format!("role {} not found", doc.role_id))?;

        let assessment = self
            .assessor
            .assess(&doc.content, &role.description)
            .await
            .context("scoring call failed")?;

        // Scores and the `complete` transition land in one repository call;
        // if it fails the document carries no scores at all.
        self.resumes
            .complete_with_scores(
                doc.id,
                assessment.base_requirement_score,
                &assessment.commentary,
                assessment.fitness_score,
            )
            .await
            .context("failed to commit assessment scores")?;

        Ok(())
    }
}
