use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Fitness score at or above this bucket as `very_fit`.
pub const VERY_FIT_MIN_SCORE: i32 = 75;
/// Fitness score at or above this (and below `VERY_FIT_MIN_SCORE`) bucket as `fit`.
pub const FIT_MIN_SCORE: i32 = 40;

/// Lifecycle status of a resume.
///
/// The first four states are system-driven: the scheduler moves documents
/// `pending -> in_progress -> complete | failed`. The `assessed_*` states are
/// reachable only through the human-review endpoint, never by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Pending,
    InProgress,
    Complete,
    Failed,
    AssessedFit,
    AssessedHold,
    AssessedUnfit,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "pending",
            Status::InProgress => "in_progress",
            Status::Complete => "complete",
            Status::Failed => "failed",
            Status::AssessedFit => "assessed_fit",
            Status::AssessedHold => "assessed_hold",
            Status::AssessedUnfit => "assessed_unfit",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Status::Pending),
            "in_progress" => Ok(Status::InProgress),
            "complete" => Ok(Status::Complete),
            "failed" => Ok(Status::Failed),
            "assessed_fit" => Ok(Status::AssessedFit),
            "assessed_hold" => Ok(Status::AssessedHold),
            "assessed_unfit" => Ok(Status::AssessedUnfit),
            other => Err(format!("unknown resume status '{other}'")),
        }
    }
}

/// Derived three-way fitness bucket. Computed from `fitness_score`, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classifier {
    VeryFit,
    Fit,
    NotFit,
}

impl Classifier {
    pub fn from_fitness_score(score: i32) -> Self {
        if score >= VERY_FIT_MIN_SCORE {
            Classifier::VeryFit
        } else if score >= FIT_MIN_SCORE {
            Classifier::Fit
        } else {
            Classifier::NotFit
        }
    }

    /// Inclusive lower and exclusive upper `fitness_score` bounds, for
    /// evaluating the classifier server-side in SQL.
    pub fn score_bounds(&self) -> (Option<i32>, Option<i32>) {
        match self {
            Classifier::VeryFit => (Some(VERY_FIT_MIN_SCORE), None),
            Classifier::Fit => (Some(FIT_MIN_SCORE), Some(VERY_FIT_MIN_SCORE)),
            Classifier::NotFit => (None, Some(FIT_MIN_SCORE)),
        }
    }
}

/// Deprecated inline role tags accepted at intake for backwards compatibility.
/// Never persisted; resolved to a role id by name lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LegacyRole {
    SeniorProductEngineer,
}

impl LegacyRole {
    /// The role name the tag resolves against.
    pub fn role_name(&self) -> &'static str {
        match self {
            LegacyRole::SeniorProductEngineer => "senior_product_engineer",
        }
    }
}

impl FromStr for LegacyRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "senior_product_engineer" => Ok(LegacyRole::SeniorProductEngineer),
            other => Err(format!("unknown legacy role tag '{other}'")),
        }
    }
}

/// Role reference accepted at the intake boundary: either a role id or a
/// deprecated legacy tag. Normalized to an id before anything is persisted.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleRef {
    RoleId(Uuid),
    LegacyRole(LegacyRole),
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ResumeRow {
    pub id: Uuid,
    pub role_id: Uuid,
    pub status: String,
    pub content: String,
    pub source_key: Option<String>,
    pub base_requirement_score: Option<i32>,
    pub commentary: Option<String>,
    pub fitness_score: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl ResumeRow {
    pub fn classifier(&self) -> Option<Classifier> {
        self.fitness_score.map(Classifier::from_fitness_score)
    }
}

/// Fully-assessed resume details. Only produced for rows carrying all three
/// score fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResumeDetails {
    pub id: Uuid,
    pub base_requirement_score: i32,
    pub commentary: String,
    pub fitness_score: i32,
}

impl ResumeDetails {
    pub fn from_row(row: &ResumeRow) -> Option<Self> {
        Some(ResumeDetails {
            id: row.id,
            base_requirement_score: row.base_requirement_score?,
            commentary: row.commentary.clone()?,
            fitness_score: row.fitness_score?,
        })
    }
}

/// Listing payload: lifecycle state plus scores where present.
#[derive(Debug, Clone, Serialize)]
pub struct ResumeSummary {
    pub id: Uuid,
    pub role_id: Uuid,
    pub status: String,
    pub classifier: Option<Classifier>,
    pub base_requirement_score: Option<i32>,
    pub commentary: Option<String>,
    pub fitness_score: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl From<ResumeRow> for ResumeSummary {
    fn from(row: ResumeRow) -> Self {
        ResumeSummary {
            id: row.id,
            role_id: row.role_id,
            classifier: row.classifier(),
            status: row.status,
            base_requirement_score: row.base_requirement_score,
            commentary: row.commentary,
            fitness_score: row.fitness_score,
            created_at: row.created_at,
        }
    }
}

/// Completed resumes grouped by classifier bucket.
#[derive(Debug, Serialize)]
pub struct ListClassifiedResponse {
    pub very_fit: Vec<ResumeDetails>,
    pub fit: Vec<ResumeDetails>,
    pub not_fit: Vec<ResumeDetails>,
}

/// Per-file outcome of a register request.
#[derive(Debug, Serialize)]
pub struct FileRegisterResult {
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub ids: Vec<Uuid>,
    pub results: Vec<FileRegisterResult>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitTextRequest {
    #[serde(flatten)]
    pub role_ref: RoleRef,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct SubmitTextResponse {
    pub id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct ProcessResponse {
    pub ids: Vec<Uuid>,
}
