use std::sync::Arc;

use crate::assessment::client::Assessor;
use crate::config::Config;
use crate::repo::{ResumeStore, RoleStore};
use crate::storage::ObjectStore;

/// Shared application state injected into all route handlers via Axum
/// extractors. The trait-object seams keep handlers and the scheduler
/// independent of the concrete Postgres/S3/Anthropic backends.
#[derive(Clone)]
pub struct AppState {
    pub resumes: Arc<dyn ResumeStore>,
    pub roles: Arc<dyn RoleStore>,
    pub storage: Arc<dyn ObjectStore>,
    pub assessor: Arc<dyn Assessor>,
    pub config: Config,
}
