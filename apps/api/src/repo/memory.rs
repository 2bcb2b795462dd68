//! In-memory store implementations for pipeline tests, with injectable
//! failures. Semantics mirror the Postgres implementations: reservations are
//! conditional on `pending`, bulk transitions are all-or-nothing, and
//! completion writes scores and status together.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::DateTime;
use uuid::Uuid;

use crate::models::resume::{ResumeRow, Status};
use crate::models::role::RoleRow;
use crate::repo::{RepoError, ResumeFilter, ResumeStore, RoleStore};

#[derive(Default)]
pub struct MemoryResumeStore {
    rows: Mutex<HashMap<Uuid, ResumeRow>>,
    clock: AtomicI64,
    pub fail_reserve: AtomicBool,
    pub fail_complete: AtomicBool,
}

impl MemoryResumeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn row(&self, id: Uuid) -> ResumeRow {
        self.rows
            .lock()
            .unwrap()
            .get(&id)
            .cloned()
            .expect("row exists")
    }

    pub fn status_of(&self, id: Uuid) -> Status {
        self.row(id).status.parse().expect("valid status")
    }
}

#[async_trait]
impl ResumeStore for MemoryResumeStore {
    async fn select_by_filters(&self, filter: &ResumeFilter) -> Result<Vec<ResumeRow>, RepoError> {
        let (min_score, max_score) = filter
            .classifier
            .map(|c| c.score_bounds())
            .unwrap_or((None, None));

        let rows = self.rows.lock().unwrap();
        let mut matched: Vec<ResumeRow> = rows
            .values()
            .filter(|r| filter.role_id.map_or(true, |id| r.role_id == id))
            .filter(|r| filter.status.map_or(true, |s| r.status == s.as_str()))
            .filter(|r| min_score.map_or(true, |min| r.fitness_score.is_some_and(|f| f >= min)))
            .filter(|r| max_score.map_or(true, |max| r.fitness_score.is_some_and(|f| f < max)))
            .cloned()
            .collect();
        matched.sort_by_key(|r| r.created_at);
        matched.truncate(filter.limit.max(0) as usize);
        Ok(matched)
    }

    async fn get(&self, id: Uuid) -> Result<Option<ResumeRow>, RepoError> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    async fn insert(
        &self,
        role_id: Uuid,
        status: Status,
        content: &str,
        source_key: Option<&str>,
    ) -> Result<Uuid, RepoError> {
        let id = Uuid::new_v4();
        let tick = self.clock.fetch_add(1, Ordering::SeqCst);
        let row = ResumeRow {
            id,
            role_id,
            status: status.as_str().to_string(),
            content: content.to_string(),
            source_key: source_key.map(String::from),
            base_requirement_score: None,
            commentary: None,
            fitness_score: None,
            created_at: DateTime::from_timestamp(tick, 0).expect("valid timestamp"),
        };
        self.rows.lock().unwrap().insert(id, row);
        Ok(id)
    }

    async fn reserve_pending(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, RepoError> {
        if self.fail_reserve.load(Ordering::SeqCst) {
            return Err(RepoError::Store("injected reserve failure".to_string()));
        }
        let mut rows = self.rows.lock().unwrap();
        let mut reserved = Vec::new();
        for id in ids {
            if let Some(row) = rows.get_mut(id) {
                if row.status == Status::Pending.as_str() {
                    row.status = Status::InProgress.as_str().to_string();
                    reserved.push(*id);
                }
            }
        }
        Ok(reserved)
    }

    async fn complete_with_scores(
        &self,
        id: Uuid,
        base_requirement_score: i32,
        commentary: &str,
        fitness_score: i32,
    ) -> Result<(), RepoError> {
        if self.fail_complete.load(Ordering::SeqCst) {
            return Err(RepoError::Store("injected completion failure".to_string()));
        }
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .get_mut(&id)
            .ok_or_else(|| RepoError::Store(format!("resume {id} not found")))?;
        row.status = Status::Complete.as_str().to_string();
        row.base_requirement_score = Some(base_requirement_score);
        row.commentary = Some(commentary.to_string());
        row.fitness_score = Some(fitness_score);
        Ok(())
    }

    async fn update_status(&self, id: Uuid, status: Status) -> Result<(), RepoError> {
        let mut rows = self.rows.lock().unwrap();
        let row = rows
            .get_mut(&id)
            .ok_or_else(|| RepoError::Store(format!("resume {id} not found")))?;
        row.status = status.as_str().to_string();
        Ok(())
    }

    async fn bulk_update_status(&self, ids: &[Uuid], status: Status) -> Result<(), RepoError> {
        let mut rows = self.rows.lock().unwrap();
        for id in ids {
            if let Some(row) = rows.get_mut(id) {
                row.status = status.as_str().to_string();
            }
        }
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryRoleStore {
    rows: Mutex<HashMap<Uuid, RoleRow>>,
}

impl MemoryRoleStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RoleStore for MemoryRoleStore {
    async fn insert(&self, name: &str, description: &str) -> Result<Uuid, RepoError> {
        let id = Uuid::new_v4();
        let row = RoleRow {
            id,
            name: name.to_string(),
            description: description.to_string(),
            created_at: DateTime::from_timestamp(0, 0).expect("valid timestamp"),
        };
        self.rows.lock().unwrap().insert(id, row);
        Ok(id)
    }

    async fn get(&self, id: Uuid) -> Result<Option<RoleRow>, RepoError> {
        Ok(self.rows.lock().unwrap().get(&id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<RoleRow>, RepoError> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .find(|r| r.name == name)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<RoleRow>, RepoError> {
        let mut roles: Vec<RoleRow> = self.rows.lock().unwrap().values().cloned().collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }
}
