use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::resume::{ResumeRow, Status};
use crate::models::role::RoleRow;
use crate::repo::{RepoError, ResumeFilter, ResumeStore, RoleStore};

#[derive(Clone)]
pub struct PgResumeStore {
    pool: PgPool,
}

impl PgResumeStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ResumeStore for PgResumeStore {
    async fn select_by_filters(&self, filter: &ResumeFilter) -> Result<Vec<ResumeRow>, RepoError> {
        let (min_score, max_score) = filter
            .classifier
            .map(|c| c.score_bounds())
            .unwrap_or((None, None));

        let rows = sqlx::query_as::<_, ResumeRow>(
            r#"
            SELECT * FROM resumes
            WHERE ($1::uuid IS NULL OR role_id = $1)
              AND ($2::text IS NULL OR status = $2)
              AND ($3::int4 IS NULL OR fitness_score >= $3)
              AND ($4::int4 IS NULL OR fitness_score < $4)
            ORDER BY created_at ASC
            LIMIT $5
            "#,
        )
        .bind(filter.role_id)
        .bind(filter.status.map(|s| s.as_str()))
        .bind(min_score)
        .bind(max_score)
        .bind(filter.limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    async fn get(&self, id: Uuid) -> Result<Option<ResumeRow>, RepoError> {
        let row = sqlx::query_as::<_, ResumeRow>("SELECT * FROM resumes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn insert(
        &self,
        role_id: Uuid,
        status: Status,
        content: &str,
        source_key: Option<&str>,
    ) -> Result<Uuid, RepoError> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO resumes (id, role_id, status, content, source_key)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(id)
        .bind(role_id)
        .bind(status.as_str())
        .bind(content)
        .bind(source_key)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn reserve_pending(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, RepoError> {
        let reserved: Vec<Uuid> = sqlx::query_scalar(
            r#"
            UPDATE resumes
            SET status = $1
            WHERE id = ANY($2) AND status = $3
            RETURNING id
            "#,
        )
        .bind(Status::InProgress.as_str())
        .bind(ids)
        .bind(Status::Pending.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(reserved)
    }

    async fn complete_with_scores(
        &self,
        id: Uuid,
        base_requirement_score: i32,
        commentary: &str,
        fitness_score: i32,
    ) -> Result<(), RepoError> {
        let result = sqlx::query(
            r#"
            UPDATE resumes
            SET status = $2,
                base_requirement_score = $3,
                commentary = $4,
                fitness_score = $5
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(Status::Complete.as_str())
        .bind(base_requirement_score)
        .bind(commentary)
        .bind(fitness_score)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepoError::Store(format!("resume {id} not found")));
        }
        Ok(())
    }

    async fn update_status(&self, id: Uuid, status: Status) -> Result<(), RepoError> {
        let result = sqlx::query("UPDATE resumes SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepoError::Store(format!("resume {id} not found")));
        }
        Ok(())
    }

    async fn bulk_update_status(&self, ids: &[Uuid], status: Status) -> Result<(), RepoError> {
        if ids.is_empty() {
            return Ok(());
        }
        sqlx::query("UPDATE resumes SET status = $2 WHERE id = ANY($1)")
            .bind(ids)
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

#[derive(Clone)]
pub struct PgRoleStore {
    pool: PgPool,
}

impl PgRoleStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleStore for PgRoleStore {
    async fn insert(&self, name: &str, description: &str) -> Result<Uuid, RepoError> {
        let id = Uuid::new_v4();
        sqlx::query("INSERT INTO roles (id, name, description) VALUES ($1, $2, $3)")
            .bind(id)
            .bind(name)
            .bind(description)
            .execute(&self.pool)
            .await?;
        Ok(id)
    }

    async fn get(&self, id: Uuid) -> Result<Option<RoleRow>, RepoError> {
        let row = sqlx::query_as::<_, RoleRow>("SELECT * FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<RoleRow>, RepoError> {
        let row = sqlx::query_as::<_, RoleRow>(
            "SELECT * FROM roles WHERE name = $1 ORDER BY created_at ASC LIMIT 1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn list(&self) -> Result<Vec<RoleRow>, RepoError> {
        let rows = sqlx::query_as::<_, RoleRow>("SELECT * FROM roles ORDER BY created_at ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
