use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RoleRow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RoleDetails {
    pub id: Uuid,
    pub name: String,
    pub description: String,
}

impl From<RoleRow> for RoleDetails {
    fn from(row: RoleRow) -> Self {
        RoleDetails {
            id: row.id,
            name: row.name,
            description: row.description,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RoleRegisterResponse {
    pub id: Uuid,
}
