use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Database row for users table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub api_token_hash: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// A content creator who may curate cartela templates.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Influencer {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub display_name: String,
    pub bio: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}
