use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::{Influencer, User};

pub async fn insert_user<'e, E: PgExecutor<'e>>(
    db: E,
    username: &str,
    api_token_hash: &str,
) -> anyhow::Result<User> {
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (username, api_token_hash)
        VALUES ($1, $2)
        RETURNING *
        "#,
    )
    .bind(username)
    .bind(api_token_hash)
    .fetch_one(db)
    .await?;

    Ok(user)
}

/// Look up an active user by the SHA-256 hash of their API token.
pub async fn get_active_user_by_token_hash<'e, E: PgExecutor<'e>>(
    db: E,
    api_token_hash: &str,
) -> anyhow::Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        "SELECT * FROM users WHERE api_token_hash = $1 AND is_active = true",
    )
    .bind(api_token_hash)
    .fetch_optional(db)
    .await?;

    Ok(user)
}

pub async fn insert_influencer<'e, E: PgExecutor<'e>>(
    db: E,
    user_id: Option<Uuid>,
    display_name: &str,
    bio: &str,
) -> anyhow::Result<Influencer> {
    let influencer = sqlx::query_as::<_, Influencer>(
        r#"
        INSERT INTO influencers (user_id, display_name, bio)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(display_name)
    .bind(bio)
    .fetch_one(db)
    .await?;

    Ok(influencer)
}
