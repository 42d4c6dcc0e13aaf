use sha2::{Digest, Sha256};
use sqlx::PgPool;

use crate::db::{user_repo, wallet_repo};
use crate::errors::AppError;
use crate::models::User;

/// Hex-encoded SHA-256 of an API token. Only the hash is ever stored.
pub fn hash_token(token: &str) -> String {
    Sha256::digest(token.as_bytes())
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// Create a user together with their wallet. Both rows commit or neither does,
/// so every user has exactly one wallet from the moment they exist.
pub async fn create_user(pool: &PgPool, username: &str, api_token: &str) -> Result<User, AppError> {
    let username = username.trim();
    if username.is_empty() {
        return Err(AppError::Validation("username must not be empty".into()));
    }
    if api_token.len() < 16 {
        return Err(AppError::Validation(
            "api token must be at least 16 characters".into(),
        ));
    }

    let mut tx = pool.begin().await?;
    let user = user_repo::insert_user(&mut *tx, username, &hash_token(api_token)).await?;
    wallet_repo::insert_wallet(&mut *tx, user.id).await?;
    tx.commit().await?;

    tracing::info!(user_id = %user.id, username = %user.username, "User created");
    Ok(user)
}

/// Resolve a bearer token to an active user.
pub async fn authenticate(pool: &PgPool, api_token: &str) -> Result<User, AppError> {
    if api_token.is_empty() {
        return Err(AppError::Unauthorized);
    }
    user_repo::get_active_user_by_token_hash(pool, &hash_token(api_token))
        .await?
        .ok_or(AppError::Unauthorized)
}
