use rust_decimal::Decimal;
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::{LedgerCategory, LedgerEntry, LedgerEntryType, Wallet};

/// Fields of a ledger entry to append.
#[derive(Debug, Clone)]
pub struct NewLedgerEntry<'a> {
    pub wallet_id: Uuid,
    pub entry_type: LedgerEntryType,
    pub category: LedgerCategory,
    pub amount: Decimal,
    pub description: &'a str,
    pub points_before: Decimal,
    pub funds_before: Decimal,
}

pub async fn insert_wallet<'e, E: PgExecutor<'e>>(db: E, user_id: Uuid) -> anyhow::Result<Wallet> {
    let wallet = sqlx::query_as::<_, Wallet>(
        "INSERT INTO wallets (user_id) VALUES ($1) RETURNING *",
    )
    .bind(user_id)
    .fetch_one(db)
    .await?;

    Ok(wallet)
}

/// Create the wallet if the user has none yet. No-op otherwise.
pub async fn ensure_wallet<'e, E: PgExecutor<'e>>(db: E, user_id: Uuid) -> anyhow::Result<()> {
    sqlx::query("INSERT INTO wallets (user_id) VALUES ($1) ON CONFLICT (user_id) DO NOTHING")
        .bind(user_id)
        .execute(db)
        .await?;

    Ok(())
}

pub async fn get_wallet_by_user<'e, E: PgExecutor<'e>>(
    db: E,
    user_id: Uuid,
) -> anyhow::Result<Option<Wallet>> {
    let wallet = sqlx::query_as::<_, Wallet>("SELECT * FROM wallets WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(db)
        .await?;

    Ok(wallet)
}

/// Fetch the user's wallet holding a row lock until the transaction ends.
pub async fn lock_wallet_by_user<'e, E: PgExecutor<'e>>(
    db: E,
    user_id: Uuid,
) -> anyhow::Result<Option<Wallet>> {
    let wallet = sqlx::query_as::<_, Wallet>(
        "SELECT * FROM wallets WHERE user_id = $1 FOR UPDATE",
    )
    .bind(user_id)
    .fetch_optional(db)
    .await?;

    Ok(wallet)
}

pub async fn update_balances<'e, E: PgExecutor<'e>>(
    db: E,
    wallet_id: Uuid,
    points: Decimal,
    funds: Decimal,
) -> anyhow::Result<Wallet> {
    let wallet = sqlx::query_as::<_, Wallet>(
        r#"
        UPDATE wallets
        SET points = $2, funds = $3, updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(wallet_id)
    .bind(points)
    .bind(funds)
    .fetch_one(db)
    .await?;

    Ok(wallet)
}

pub async fn insert_entry<'e, E: PgExecutor<'e>>(
    db: E,
    entry: &NewLedgerEntry<'_>,
) -> anyhow::Result<LedgerEntry> {
    let row = sqlx::query_as::<_, LedgerEntry>(
        r#"
        INSERT INTO ledger_entries
            (wallet_id, entry_type, category, amount, description, points_before, funds_before, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, clock_timestamp())
        RETURNING *
        "#,
    )
    .bind(entry.wallet_id)
    .bind(entry.entry_type.as_str())
    .bind(entry.category.as_str())
    .bind(entry.amount)
    .bind(entry.description)
    .bind(entry.points_before)
    .bind(entry.funds_before)
    .fetch_one(db)
    .await?;

    Ok(row)
}

/// Most recent entries first.
pub async fn list_entries<'e, E: PgExecutor<'e>>(
    db: E,
    wallet_id: Uuid,
    limit: i64,
) -> anyhow::Result<Vec<LedgerEntry>> {
    let entries = sqlx::query_as::<_, LedgerEntry>(
        r#"
        SELECT * FROM ledger_entries
        WHERE wallet_id = $1
        ORDER BY created_at DESC, id DESC
        LIMIT $2
        "#,
    )
    .bind(wallet_id)
    .bind(limit)
    .fetch_all(db)
    .await?;

    Ok(entries)
}
