//! Wallet ledger: points and funds balances with an append-only entry log.
//!
//! Every balance change goes through [`credit_points`], [`credit_funds`],
//! [`debit_points`] or [`debit_funds`]. Each locks the wallet row, validates
//! the amount, writes the new balances and appends a [`LedgerEntry`] holding
//! both pre-mutation balances. The operations run on a caller-supplied
//! connection so they compose into larger transactions (bet confirmation
//! debits the stake this way); the `deposit` / `grant_bonus` wrappers open and
//! commit their own.

use metrics::counter;
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use thiserror::Error;
use uuid::Uuid;

use crate::db::wallet_repo::{self, NewLedgerEntry};
use crate::errors::AppError;
use crate::models::{LedgerCategory, LedgerEntry, LedgerEntryType, Wallet};

/// Decimal places kept for every balance and ledger amount.
pub const MONEY_SCALE: u32 = 2;

/// Largest value a NUMERIC(18, 2) money column holds: 9999999999999999.99.
pub const MAX_AMOUNT: Decimal =
    Decimal::from_parts(0xA763_FFFF, 0x0DE0_B6B3, 0, false, MONEY_SCALE);

/// Default page size for entry listings.
pub const DEFAULT_ENTRY_LIMIT: i64 = 50;

/// Rejected wallet movement.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LedgerViolation {
    #[error("amount must be greater than zero")]
    NonPositiveAmount,

    #[error("amount {0} has more than 2 decimal places")]
    TooPrecise(Decimal),

    #[error("amount {0} exceeds the maximum of {max}", max = MAX_AMOUNT)]
    TooLarge(Decimal),

    #[error("{category} balance {balance} cannot take a further {requested}")]
    BalanceLimit {
        category: &'static str,
        balance: Decimal,
        requested: Decimal,
    },

    #[error("insufficient {category}: balance {balance}, requested {requested}")]
    InsufficientBalance {
        category: &'static str,
        balance: Decimal,
        requested: Decimal,
    },
}

impl From<LedgerViolation> for AppError {
    fn from(v: LedgerViolation) -> Self {
        AppError::Validation(v.to_string())
    }
}

/// Direction of a wallet movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Credit,
    Debit,
}

/// Reject zero, negative, sub-cent, and oversized amounts.
pub fn validate_amount(amount: Decimal) -> Result<(), LedgerViolation> {
    if amount <= Decimal::ZERO {
        return Err(LedgerViolation::NonPositiveAmount);
    }
    if amount.normalize().scale() > MONEY_SCALE {
        return Err(LedgerViolation::TooPrecise(amount));
    }
    if amount > MAX_AMOUNT {
        return Err(LedgerViolation::TooLarge(amount));
    }
    Ok(())
}

/// Balances after applying a movement, as `(points, funds)`.
fn next_balances(
    wallet: &Wallet,
    category: LedgerCategory,
    direction: Direction,
    amount: Decimal,
) -> Result<(Decimal, Decimal), LedgerViolation> {
    validate_amount(amount)?;

    let current = wallet.balance(category);
    let next = match direction {
        Direction::Credit => current
            .checked_add(amount)
            .filter(|next| *next <= MAX_AMOUNT)
            .ok_or(LedgerViolation::BalanceLimit {
                category: category.unit(),
                balance: current,
                requested: amount,
            })?,
        Direction::Debit => {
            if current < amount {
                return Err(LedgerViolation::InsufficientBalance {
                    category: category.unit(),
                    balance: current,
                    requested: amount,
                });
            }
            current - amount
        }
    };

    Ok(match category {
        LedgerCategory::Points => (next, wallet.funds),
        LedgerCategory::Funds => (wallet.points, next),
    })
}

fn default_description(category: LedgerCategory, direction: Direction, amount: Decimal) -> String {
    let verb = match direction {
        Direction::Credit => "Credit",
        Direction::Debit => "Debit",
    };
    format!("{verb} of {amount} {}", category.unit())
}

async fn apply(
    conn: &mut PgConnection,
    user_id: Uuid,
    category: LedgerCategory,
    direction: Direction,
    amount: Decimal,
    entry_type: LedgerEntryType,
    description: Option<&str>,
) -> Result<(Wallet, LedgerEntry), AppError> {
    validate_amount(amount)?;

    wallet_repo::ensure_wallet(&mut *conn, user_id).await?;
    let wallet = wallet_repo::lock_wallet_by_user(&mut *conn, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("wallet not found".into()))?;

    let (points, funds) = next_balances(&wallet, category, direction, amount)?;
    let signed = match direction {
        Direction::Credit => amount,
        Direction::Debit => -amount,
    };
    let description = description
        .map(str::to_owned)
        .unwrap_or_else(|| default_description(category, direction, amount));

    let updated = wallet_repo::update_balances(&mut *conn, wallet.id, points, funds).await?;
    let entry = wallet_repo::insert_entry(
        &mut *conn,
        &NewLedgerEntry {
            wallet_id: wallet.id,
            entry_type,
            category,
            amount: signed,
            description: &description,
            points_before: wallet.points,
            funds_before: wallet.funds,
        },
    )
    .await?;

    counter!("ledger_entries_total", "type" => entry_type.as_str()).increment(1);
    tracing::info!(
        user_id = %user_id,
        wallet_id = %wallet.id,
        category = %category,
        entry_type = %entry_type,
        amount = %signed,
        "Ledger entry recorded"
    );

    Ok((updated, entry))
}

pub async fn credit_points(
    conn: &mut PgConnection,
    user_id: Uuid,
    amount: Decimal,
    entry_type: LedgerEntryType,
    description: Option<&str>,
) -> Result<(Wallet, LedgerEntry), AppError> {
    apply(conn, user_id, LedgerCategory::Points, Direction::Credit, amount, entry_type, description).await
}

pub async fn credit_funds(
    conn: &mut PgConnection,
    user_id: Uuid,
    amount: Decimal,
    entry_type: LedgerEntryType,
    description: Option<&str>,
) -> Result<(Wallet, LedgerEntry), AppError> {
    apply(conn, user_id, LedgerCategory::Funds, Direction::Credit, amount, entry_type, description).await
}

pub async fn debit_points(
    conn: &mut PgConnection,
    user_id: Uuid,
    amount: Decimal,
    entry_type: LedgerEntryType,
    description: Option<&str>,
) -> Result<(Wallet, LedgerEntry), AppError> {
    apply(conn, user_id, LedgerCategory::Points, Direction::Debit, amount, entry_type, description).await
}

pub async fn debit_funds(
    conn: &mut PgConnection,
    user_id: Uuid,
    amount: Decimal,
    entry_type: LedgerEntryType,
    description: Option<&str>,
) -> Result<(Wallet, LedgerEntry), AppError> {
    apply(conn, user_id, LedgerCategory::Funds, Direction::Debit, amount, entry_type, description).await
}

/// Credit funds as a deposit in a transaction of its own.
pub async fn deposit(
    pool: &PgPool,
    user_id: Uuid,
    amount: Decimal,
    description: Option<&str>,
) -> Result<(Wallet, LedgerEntry), AppError> {
    let mut tx = pool.begin().await?;
    let result = credit_funds(&mut tx, user_id, amount, LedgerEntryType::Deposit, description).await?;
    tx.commit().await?;
    Ok(result)
}

/// Credit bonus points in a transaction of its own.
pub async fn grant_bonus(
    pool: &PgPool,
    user_id: Uuid,
    amount: Decimal,
    description: Option<&str>,
) -> Result<(Wallet, LedgerEntry), AppError> {
    let mut tx = pool.begin().await?;
    let result = credit_points(&mut tx, user_id, amount, LedgerEntryType::Bonus, description).await?;
    tx.commit().await?;
    Ok(result)
}

/// The user's wallet, created on first access if it does not exist yet.
pub async fn wallet_for(pool: &PgPool, user_id: Uuid) -> Result<Wallet, AppError> {
    if let Some(wallet) = wallet_repo::get_wallet_by_user(pool, user_id).await? {
        return Ok(wallet);
    }
    wallet_repo::ensure_wallet(pool, user_id).await?;
    wallet_repo::get_wallet_by_user(pool, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("wallet not found".into()))
}

/// Most recent ledger entries for a user's wallet.
pub async fn list_entries(
    pool: &PgPool,
    user_id: Uuid,
    limit: i64,
) -> Result<Vec<LedgerEntry>, AppError> {
    let wallet = wallet_for(pool, user_id).await?;
    let limit = limit.clamp(1, 500);
    Ok(wallet_repo::list_entries(pool, wallet.id, limit).await?)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
