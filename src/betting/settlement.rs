//! Turning a pending cartela into a bet, or withdrawing it.

use chrono::{DateTime, Utc};
use metrics::counter;
use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use super::exposure;
use crate::db::{bet_repo, cartela_repo, template_repo};
use crate::errors::AppError;
use crate::ledger;
use crate::models::{Bet, CartelaInstance, CartelaStatus, LedgerEntryType, QuoteSnapshot};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SettlementRejection {
    #[error("cartela is not awaiting confirmation (status {0})")]
    NotPending(String),

    #[error("quote expired at {0}; request a new cartela")]
    Expired(DateTime<Utc>),

    #[error("stake must be greater than zero")]
    NonPositiveStake,

    #[error("cartela has no price")]
    Unpriced,

    #[error("cartela cannot be cancelled in status {0}")]
    NotCancellable(String),
}

impl From<SettlementRejection> for AppError {
    fn from(r: SettlementRejection) -> Self {
        AppError::Validation(r.to_string())
    }
}

/// Checks an instance can be confirmed at `now`; returns its
/// `(odd_final, premio_maximo)`.
pub fn check_confirmable(
    instance: &CartelaInstance,
    now: DateTime<Utc>,
) -> Result<(Decimal, Decimal), SettlementRejection> {
    match instance.status() {
        Some(status) if status.can_transition_to(CartelaStatus::ApostaConfirmada) => {}
        _ => return Err(SettlementRejection::NotPending(instance.status.clone())),
    }
    if instance.is_expired_at(now) {
        return Err(SettlementRejection::Expired(instance.valid_until));
    }
    if instance.stake <= Decimal::ZERO {
        return Err(SettlementRejection::NonPositiveStake);
    }
    match (instance.odd_final, instance.premio_maximo) {
        (Some(odd), Some(premio)) => Ok((odd, premio)),
        _ => Err(SettlementRejection::Unpriced),
    }
}

/// Confirm the caller's pending cartela: debit the stake from funds, write the
/// bet and lock the instance, all in one transaction.
pub async fn confirm(pool: &PgPool, user_id: Uuid, cartela_id: Uuid) -> Result<Bet, AppError> {
    let mut tx = pool.begin().await?;

    let instance = cartela_repo::lock_instance_for_user(&mut *tx, cartela_id, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("cartela {cartela_id} not found")))?;

    let now = Utc::now();
    let (odd_final, potential_return) = check_confirmable(&instance, now)?;

    let description = format!("Wager on cartela {cartela_id}");
    ledger::debit_funds(
        &mut tx,
        user_id,
        instance.stake,
        LedgerEntryType::Wager,
        Some(&description),
    )
    .await?;

    let bet =
        bet_repo::insert_bet(&mut *tx, instance.id, instance.stake, odd_final, potential_return)
            .await?;
    cartela_repo::mark_confirmed(&mut *tx, instance.id, now)
        .await?
        .ok_or_else(|| SettlementRejection::NotPending(instance.status.clone()))?;

    tx.commit().await?;

    counter!("bets_confirmed_total").increment(1);
    tracing::info!(
        bet_id = %bet.id,
        cartela_id = %cartela_id,
        user_id = %user_id,
        stake = %bet.stake,
        potential_return = %bet.potential_return,
        "Bet confirmed"
    );

    Ok(bet)
}

/// Withdraw a cartela that has not been confirmed yet and release its
/// exposure.
pub async fn cancel(
    pool: &PgPool,
    user_id: Uuid,
    cartela_id: Uuid,
) -> Result<CartelaInstance, AppError> {
    let mut tx = pool.begin().await?;

    let instance = cartela_repo::lock_instance_for_user(&mut *tx, cartela_id, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("cartela {cartela_id} not found")))?;

    match instance.status() {
        Some(status)
            if status.is_user_cancellable()
                && status.can_transition_to(CartelaStatus::Cancelada) => {}
        _ => return Err(SettlementRejection::NotCancellable(instance.status.clone()).into()),
    }

    let influencer_id = match serde_json::from_value::<QuoteSnapshot>(instance.snapshot_data.clone())
    {
        Ok(snapshot) => snapshot.influencer_id,
        Err(_) => template_repo::get_template(&mut *tx, instance.cartela_template_id)
            .await?
            .and_then(|t| t.influencer_id),
    };

    exposure::release_exposure(
        &mut tx,
        instance.event_id,
        instance.cartela_template_id,
        influencer_id,
        instance.stake,
        instance.premio_maximo.unwrap_or(Decimal::ZERO),
    )
    .await?;
    let cancelled = cartela_repo::mark_cancelled(&mut *tx, instance.id)
        .await?
        .ok_or_else(|| SettlementRejection::NotCancellable(instance.status.clone()))?;

    tx.commit().await?;

    counter!("cartelas_cancelled_total").increment(1);
    tracing::info!(cartela_id = %cartela_id, user_id = %user_id, "Cartela cancelled");

    Ok(cancelled)
}
