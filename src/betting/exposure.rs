//! Running exposure per (event, template, influencer) bucket.
//!
//! All functions run on the caller's connection so the bucket update commits
//! or rolls back with the quote or cancellation that caused it.

use anyhow::anyhow;
use rust_decimal::Decimal;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::db::risk_repo;
use crate::models::RiskExposureMetrics;

/// Get-or-create the bucket and hold its row lock for the rest of the
/// transaction.
pub async fn lock_exposure(
    conn: &mut PgConnection,
    event_id: Uuid,
    template_id: Uuid,
    influencer_id: Option<Uuid>,
) -> anyhow::Result<RiskExposureMetrics> {
    risk_repo::ensure_bucket(&mut *conn, event_id, template_id, influencer_id).await?;
    risk_repo::lock_bucket(&mut *conn, event_id, template_id, influencer_id)
        .await?
        .ok_or_else(|| anyhow!("exposure bucket for event {event_id} vanished after insert"))
}

pub async fn record_exposure(
    conn: &mut PgConnection,
    event_id: Uuid,
    template_id: Uuid,
    influencer_id: Option<Uuid>,
    stake: Decimal,
    potential_return: Decimal,
) -> anyhow::Result<RiskExposureMetrics> {
    let bucket = lock_exposure(&mut *conn, event_id, template_id, influencer_id).await?;
    let updated = risk_repo::apply_delta(&mut *conn, bucket.id, stake, potential_return).await?;

    tracing::debug!(
        event_id = %event_id,
        template_id = %template_id,
        volume_total = %updated.volume_total,
        payout_maximo = %updated.payout_maximo,
        "Exposure recorded"
    );
    Ok(updated)
}

/// Subtract a withdrawn quote from its bucket. Sums never go below zero.
pub async fn release_exposure(
    conn: &mut PgConnection,
    event_id: Uuid,
    template_id: Uuid,
    influencer_id: Option<Uuid>,
    stake: Decimal,
    potential_return: Decimal,
) -> anyhow::Result<RiskExposureMetrics> {
    let bucket = lock_exposure(&mut *conn, event_id, template_id, influencer_id).await?;
    let updated = risk_repo::apply_delta(&mut *conn, bucket.id, -stake, -potential_return).await?;

    tracing::debug!(
        event_id = %event_id,
        template_id = %template_id,
        volume_total = %updated.volume_total,
        payout_maximo = %updated.payout_maximo,
        "Exposure released"
    );
    Ok(updated)
}
