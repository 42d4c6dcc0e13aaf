use rust_decimal::Decimal;
use sqlx::PgExecutor;
use uuid::Uuid;

use crate::models::RiskExposureMetrics;

/// Create the aggregate row for a bucket with zero sums if it is missing.
pub async fn ensure_bucket<'e, E: PgExecutor<'e>>(
    db: E,
    event_id: Uuid,
    template_id: Uuid,
    influencer_id: Option<Uuid>,
) -> anyhow::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO risk_exposure_metrics (event_id, cartela_template_id, influencer_id)
        VALUES ($1, $2, $3)
        ON CONFLICT DO NOTHING
        "#,
    )
    .bind(event_id)
    .bind(template_id)
    .bind(influencer_id)
    .execute(db)
    .await?;

    Ok(())
}

/// Fetch a bucket holding its row lock until the transaction ends.
pub async fn lock_bucket<'e, E: PgExecutor<'e>>(
    db: E,
    event_id: Uuid,
    template_id: Uuid,
    influencer_id: Option<Uuid>,
) -> anyhow::Result<Option<RiskExposureMetrics>> {
    let row = sqlx::query_as::<_, RiskExposureMetrics>(
        r#"
        SELECT * FROM risk_exposure_metrics
        WHERE event_id = $1
          AND cartela_template_id = $2
          AND influencer_id IS NOT DISTINCT FROM $3
        FOR UPDATE
        "#,
    )
    .bind(event_id)
    .bind(template_id)
    .bind(influencer_id)
    .fetch_optional(db)
    .await?;

    Ok(row)
}

/// Unlocked read. Quoting goes through [`lock_bucket`]; the integration tests
/// use this to inspect bucket totals.
pub async fn get_bucket<'e, E: PgExecutor<'e>>(
    db: E,
    event_id: Uuid,
    template_id: Uuid,
    influencer_id: Option<Uuid>,
) -> anyhow::Result<Option<RiskExposureMetrics>> {
    let row = sqlx::query_as::<_, RiskExposureMetrics>(
        r#"
        SELECT * FROM risk_exposure_metrics
        WHERE event_id = $1
          AND cartela_template_id = $2
          AND influencer_id IS NOT DISTINCT FROM $3
        "#,
    )
    .bind(event_id)
    .bind(template_id)
    .bind(influencer_id)
    .fetch_optional(db)
    .await?;

    Ok(row)
}

/// Add signed deltas to a bucket's sums, flooring each at zero.
pub async fn apply_delta<'e, E: PgExecutor<'e>>(
    db: E,
    bucket_id: Uuid,
    volume_delta: Decimal,
    payout_delta: Decimal,
) -> anyhow::Result<RiskExposureMetrics> {
    let row = sqlx::query_as::<_, RiskExposureMetrics>(
        r#"
        UPDATE risk_exposure_metrics
        SET volume_total = GREATEST(volume_total + $2, 0),
            payout_maximo = GREATEST(payout_maximo + $3, 0),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(bucket_id)
    .bind(volume_delta)
    .bind(payout_delta)
    .fetch_one(db)
    .await?;

    Ok(row)
}
