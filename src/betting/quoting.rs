use std::time::Instant;

use chrono::{DateTime, Duration, Utc};
use metrics::{counter, histogram};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use super::exposure;
use super::pricing::{self, QuoteRejection};
use super::risk_policy::{self, QuoteContext, RiskFlags, RiskPolicy};
use crate::db::cartela_repo::{self, NewInstance};
use crate::db::{event_repo, template_repo};
use crate::errors::AppError;
use crate::models::{CartelaInstance, CartelaStatus, QuoteSnapshot};

#[derive(Debug, Clone, Deserialize)]
pub struct QuoteRequest {
    pub event_id: Uuid,
    #[serde(alias = "template_id")]
    pub cartela_template_id: Uuid,
    pub selection_ids: Vec<Uuid>,
    pub stake: Decimal,
}

#[derive(Debug, Clone)]
pub struct QuoteOutcome {
    pub instance: CartelaInstance,
    pub odd_final: Decimal,
    pub potential_return: Decimal,
    pub valid_until: DateTime<Utc>,
    pub risk_flags: RiskFlags,
}

/// Price a cartela and persist it as a pending instance valid for `validity`.
///
/// The instance, its items, the odds snapshot and the exposure update are
/// written in one transaction. Any rejection leaves the store untouched.
pub async fn quote(
    pool: &PgPool,
    policy: &dyn RiskPolicy,
    validity: Duration,
    user_id: Uuid,
    req: &QuoteRequest,
) -> Result<QuoteOutcome, AppError> {
    let started = Instant::now();
    let result = price_and_store(pool, policy, validity, user_id, req).await;
    histogram!("quote_latency_seconds").record(started.elapsed().as_secs_f64());

    match &result {
        Ok(outcome) => {
            counter!("quotes_created_total").increment(1);
            tracing::info!(
                cartela_id = %outcome.instance.id,
                user_id = %user_id,
                event_id = %req.event_id,
                odd_final = %outcome.odd_final,
                premio_maximo = %outcome.potential_return,
                limited = outcome.risk_flags.limited,
                "Cartela quoted"
            );
        }
        Err(e) => {
            counter!("quotes_rejected_total", "reason" => e.kind()).increment(1);
            tracing::warn!(user_id = %user_id, event_id = %req.event_id, error = %e, "Quote rejected");
        }
    }

    result
}

async fn price_and_store(
    pool: &PgPool,
    policy: &dyn RiskPolicy,
    validity: Duration,
    user_id: Uuid,
    req: &QuoteRequest,
) -> Result<QuoteOutcome, AppError> {
    if req.selection_ids.is_empty() {
        return Err(QuoteRejection::NoSelections.into());
    }
    pricing::validate_stake(req.stake)?;

    let mut tx = pool.begin().await?;

    let event = event_repo::get_event(&mut *tx, req.event_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("event {} not found", req.event_id)))?;
    let template = template_repo::get_active_template(&mut *tx, req.cartela_template_id)
        .await?
        .ok_or_else(|| {
            AppError::NotFound(format!("cartela template {} not found", req.cartela_template_id))
        })?;

    let selections =
        event_repo::get_selections_by_ids(&mut *tx, event.id, &req.selection_ids).await?;
    pricing::check_selection_set(&req.selection_ids, &selections)?;
    let bounds = template.item_bounds().map_err(QuoteRejection::from)?;
    pricing::check_item_bounds(selections.len(), bounds)?;
    let allowed = template_repo::get_template_items(&mut *tx, template.id).await?;
    pricing::check_allowed_types(&selections, &allowed)?;

    let odd_raw = pricing::combined_odd(selections.iter().map(|s| s.odd_published))?;
    let return_raw = pricing::potential_return(req.stake, odd_raw)?;

    let bucket =
        exposure::lock_exposure(&mut tx, event.id, template.id, template.influencer_id).await?;
    let ctx = QuoteContext {
        user_id,
        event_id: event.id,
        template_id: template.id,
        influencer_id: template.influencer_id,
        selection_count: selections.len(),
        stake: req.stake,
        odd_final: odd_raw,
        potential_return: return_raw,
        exposure_volume: bucket.volume_total,
        exposure_payout: bucket.payout_maximo,
    };
    let decision = policy.evaluate(&ctx);
    let priced = risk_policy::apply_decision(decision, &ctx)?;
    pricing::next_exposure(
        bucket.volume_total,
        bucket.payout_maximo,
        req.stake,
        priced.potential_return,
    )?;

    let created_at = Utc::now();
    let valid_until = created_at + validity;
    let snapshot = QuoteSnapshot {
        selection_ids: req.selection_ids.clone(),
        odd_final_raw: odd_raw,
        stake: req.stake.to_string(),
        influencer_id: template.influencer_id,
    };
    let snapshot_data = serde_json::to_value(&snapshot).map_err(anyhow::Error::from)?;

    let instance = cartela_repo::insert_instance(
        &mut *tx,
        &NewInstance {
            user_id,
            event_id: event.id,
            cartela_template_id: template.id,
            status: CartelaStatus::ApostaPendente,
            odd_final: priced.odd_final,
            premio_maximo: priced.potential_return,
            stake: req.stake,
            snapshot_data,
            created_at,
            valid_until,
        },
    )
    .await?;

    for selection in &selections {
        cartela_repo::insert_item(&mut *tx, instance.id, selection.id, selection.odd_published)
            .await?;
    }

    let odds_data = json!({
        "policy": policy.name(),
        "risk_flags": priced.risk_flags,
        "odd_final_raw": odd_raw,
        "odd_final": priced.odd_final,
        "selections": selections
            .iter()
            .map(|s| json!({
                "id": s.id,
                "selection_type": s.selection_type,
                "prob_base": s.prob_base,
                "odd_fair": s.odd_fair,
                "odd_published": s.odd_published,
            }))
            .collect::<Vec<_>>(),
    });
    cartela_repo::insert_odds_snapshot(&mut *tx, instance.id, &odds_data).await?;

    exposure::record_exposure(
        &mut tx,
        event.id,
        template.id,
        template.influencer_id,
        req.stake,
        priced.potential_return,
    )
    .await?;

    tx.commit().await?;

    Ok(QuoteOutcome {
        instance,
        odd_final: priced.odd_final,
        potential_return: priced.potential_return,
        valid_until,
        risk_flags: priced.risk_flags,
    })
}
