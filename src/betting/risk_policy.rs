use std::sync::Arc;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::pricing::{self, QuoteRejection};
use crate::config::AppConfig;

/// Everything a policy may look at when judging a priced quote.
#[derive(Debug, Clone)]
pub struct QuoteContext {
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub template_id: Uuid,
    pub influencer_id: Option<Uuid>,
    pub selection_count: usize,
    pub stake: Decimal,
    pub odd_final: Decimal,
    pub potential_return: Decimal,
    /// Bucket sums before this quote is added.
    pub exposure_volume: Decimal,
    pub exposure_payout: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RiskDecision {
    Allow,
    Deny(String),
    Adjust { odd_final: Decimal, margin: f64 },
}

/// Returned to the client with every quote.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskFlags {
    pub limited: bool,
    pub adjusted_margin: f64,
}

impl Default for RiskFlags {
    fn default() -> Self {
        Self {
            limited: false,
            adjusted_margin: 0.0,
        }
    }
}

pub trait RiskPolicy: Send + Sync {
    fn name(&self) -> &'static str;
    fn evaluate(&self, ctx: &QuoteContext) -> RiskDecision;
}

/// Accepts every quote unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassThroughPolicy;

impl RiskPolicy for PassThroughPolicy {
    fn name(&self) -> &'static str {
        "pass_through"
    }

    fn evaluate(&self, _ctx: &QuoteContext) -> RiskDecision {
        RiskDecision::Allow
    }
}

/// Caps the stake of a single quote and the payout accumulated per exposure
/// bucket. A quote that would overflow the payout cap is re-priced down to the
/// remaining headroom; if that would take the odd below 1 it is denied.
#[derive(Debug, Clone, Default)]
pub struct ExposureLimitPolicy {
    pub max_stake: Option<Decimal>,
    pub max_payout_per_bucket: Option<Decimal>,
}

impl RiskPolicy for ExposureLimitPolicy {
    fn name(&self) -> &'static str {
        "exposure_limit"
    }

    fn evaluate(&self, ctx: &QuoteContext) -> RiskDecision {
        if let Some(max) = self.max_stake {
            if ctx.stake > max {
                return RiskDecision::Deny(format!("stake {} exceeds limit {max}", ctx.stake));
            }
        }

        let Some(max_payout) = self.max_payout_per_bucket else {
            return RiskDecision::Allow;
        };
        match ctx.exposure_payout.checked_add(ctx.potential_return) {
            Some(total) if total <= max_payout => return RiskDecision::Allow,
            Some(_) => {}
            None => {
                return RiskDecision::Deny(format!(
                    "payout exposure {} cannot absorb {}",
                    ctx.exposure_payout, ctx.potential_return
                ))
            }
        }

        let capped = max_payout
            .checked_sub(ctx.exposure_payout)
            .and_then(|headroom| headroom.checked_div(ctx.stake))
            .map(|odd| odd.round_dp_with_strategy(4, RoundingStrategy::ToZero));
        let capped = match capped {
            Some(odd) if odd >= Decimal::ONE => odd,
            _ => {
                return RiskDecision::Deny(format!(
                    "payout exposure {} already at limit {max_payout}",
                    ctx.exposure_payout
                ))
            }
        };

        let margin = capped
            .checked_div(ctx.odd_final)
            .and_then(|ratio| (Decimal::ONE - ratio).to_f64())
            .unwrap_or(0.0);
        RiskDecision::Adjust {
            odd_final: capped.normalize(),
            margin,
        }
    }
}

/// Exposure limits when any are configured, otherwise pass-through.
pub fn from_config(config: &AppConfig) -> Arc<dyn RiskPolicy> {
    if config.has_risk_limits() {
        Arc::new(ExposureLimitPolicy {
            max_stake: config.risk_max_stake,
            max_payout_per_bucket: config.risk_max_payout_per_bucket,
        })
    } else {
        Arc::new(PassThroughPolicy)
    }
}

/// Final price of a quote after the policy has spoken.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedQuote {
    pub odd_final: Decimal,
    pub potential_return: Decimal,
    pub risk_flags: RiskFlags,
}

pub fn apply_decision(
    decision: RiskDecision,
    ctx: &QuoteContext,
) -> Result<PricedQuote, QuoteRejection> {
    match decision {
        RiskDecision::Allow => Ok(PricedQuote {
            odd_final: ctx.odd_final,
            potential_return: ctx.potential_return,
            risk_flags: RiskFlags::default(),
        }),
        RiskDecision::Deny(reason) => Err(QuoteRejection::RiskDenied(reason)),
        RiskDecision::Adjust { odd_final, margin } => {
            if odd_final < Decimal::ONE {
                return Err(QuoteRejection::OddOutOfRange);
            }
            Ok(PricedQuote {
                odd_final,
                potential_return: pricing::potential_return(ctx.stake, odd_final)?,
                risk_flags: RiskFlags {
                    limited: true,
                    adjusted_margin: margin,
                },
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
