use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Running exposure for one (event, template, influencer) bucket.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RiskExposureMetrics {
    pub id: Uuid,
    pub event_id: Uuid,
    pub cartela_template_id: Uuid,
    pub influencer_id: Option<Uuid>,
    pub volume_total: Decimal,
    pub payout_maximo: Decimal,
    pub margin_avg: f64,
    pub updated_at: DateTime<Utc>,
}
