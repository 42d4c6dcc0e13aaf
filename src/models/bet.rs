use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::EventSummary;

/// Database row for bets table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Bet {
    pub id: Uuid,
    pub cartela_instance_id: Uuid,
    pub stake: Decimal,
    pub odd_final: Decimal,
    pub potential_return: Decimal,
    /// `None` while the bet is pending settlement.
    pub is_won: Option<bool>,
    pub settled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Flat join of a bet with its cartela's event and template.
#[derive(Debug, Clone, FromRow)]
pub struct BetRow {
    pub id: Uuid,
    pub cartela_instance_id: Uuid,
    pub stake: Decimal,
    pub odd_final: Decimal,
    pub potential_return: Decimal,
    pub is_won: Option<bool>,
    pub settled_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub event_id: Uuid,
    pub sport: String,
    pub team_home: String,
    pub team_away: String,
    pub start_time: DateTime<Utc>,
    pub template_type: String,
}

/// Bet as presented to its owner.
#[derive(Debug, Clone, Serialize)]
pub struct BetView {
    pub id: Uuid,
    pub cartela: Uuid,
    pub event: EventSummary,
    pub cartela_type: String,
    pub stake: Decimal,
    pub odd_final: Decimal,
    pub potential_return: Decimal,
    pub is_won: Option<bool>,
    pub created_at: DateTime<Utc>,
    pub settled_at: Option<DateTime<Utc>>,
}

impl From<BetRow> for BetView {
    fn from(row: BetRow) -> Self {
        Self {
            id: row.id,
            cartela: row.cartela_instance_id,
            event: EventSummary {
                id: row.event_id,
                sport: row.sport,
                team_home: row.team_home,
                team_away: row.team_away,
                start_time: row.start_time,
            },
            cartela_type: row.template_type,
            stake: row.stake,
            odd_final: row.odd_final,
            potential_return: row.potential_return,
            is_won: row.is_won,
            created_at: row.created_at,
            settled_at: row.settled_at,
        }
    }
}
