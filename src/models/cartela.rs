use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

use super::EventSummary;

/// Database row for cartela_instances table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CartelaInstance {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_id: Uuid,
    pub cartela_template_id: Uuid,
    pub status: String,
    pub odd_final: Option<Decimal>,
    pub premio_maximo: Option<Decimal>,
    pub stake: Decimal,
    pub snapshot_data: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub locked_at: Option<DateTime<Utc>>,
}

impl CartelaInstance {
    pub fn status(&self) -> Option<CartelaStatus> {
        CartelaStatus::from_str(&self.status)
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.valid_until
    }
}

/// Join of an instance to one of its selections, priced at quote time.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CartelaInstanceItem {
    pub id: Uuid,
    pub cartela_instance_id: Uuid,
    pub market_selection_id: Uuid,
    pub odd_used: Decimal,
}

/// Odds audit row written alongside every quote.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct OddsSnapshot {
    pub id: Uuid,
    pub cartela_instance_id: Uuid,
    pub data: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// Inputs used to price an instance, stored verbatim in `snapshot_data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    pub selection_ids: Vec<Uuid>,
    pub odd_final_raw: Decimal,
    pub stake: String,
    /// Exposure bucket the quote was recorded against.
    #[serde(default)]
    pub influencer_id: Option<Uuid>,
}

/// Item row joined with its market selection for detail views.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CartelaItemView {
    pub id: Uuid,
    pub odd_used: Decimal,
    pub selection_id: Uuid,
    pub selection_type: String,
    pub params: serde_json::Value,
    pub odd_published: Decimal,
}

/// Full instance detail as returned to its owner.
#[derive(Debug, Clone, Serialize)]
pub struct CartelaDetail {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event: EventSummary,
    pub cartela_template_name: String,
    pub status: String,
    pub odd_final: Option<Decimal>,
    pub premio_maximo: Option<Decimal>,
    pub stake: Decimal,
    pub snapshot_data: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub valid_until: DateTime<Utc>,
    pub locked_at: Option<DateTime<Utc>>,
    pub items: Vec<CartelaItemView>,
}

// ---------------------------------------------------------------------------
// CartelaStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CartelaStatus {
    Criada,
    ApostaPendente,
    ApostaConfirmada,
    Settled,
    Cancelada,
}

impl CartelaStatus {
    pub const ALL: [CartelaStatus; 5] = [
        CartelaStatus::Criada,
        CartelaStatus::ApostaPendente,
        CartelaStatus::ApostaConfirmada,
        CartelaStatus::Settled,
        CartelaStatus::Cancelada,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CartelaStatus::Criada => "CRIADA",
            CartelaStatus::ApostaPendente => "APOSTA_PENDENTE",
            CartelaStatus::ApostaConfirmada => "APOSTA_CONFIRMADA",
            CartelaStatus::Settled => "SETTLED",
            CartelaStatus::Cancelada => "CANCELADA",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "CRIADA" => Some(CartelaStatus::Criada),
            "APOSTA_PENDENTE" => Some(CartelaStatus::ApostaPendente),
            "APOSTA_CONFIRMADA" => Some(CartelaStatus::ApostaConfirmada),
            "SETTLED" => Some(CartelaStatus::Settled),
            "CANCELADA" => Some(CartelaStatus::Cancelada),
            _ => None,
        }
    }

    pub fn can_transition_to(&self, next: CartelaStatus) -> bool {
        use CartelaStatus::*;
        match (self, next) {
            (Criada, ApostaPendente) => true,
            (ApostaPendente, ApostaConfirmada) => true,
            (ApostaConfirmada, Settled) => true,
            (Criada | ApostaPendente | ApostaConfirmada, Cancelada) => true,
            _ => false,
        }
    }

    /// Stored status values from which `next` may be entered.
    pub fn sources_of(next: CartelaStatus) -> Vec<&'static str> {
        Self::ALL
            .iter()
            .filter(|from| from.can_transition_to(next))
            .map(CartelaStatus::as_str)
            .collect()
    }

    /// Whether the owner may still withdraw the quote. Confirmed bets are
    /// only unwound through settlement.
    pub fn is_user_cancellable(&self) -> bool {
        matches!(self, CartelaStatus::Criada | CartelaStatus::ApostaPendente)
    }
}

impl fmt::Display for CartelaStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
