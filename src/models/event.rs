use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// Database row for events table.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Event {
    pub id: Uuid,
    pub sport: String,
    pub external_id: Option<String>,
    pub team_home: String,
    pub team_away: String,
    pub start_time: DateTime<Utc>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn summary(&self) -> EventSummary {
        EventSummary {
            id: self.id,
            sport: self.sport.clone(),
            team_home: self.team_home.clone(),
            team_away: self.team_away.clone(),
            start_time: self.start_time,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x {}", self.team_home, self.team_away)
    }
}

/// Compact event description embedded in bet and cartela views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSummary {
    pub id: Uuid,
    pub sport: String,
    pub team_home: String,
    pub team_away: String,
    pub start_time: DateTime<Utc>,
}

/// One priceable outcome ("quadrinho") of an event.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MarketSelection {
    pub id: Uuid,
    pub event_id: Uuid,
    pub selection_type: String,
    pub params: serde_json::Value,
    pub prob_base: Decimal,
    pub odd_fair: Decimal,
    pub odd_published: Decimal,
    pub is_live: bool,
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Sport
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Sport {
    Soccer,
    Basketball,
    Tennis,
    Volleyball,
}

impl Sport {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sport::Soccer => "SOCCER",
            Sport::Basketball => "BASKETBALL",
            Sport::Tennis => "TENNIS",
            Sport::Volleyball => "VOLLEYBALL",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "SOCCER" => Some(Sport::Soccer),
            "BASKETBALL" => Some(Sport::Basketball),
            "TENNIS" => Some(Sport::Tennis),
            "VOLLEYBALL" => Some(Sport::Volleyball),
            _ => None,
        }
    }
}

impl fmt::Display for Sport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// EventStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EventStatus {
    Scheduled,
    Live,
    Finished,
    Cancelled,
}

impl EventStatus {
    pub const ALL: [EventStatus; 4] = [
        EventStatus::Scheduled,
        EventStatus::Live,
        EventStatus::Finished,
        EventStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventStatus::Scheduled => "SCHEDULED",
            EventStatus::Live => "LIVE",
            EventStatus::Finished => "FINISHED",
            EventStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "SCHEDULED" => Some(EventStatus::Scheduled),
            "LIVE" => Some(EventStatus::Live),
            "FINISHED" => Some(EventStatus::Finished),
            "CANCELLED" => Some(EventStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, EventStatus::Finished | EventStatus::Cancelled)
    }

    /// SCHEDULED → LIVE → FINISHED, or CANCELLED from any non-terminal state.
    pub fn can_transition_to(&self, next: EventStatus) -> bool {
        match (self, next) {
            (EventStatus::Scheduled, EventStatus::Live) => true,
            (EventStatus::Live, EventStatus::Finished) => true,
            (from, EventStatus::Cancelled) => !from.is_terminal(),
            _ => false,
        }
    }

    /// Stored status values from which `next` may be entered.
    pub fn sources_of(next: EventStatus) -> Vec<&'static str> {
        Self::ALL
            .iter()
            .filter(|from| from.can_transition_to(next))
            .map(EventStatus::as_str)
            .collect()
    }
}

impl fmt::Display for EventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
