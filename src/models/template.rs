use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// A purchasable cartela product definition.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CartelaTemplate {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub template_type: String,
    pub influencer_id: Option<Uuid>,
    pub config: serde_json::Value,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl CartelaTemplate {
    pub fn kind(&self) -> Option<TemplateType> {
        TemplateType::from_str(&self.template_type)
    }

    /// Selection-count bounds declared in the template config, if any.
    pub fn item_bounds(&self) -> Result<ItemBounds, InvalidItemBound> {
        ItemBounds::from_config(&self.config)
    }
}

/// Declares one selection type as eligible for a template.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CartelaTemplateItem {
    pub id: Uuid,
    pub cartela_template_id: Uuid,
    pub allowed_selection_type: String,
    pub constraints: serde_json::Value,
}

/// `min_items` / `max_items` read from a template's free-form config.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemBounds {
    pub min_items: Option<u64>,
    pub max_items: Option<u64>,
}

/// A `min_items` / `max_items` entry that is present but not a usable count.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("template config {key} must be a non-negative number, got {value}")]
pub struct InvalidItemBound {
    pub key: &'static str,
    pub value: String,
}

impl ItemBounds {
    /// Absent or `null` keys impose no bound. Fractional values round toward
    /// the stricter bound: the minimum up, the maximum down.
    pub fn from_config(config: &serde_json::Value) -> Result<Self, InvalidItemBound> {
        Ok(Self {
            min_items: read_bound(config, "min_items", f64::ceil)?,
            max_items: read_bound(config, "max_items", f64::floor)?,
        })
    }
}

fn read_bound(
    config: &serde_json::Value,
    key: &'static str,
    round: fn(f64) -> f64,
) -> Result<Option<u64>, InvalidItemBound> {
    let value = match config.get(key) {
        None | Some(serde_json::Value::Null) => return Ok(None),
        Some(v) => v,
    };
    match value.as_f64() {
        Some(n) if n.is_finite() && n >= 0.0 => Ok(Some(round(n) as u64)),
        _ => Err(InvalidItemBound {
            key,
            value: value.to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// TemplateType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TemplateType {
    PreMatch,
    Live,
    Turbo,
    Mystery,
    Influencer,
}

impl TemplateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateType::PreMatch => "PRE_MATCH",
            TemplateType::Live => "LIVE",
            TemplateType::Turbo => "TURBO",
            TemplateType::Mystery => "MYSTERY",
            TemplateType::Influencer => "INFLUENCER",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "PRE_MATCH" => Some(TemplateType::PreMatch),
            "LIVE" => Some(TemplateType::Live),
            "TURBO" => Some(TemplateType::Turbo),
            "MYSTERY" => Some(TemplateType::Mystery),
            "INFLUENCER" => Some(TemplateType::Influencer),
            _ => None,
        }
    }

    /// Live and turbo cartelas may only contain in-play selections.
    pub fn live_only(&self) -> bool {
        matches!(self, TemplateType::Live | TemplateType::Turbo)
    }
}

impl fmt::Display for TemplateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
