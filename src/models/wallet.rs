use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use uuid::Uuid;

/// Database row for wallets table. One per user.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Wallet {
    pub id: Uuid,
    pub user_id: Uuid,
    pub points: Decimal,
    pub funds: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wallet {
    pub fn balance(&self, category: LedgerCategory) -> Decimal {
        match category {
            LedgerCategory::Points => self.points,
            LedgerCategory::Funds => self.funds,
        }
    }
}

/// Append-only audit record of a single wallet mutation.
///
/// `points_before` / `funds_before` hold both balances as they were before the
/// mutation, so the full history can be replayed from the entries alone.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub wallet_id: Uuid,
    pub entry_type: String,
    pub category: String,
    pub amount: Decimal,
    pub description: String,
    pub points_before: Decimal,
    pub funds_before: Decimal,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// LedgerCategory
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LedgerCategory {
    Points,
    Funds,
}

impl LedgerCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerCategory::Points => "POINTS",
            LedgerCategory::Funds => "FUNDS",
        }
    }

    /// Unit label used in default entry descriptions.
    pub fn unit(&self) -> &'static str {
        match self {
            LedgerCategory::Points => "points",
            LedgerCategory::Funds => "funds",
        }
    }
}

impl fmt::Display for LedgerCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// LedgerEntryType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum LedgerEntryType {
    Deposit,
    Bonus,
    Prize,
    Debit,
    Withdrawal,
    Wager,
    Win,
}

impl LedgerEntryType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerEntryType::Deposit => "DEPOSIT",
            LedgerEntryType::Bonus => "BONUS",
            LedgerEntryType::Prize => "PRIZE",
            LedgerEntryType::Debit => "DEBIT",
            LedgerEntryType::Withdrawal => "WITHDRAWAL",
            LedgerEntryType::Wager => "WAGER",
            LedgerEntryType::Win => "WIN",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "DEPOSIT" => Some(LedgerEntryType::Deposit),
            "BONUS" => Some(LedgerEntryType::Bonus),
            "PRIZE" => Some(LedgerEntryType::Prize),
            "DEBIT" => Some(LedgerEntryType::Debit),
            "WITHDRAWAL" => Some(LedgerEntryType::Withdrawal),
            "WAGER" => Some(LedgerEntryType::Wager),
            "WIN" => Some(LedgerEntryType::Win),
            _ => None,
        }
    }
}

impl fmt::Display for LedgerEntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
