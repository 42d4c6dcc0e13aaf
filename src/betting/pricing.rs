use std::collections::HashSet;

use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;
use uuid::Uuid;

use crate::errors::AppError;
use crate::ledger::{MAX_AMOUNT, MONEY_SCALE};
use crate::models::{CartelaTemplateItem, InvalidItemBound, ItemBounds, MarketSelection};

/// Why a quote request was refused before anything was written.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QuoteRejection {
    #[error("at least one selection is required")]
    NoSelections,

    #[error("selection {0} was requested more than once")]
    DuplicateSelection(Uuid),

    #[error("one or more selections are invalid for this event")]
    UnknownSelections(Vec<Uuid>),

    #[error("cartela below the minimum of {min} selections (got {count})")]
    BelowMinItems { min: u64, count: usize },

    #[error("cartela above the maximum of {max} selections (got {count})")]
    AboveMaxItems { max: u64, count: usize },

    #[error("selection type {0} is not allowed in this cartela")]
    SelectionTypeNotAllowed(String),

    #[error("stake must be greater than zero")]
    NonPositiveStake,

    #[error("stake {0} has more than 2 decimal places")]
    StakeTooPrecise(Decimal),

    #[error("stake {0} exceeds the maximum of {max}", max = MAX_AMOUNT)]
    StakeTooLarge(Decimal),

    #[error("combined odd is out of range")]
    OddOutOfRange,

    #[error("potential return {0} exceeds the maximum of {max}", max = MAX_AMOUNT)]
    PayoutTooLarge(Decimal),

    #[error("exposure total would exceed {max}", max = MAX_AMOUNT)]
    ExposureOverflow,

    #[error(transparent)]
    InvalidTemplateConfig(#[from] InvalidItemBound),

    #[error("quote denied by risk policy: {0}")]
    RiskDenied(String),
}

impl From<QuoteRejection> for AppError {
    fn from(r: QuoteRejection) -> Self {
        AppError::Validation(r.to_string())
    }
}

pub fn validate_stake(stake: Decimal) -> Result<(), QuoteRejection> {
    if stake <= Decimal::ZERO {
        return Err(QuoteRejection::NonPositiveStake);
    }
    if stake.normalize().scale() > MONEY_SCALE {
        return Err(QuoteRejection::StakeTooPrecise(stake));
    }
    if stake > MAX_AMOUNT {
        return Err(QuoteRejection::StakeTooLarge(stake));
    }
    Ok(())
}

/// The resolved selections must be exactly the requested set: no duplicates
/// in the request and no id left unresolved.
pub fn check_selection_set(
    requested: &[Uuid],
    resolved: &[MarketSelection],
) -> Result<(), QuoteRejection> {
    if requested.is_empty() {
        return Err(QuoteRejection::NoSelections);
    }

    let mut wanted = HashSet::with_capacity(requested.len());
    for id in requested {
        if !wanted.insert(*id) {
            return Err(QuoteRejection::DuplicateSelection(*id));
        }
    }

    let found: HashSet<Uuid> = resolved.iter().map(|s| s.id).collect();
    if found != wanted {
        let mut missing: Vec<Uuid> = wanted.difference(&found).copied().collect();
        missing.sort();
        return Err(QuoteRejection::UnknownSelections(missing));
    }

    Ok(())
}

pub fn check_item_bounds(count: usize, bounds: ItemBounds) -> Result<(), QuoteRejection> {
    if let Some(min) = bounds.min_items {
        if (count as u64) < min {
            return Err(QuoteRejection::BelowMinItems { min, count });
        }
    }
    if let Some(max) = bounds.max_items {
        if (count as u64) > max {
            return Err(QuoteRejection::AboveMaxItems { max, count });
        }
    }
    Ok(())
}

/// A template with no declared items accepts every selection type.
pub fn check_allowed_types(
    selections: &[MarketSelection],
    allowed: &[CartelaTemplateItem],
) -> Result<(), QuoteRejection> {
    if allowed.is_empty() {
        return Ok(());
    }
    let allowed: HashSet<&str> = allowed
        .iter()
        .map(|i| i.allowed_selection_type.as_str())
        .collect();
    match selections
        .iter()
        .find(|s| !allowed.contains(s.selection_type.as_str()))
    {
        Some(s) => Err(QuoteRejection::SelectionTypeNotAllowed(s.selection_type.clone())),
        None => Ok(()),
    }
}

/// Product of the published odds. The fair odds are deliberately not used:
/// the spread between fair and published is the house margin.
pub fn combined_odd<I>(odds: I) -> Result<Decimal, QuoteRejection>
where
    I: IntoIterator<Item = Decimal>,
{
    let mut product = Decimal::ONE;
    let mut any = false;
    for odd in odds {
        any = true;
        product = product
            .checked_mul(odd)
            .ok_or(QuoteRejection::OddOutOfRange)?;
    }
    if !any {
        return Err(QuoteRejection::NoSelections);
    }
    Ok(product.normalize())
}

/// `stake × odd`, rounded to the money scale. Must fit a stored money column.
pub fn potential_return(stake: Decimal, odd: Decimal) -> Result<Decimal, QuoteRejection> {
    let raw = stake
        .checked_mul(odd)
        .ok_or(QuoteRejection::OddOutOfRange)?;
    let rounded = raw.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero);
    if rounded > MAX_AMOUNT {
        return Err(QuoteRejection::PayoutTooLarge(rounded));
    }
    Ok(rounded)
}

/// Bucket totals after adding this quote; both stay within a money column.
pub fn next_exposure(
    volume: Decimal,
    payout: Decimal,
    stake: Decimal,
    potential_return: Decimal,
) -> Result<(Decimal, Decimal), QuoteRejection> {
    let volume = volume.checked_add(stake).filter(|v| *v <= MAX_AMOUNT);
    let payout = payout.checked_add(potential_return).filter(|p| *p <= MAX_AMOUNT);
    match (volume, payout) {
        (Some(v), Some(p)) => Ok((v, p)),
        _ => Err(QuoteRejection::ExposureOverflow),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
