pub mod exposure;
pub mod pricing;
pub mod quoting;
pub mod risk_policy;
pub mod settlement;

pub use pricing::QuoteRejection;
pub use quoting::{quote, QuoteOutcome, QuoteRequest};
pub use risk_policy::{
    ExposureLimitPolicy, PassThroughPolicy, QuoteContext, RiskDecision, RiskFlags, RiskPolicy,
};
pub use settlement::{cancel, confirm, SettlementRejection};
