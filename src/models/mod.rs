pub mod bet;
pub mod cartela;
pub mod event;
pub mod risk;
pub mod template;
pub mod user;
pub mod wallet;

pub use bet::{Bet, BetRow, BetView};
pub use cartela::{
    CartelaDetail, CartelaInstance, CartelaInstanceItem, CartelaItemView, CartelaStatus,
    OddsSnapshot, QuoteSnapshot,
};
pub use event::{Event, EventStatus, EventSummary, MarketSelection, Sport};
pub use risk::RiskExposureMetrics;
pub use template::{CartelaTemplate, CartelaTemplateItem, InvalidItemBound, ItemBounds, TemplateType};
pub use user::{Influencer, User};
pub use wallet::{LedgerCategory, LedgerEntry, LedgerEntryType, Wallet};
