//! Domain types: price bars and fund holdings.

pub mod bar;
pub mod holding;

pub use bar::{PriceBar, PriceField};
pub use holding::{analyze_holdings, Holding, HoldingsSummary};
