// 11.0: market engine. one facade coordinating the collateral registry,
// position ledger, liquidity vault, and liquidation flow for a single market.
// deterministic and event-driven with no external I/O.

mod config;
mod core;
mod liquidations;
mod positions;
mod results;
mod vaults;

pub use config::MarketOptions;
pub use core::Market;
pub use results::{BorrowResult, LiquidationOutcome, MarketError, RepayResult};
