// lending-core: multi-market lending protocol core engine.
// ledger-first architecture: every token movement books through the position
// ledger and the market vault, and both re-check their own invariants.
// all computation is deterministic with no external I/O.
//
// file map (search X.0 for structs, X.1+ for logic):
//   1.x  types.rs: primitives: AccountId, PositionId, Amount, Usd, Price, Bps
//   2.x  tier.rs: collateral risk tiers and their constant tables
//   3.x  registry.rs: asset whitelist, tiers, staleness-checked prices
//   4.x  rate_model.rs: kinked utilization curve, per-tier multiplier
//   5.x  position.rs: collateral basket + two-bucket debt, interest accrual
//   6.x  position_vault.rs: per-position collateral custody
//   7.x  mev_guard.rs: same-block reentry guard
//   8.x  market_vault.rs: pooled base-asset vault, shares, flash loans
//   9.x  config.rs: market params, presets, validation
//   10.x events.rs: state transition events for audit
//   11.x engine/: market facade: positions, liquidations, liquidity
//   -    ledger.rs: the position ledger, collateral and debt bookkeeping
//   -    liquidation.rs: health factor, weighted bonus, liquidation math

// accounting modules
pub mod ledger;
pub mod market_vault;
pub mod position;
pub mod position_vault;
pub mod types;

// risk modules
pub mod liquidation;
pub mod mev_guard;
pub mod rate_model;
pub mod registry;
pub mod tier;

// coordination modules
pub mod config;
pub mod engine;
pub mod events;

// re exports for convenience
pub use config::*;
pub use engine::*;
pub use events::*;
pub use ledger::*;
pub use liquidation::*;
pub use market_vault::*;
pub use mev_guard::*;
pub use position::*;
pub use position_vault::*;
pub use rate_model::*;
pub use registry::*;
pub use tier::*;
pub use types::*;
