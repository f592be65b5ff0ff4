// 11.0.2: result types and errors for engine operations.

use crate::ledger::LedgerError;
use crate::liquidation::LiquidationError;
use crate::market_vault::VaultError;
use crate::position::CollateralEntry;
use crate::registry::RegistryError;
use crate::types::{AccountId, Amount, Usd};
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct BorrowResult {
    pub amount: Amount,
    // principal + booked interest after the draw
    pub new_debt: Amount,
    pub credit_limit: Usd,
    pub borrow_rate: Decimal,
}

#[derive(Debug, Clone)]
pub struct RepayResult {
    pub interest_paid: Amount,
    pub principal_paid: Amount,
    pub remaining_debt: Amount,
}

#[derive(Debug, Clone)]
pub struct LiquidationOutcome {
    pub debt_closed: Amount,
    pub cost_paid: Amount,
    pub bonus: Decimal,
    pub seized: Vec<CollateralEntry>,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum MarketError {
    #[error("Account {caller:?} is not the governance account")]
    Unauthorized { caller: AccountId },

    #[error("Insufficient governance stake: held {held}, requested {requested}")]
    InsufficientStake { held: Amount, requested: Amount },

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("Vault error: {0}")]
    Vault(#[from] VaultError),

    #[error("Liquidation error: {0}")]
    Liquidation(#[from] LiquidationError),

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),
}
