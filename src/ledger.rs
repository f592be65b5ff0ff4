//! Position ledger: all open positions, their collateral custody, and per-asset
//! TVL tracking for one market.
//!
//! Every mutating entry point validates fully before committing, so a rejected
//! operation leaves the ledger byte-identical to before the call. The same-block
//! guard is checked per position; interest accrual is lazy and happens on touch.

use crate::mev_guard::{GuardScope, MevError, MevGuard};
use crate::position::{CollateralEntry, Position, RepaymentSplit, MAX_COLLATERAL_ASSETS};
use crate::position_vault::{CustodyError, VaultRegistry};
use crate::registry::{CollateralRegistry, RegistryError};
use crate::tier::Tier;
use crate::types::{AccountId, Amount, AssetId, PositionId, Price, Timestamp, Usd};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// open positions one owner may hold in a market
pub const MAX_POSITIONS_PER_OWNER: usize = 1000;

// per-asset aggregate across all position vaults. tvl_native must equal the
// sum of that asset's vault balances at all times.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AssetTracking {
    pub tvl_native: Amount,
    pub tvl_usd: Usd,
    pub updated_at: Timestamp,
}

impl AssetTracking {
    fn zero(now: Timestamp) -> Self {
        Self {
            tvl_native: Amount::zero(),
            tvl_usd: Usd::zero(),
            updated_at: now,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionLedger {
    positions: HashMap<PositionId, Position>,
    vaults: VaultRegistry,
    tracking: HashMap<AssetId, AssetTracking>,
    // debt outstanding per isolated asset, for the protocol-wide cap
    isolated_debt: HashMap<AssetId, Amount>,
    open_counts: HashMap<AccountId, usize>,
    guard: MevGuard,
    next_position_id: u64,
}

impl PositionLedger {
    pub fn new() -> Self {
        Self {
            positions: HashMap::new(),
            vaults: VaultRegistry::new(),
            tracking: HashMap::new(),
            isolated_debt: HashMap::new(),
            open_counts: HashMap::new(),
            guard: MevGuard::new(),
            next_position_id: 1,
        }
    }

    pub fn position(&self, id: PositionId) -> Result<&Position, LedgerError> {
        self.positions.get(&id).ok_or(LedgerError::PositionNotFound(id))
    }

    pub fn positions_iter(&self) -> impl Iterator<Item = (&PositionId, &Position)> {
        self.positions.iter()
    }

    pub fn open_position_count(&self, owner: AccountId) -> usize {
        self.open_counts.get(&owner).copied().unwrap_or(0)
    }

    pub fn asset_tracking(&self, asset: AssetId) -> Option<&AssetTracking> {
        self.tracking.get(&asset)
    }

    pub fn isolated_debt(&self, asset: AssetId) -> Amount {
        self.isolated_debt
            .get(&asset)
            .copied()
            .unwrap_or_else(Amount::zero)
    }

    pub fn vaults(&self) -> &VaultRegistry {
        &self.vaults
    }

    // the tier that parameterizes this position's borrow rate: the riskiest
    // tier among its collateral. an empty basket defaults to CrossA.
    pub fn rate_tier(&self, id: PositionId, registry: &CollateralRegistry) -> Result<Tier, LedgerError> {
        let position = self.position(id)?;
        let mut tier = Tier::CrossA;
        let mut seen = false;
        for entry in &position.collateral {
            let asset_tier = registry.tier(entry.asset)?;
            if !seen || asset_tier.rate_multiplier() > tier.rate_multiplier() {
                tier = asset_tier;
                seen = true;
            }
        }
        Ok(tier)
    }

    // ===== mutating entry points =====

    pub fn open_position(
        &mut self,
        owner: AccountId,
        is_isolated: bool,
        now: Timestamp,
    ) -> Result<PositionId, LedgerError> {
        let count = self.open_position_count(owner);
        if count >= MAX_POSITIONS_PER_OWNER {
            return Err(LedgerError::PositionLimitReached {
                limit: MAX_POSITIONS_PER_OWNER,
            });
        }

        let id = PositionId(self.next_position_id);
        self.next_position_id += 1;
        self.guard.touch(GuardScope::Position(id), now);
        self.positions.insert(id, Position::new(owner, id, is_isolated, now));
        *self.open_counts.entry(owner).or_insert(0) += 1;
        Ok(id)
    }

    pub fn supply_collateral(
        &mut self,
        caller: AccountId,
        id: PositionId,
        asset: AssetId,
        amount: Amount,
        registry: &CollateralRegistry,
        now: Timestamp,
    ) -> Result<(), LedgerError> {
        let tier = registry.tier(asset)?;
        let price = registry.price(asset, now)?;

        let position = self.position(id)?;
        self.require_owner(position, caller)?;
        self.guard.check(GuardScope::Position(id), now)?;

        // isolation rules: isolated positions hold exactly one Isolated-tier
        // asset; cross positions never hold an Isolated-tier asset.
        if position.is_isolated {
            if !tier.is_isolated() {
                return Err(LedgerError::IsolatedAssetViolation);
            }
            if position.asset_count() > 0 && !position.holds_asset(asset) {
                return Err(LedgerError::IsolatedAssetViolation);
            }
        } else if tier.is_isolated() {
            return Err(LedgerError::IsolatedAssetViolation);
        }

        if !position.holds_asset(asset) && position.asset_count() >= MAX_COLLATERAL_ASSETS {
            return Err(LedgerError::MaximumAssetsReached {
                limit: MAX_COLLATERAL_ASSETS,
            });
        }

        // commit
        self.guard.touch(GuardScope::Position(id), now);
        let position = self.positions.get_mut(&id).expect("validated above");
        position.add_collateral(asset, amount);
        self.vaults.vault_mut(id).deposit(asset, amount);
        self.track_deposit(asset, amount, price, now);
        Ok(())
    }

    // like borrow, returns the interest folded by the pre-withdrawal accrual
    // so the caller can bump the market-wide borrower-interest counter.
    pub fn withdraw_collateral(
        &mut self,
        caller: AccountId,
        id: PositionId,
        asset: AssetId,
        amount: Amount,
        registry: &CollateralRegistry,
        rate: Decimal,
        base_price: Price,
        now: Timestamp,
    ) -> Result<Amount, LedgerError> {
        let price = registry.price(asset, now)?;
        let position = self.position(id)?;
        self.require_owner(position, caller)?;
        self.guard.check(GuardScope::Position(id), now)?;

        let held = position.collateral_amount(asset);
        if amount > held {
            return Err(LedgerError::InsufficientCollateral {
                asset,
                requested: amount,
                held,
            });
        }

        // debt including pending interest, then credit limit as if withdrawn
        let debt = position.debt_with_interest(rate, now);
        let debt_usd = base_price.value_of(debt);
        let limit_after = self.credit_limit_excluding(position, registry, now, asset, amount)?;
        if position.has_debt() && limit_after < debt_usd {
            return Err(LedgerError::CreditLimitExceeded {
                debt: debt_usd,
                limit: limit_after,
            });
        }

        // commit: fold the pending interest, restamp, move the tokens out
        self.guard.touch(GuardScope::Position(id), now);
        let position = self.positions.get_mut(&id).expect("validated above");
        let accrued = position.accrue(rate, now);
        position
            .remove_collateral(asset, amount)
            .expect("balance validated above");
        self.vaults
            .vault_mut(id)
            .withdraw(asset, amount)
            .expect("vault mirrors position balance");
        self.track_withdrawal(asset, amount, price, now);
        Ok(accrued)
    }

    // returns the interest folded in by the pre-borrow accrual, so the caller
    // can bump the market-wide borrower-interest counter.
    pub fn borrow(
        &mut self,
        caller: AccountId,
        id: PositionId,
        amount: Amount,
        registry: &CollateralRegistry,
        rate: Decimal,
        base_price: Price,
        now: Timestamp,
    ) -> Result<Amount, LedgerError> {
        let position = self.position(id)?;
        self.require_owner(position, caller)?;
        self.guard.check(GuardScope::Position(id), now)?;

        let pending = position.pending_interest(rate, now);
        let debt_after = position.booked_debt().add(pending).add(amount);
        let debt_usd = base_price.value_of(debt_after);
        let limit = self.credit_limit_of(position, registry, now)?;
        if debt_usd > limit {
            return Err(LedgerError::CreditLimitExceeded {
                debt: debt_usd,
                limit,
            });
        }

        // isolated positions share a protocol-wide debt cap per asset
        if position.is_isolated {
            let asset = position
                .collateral
                .first()
                .map(|e| e.asset)
                .ok_or(LedgerError::CreditLimitExceeded {
                    debt: debt_usd,
                    limit: Usd::zero(),
                })?;
            let cap = registry.isolation_debt_cap(asset)?;
            let outstanding = self.isolated_debt(asset).add(amount);
            if outstanding > cap {
                return Err(LedgerError::IsolationDebtCapExceeded {
                    asset,
                    outstanding,
                    cap,
                });
            }
        }

        // commit
        self.guard.touch(GuardScope::Position(id), now);
        let position = self.positions.get_mut(&id).expect("validated above");
        let accrued = position.accrue(rate, now);
        position.debt_principal = position.debt_principal.add(amount);
        if position.is_isolated {
            let asset = position.collateral[0].asset;
            let entry = self.isolated_debt.entry(asset).or_insert_with(Amount::zero);
            *entry = entry.add(amount);
        }
        Ok(accrued)
    }

    pub fn repay(
        &mut self,
        caller: AccountId,
        id: PositionId,
        amount: Amount,
        rate: Decimal,
        now: Timestamp,
    ) -> Result<(RepaymentSplit, Amount), LedgerError> {
        let position = self.position(id)?;
        self.require_owner(position, caller)?;
        self.guard.check(GuardScope::Position(id), now)?;

        let owed = position.debt_with_interest(rate, now);
        if amount > owed {
            return Err(LedgerError::RepayExceedsDebt {
                requested: amount,
                owed,
            });
        }

        // commit
        let is_isolated = position.is_isolated;
        let isolated_asset = position.collateral.first().map(|e| e.asset);
        self.guard.touch(GuardScope::Position(id), now);
        let position = self.positions.get_mut(&id).expect("validated above");
        let accrued = position.accrue(rate, now);
        let split = position
            .apply_repayment(amount)
            .expect("amount validated against owed");
        if is_isolated && !split.principal_paid.is_zero() {
            if let Some(asset) = isolated_asset {
                let entry = self.isolated_debt.entry(asset).or_insert_with(Amount::zero);
                *entry = entry.saturating_sub(split.principal_paid);
            }
        }
        Ok((split, accrued))
    }

    // full close: zero debt required, all collateral handed back.
    pub fn close_position(
        &mut self,
        caller: AccountId,
        id: PositionId,
        registry: &CollateralRegistry,
        now: Timestamp,
    ) -> Result<Vec<CollateralEntry>, LedgerError> {
        let position = self.position(id)?;
        self.require_owner(position, caller)?;
        self.guard.check(GuardScope::Position(id), now)?;
        if position.has_debt() {
            return Err(LedgerError::DebtOutstanding {
                debt: position.booked_debt(),
            });
        }
        // prices must be live for the TVL bookkeeping on the way out
        for entry in &position.collateral {
            registry.price(entry.asset, now)?;
        }

        let returned = self.remove_position(id, registry, now);
        Ok(returned)
    }

    // liquidation seizure: the liquidation engine has already validated the
    // health factor; this drains the vault and deletes the position. caller
    // gets the seized collateral and the position's final booked debt.
    pub fn seize_position(
        &mut self,
        id: PositionId,
        registry: &CollateralRegistry,
        now: Timestamp,
    ) -> Result<(Amount, Vec<CollateralEntry>), LedgerError> {
        let position = self.position(id)?;
        let debt = position.booked_debt();
        // the tracker only ever counts principal, so only principal comes out
        let principal = position.debt_principal;
        let isolated_asset = if position.is_isolated {
            position.collateral.first().map(|e| e.asset)
        } else {
            None
        };

        let seized = self.remove_position(id, registry, now);
        if let Some(asset) = isolated_asset {
            let entry = self.isolated_debt.entry(asset).or_insert_with(Amount::zero);
            *entry = entry.saturating_sub(principal);
        }
        Ok((debt, seized))
    }

    // accrue a position in place. used by the liquidation path, which must
    // book pending interest before quoting the debt.
    pub fn accrue_position(
        &mut self,
        id: PositionId,
        rate: Decimal,
        now: Timestamp,
    ) -> Result<Amount, LedgerError> {
        self.guard.check(GuardScope::Position(id), now)?;
        let position = self
            .positions
            .get_mut(&id)
            .ok_or(LedgerError::PositionNotFound(id))?;
        self.guard.touch(GuardScope::Position(id), now);
        Ok(position.accrue(rate, now))
    }

    // ===== views =====

    // risk-weighted USD value of the collateral basket
    pub fn credit_limit(
        &self,
        id: PositionId,
        registry: &CollateralRegistry,
        now: Timestamp,
    ) -> Result<Usd, LedgerError> {
        let position = self.position(id)?;
        self.credit_limit_of(position, registry, now)
    }

    pub fn debt_with_interest(
        &self,
        id: PositionId,
        rate: Decimal,
        now: Timestamp,
    ) -> Result<Amount, LedgerError> {
        Ok(self.position(id)?.debt_with_interest(rate, now))
    }

    fn credit_limit_of(
        &self,
        position: &Position,
        registry: &CollateralRegistry,
        now: Timestamp,
    ) -> Result<Usd, LedgerError> {
        let mut limit = Usd::zero();
        for entry in &position.collateral {
            let tier = registry.tier(entry.asset)?;
            let price = registry.price(entry.asset, now)?;
            let value = price.value_of(entry.amount);
            limit = limit.add(value.mul(tier.collateral_factor()));
        }
        Ok(limit)
    }

    // credit limit as if `exclude_amount` of `exclude_asset` were gone
    fn credit_limit_excluding(
        &self,
        position: &Position,
        registry: &CollateralRegistry,
        now: Timestamp,
        exclude_asset: AssetId,
        exclude_amount: Amount,
    ) -> Result<Usd, LedgerError> {
        let mut limit = Usd::zero();
        for entry in &position.collateral {
            let tier = registry.tier(entry.asset)?;
            let price = registry.price(entry.asset, now)?;
            let amount = if entry.asset == exclude_asset {
                entry.amount.saturating_sub(exclude_amount)
            } else {
                entry.amount
            };
            limit = limit.add(price.value_of(amount).mul(tier.collateral_factor()));
        }
        Ok(limit)
    }

    // ===== internals =====

    fn require_owner(&self, position: &Position, caller: AccountId) -> Result<(), LedgerError> {
        if position.owner != caller {
            return Err(LedgerError::NotPositionOwner {
                position: position.id,
                caller,
            });
        }
        Ok(())
    }

    fn remove_position(
        &mut self,
        id: PositionId,
        registry: &CollateralRegistry,
        now: Timestamp,
    ) -> Vec<CollateralEntry> {
        let position = self.positions.remove(&id).expect("caller validated existence");
        if let Some(count) = self.open_counts.get_mut(&position.owner) {
            *count = count.saturating_sub(1);
        }

        let returned = match self.vaults.remove(id) {
            Some(mut vault) => vault.drain(),
            None => Vec::new(),
        };
        for entry in &returned {
            // price may legitimately be unavailable mid-liquidation; the
            // native-side conservation still holds, USD is best-effort here
            let price = registry.price(entry.asset, now).ok();
            self.track_removal(entry.asset, entry.amount, price, now);
        }
        self.guard.release(GuardScope::Position(id));
        returned
    }

    fn track_deposit(&mut self, asset: AssetId, amount: Amount, price: Price, now: Timestamp) {
        let entry = self
            .tracking
            .entry(asset)
            .or_insert_with(|| AssetTracking::zero(now));
        entry.tvl_native = entry.tvl_native.add(amount);
        entry.tvl_usd = price.value_of(entry.tvl_native);
        entry.updated_at = now;
    }

    fn track_withdrawal(&mut self, asset: AssetId, amount: Amount, price: Price, now: Timestamp) {
        let entry = self
            .tracking
            .entry(asset)
            .or_insert_with(|| AssetTracking::zero(now));
        entry.tvl_native = entry.tvl_native.saturating_sub(amount);
        entry.tvl_usd = price.value_of(entry.tvl_native);
        entry.updated_at = now;
    }

    fn track_removal(&mut self, asset: AssetId, amount: Amount, price: Option<Price>, now: Timestamp) {
        let entry = self
            .tracking
            .entry(asset)
            .or_insert_with(|| AssetTracking::zero(now));
        entry.tvl_native = entry.tvl_native.saturating_sub(amount);
        if let Some(price) = price {
            entry.tvl_usd = price.value_of(entry.tvl_native);
        }
        entry.updated_at = now;
    }
}

impl Default for PositionLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum LedgerError {
    #[error("Position {0:?} not found")]
    PositionNotFound(PositionId),

    #[error("Account {caller:?} does not own position {position:?}")]
    NotPositionOwner {
        position: PositionId,
        caller: AccountId,
    },

    #[error("Open position limit reached ({limit} per owner)")]
    PositionLimitReached { limit: usize },

    #[error("Maximum collateral assets reached ({limit} per position)")]
    MaximumAssetsReached { limit: usize },

    #[error("Isolated-tier asset rules violated")]
    IsolatedAssetViolation,

    #[error("Insufficient collateral for asset {asset:?}: requested {requested}, held {held}")]
    InsufficientCollateral {
        asset: AssetId,
        requested: Amount,
        held: Amount,
    },

    #[error("Credit limit exceeded: debt {debt}, limit {limit}")]
    CreditLimitExceeded { debt: Usd, limit: Usd },

    #[error("Isolation debt cap exceeded for asset {asset:?}: {outstanding} > cap {cap}")]
    IsolationDebtCapExceeded {
        asset: AssetId,
        outstanding: Amount,
        cap: Amount,
    },

    #[error("Repay exceeds debt: requested {requested}, owed {owed}")]
    RepayExceedsDebt { requested: Amount, owed: Amount },

    #[error("Position has outstanding debt: {debt}")]
    DebtOutstanding { debt: Amount },

    #[error(transparent)]
    Mev(#[from] MevError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Custody(#[from] CustodyError),
}
