// 6.0: per-position collateral custody. every position gets its own vault,
// created lazily on the first deposit and drained on close or liquidation.
// vaults never share balances, so liquidating one position structurally
// cannot touch another's collateral.

use crate::position::CollateralEntry;
use crate::types::{Amount, AssetId, PositionId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionVault {
    pub position_id: PositionId,
    balances: HashMap<AssetId, Amount>,
}

impl PositionVault {
    fn new(position_id: PositionId) -> Self {
        Self {
            position_id,
            balances: HashMap::new(),
        }
    }

    pub fn balance(&self, asset: AssetId) -> Amount {
        self.balances
            .get(&asset)
            .copied()
            .unwrap_or_else(Amount::zero)
    }

    pub fn deposit(&mut self, asset: AssetId, amount: Amount) {
        let entry = self.balances.entry(asset).or_insert_with(Amount::zero);
        *entry = entry.add(amount);
    }

    pub fn withdraw(&mut self, asset: AssetId, amount: Amount) -> Result<(), CustodyError> {
        let held = self.balance(asset);
        let remaining = held
            .checked_sub(amount)
            .ok_or(CustodyError::InsufficientBalance {
                asset,
                requested: amount,
                held,
            })?;
        if remaining.is_zero() {
            self.balances.remove(&asset);
        } else {
            self.balances.insert(asset, remaining);
        }
        Ok(())
    }

    // empties the vault, returning everything it held. used on close and on
    // all-or-nothing liquidation.
    pub fn drain(&mut self) -> Vec<CollateralEntry> {
        let mut entries: Vec<CollateralEntry> = self
            .balances
            .drain()
            .map(|(asset, amount)| CollateralEntry { asset, amount })
            .collect();
        entries.sort_by_key(|e| e.asset);
        entries
    }

    pub fn is_empty(&self) -> bool {
        self.balances.is_empty()
    }
}

// 6.1: the factory. owns all vaults keyed by position id; the ledger is the
// only caller.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VaultRegistry {
    vaults: HashMap<PositionId, PositionVault>,
}

impl VaultRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // lazy creation on first collateral deposit
    pub fn vault_mut(&mut self, position_id: PositionId) -> &mut PositionVault {
        self.vaults
            .entry(position_id)
            .or_insert_with(|| PositionVault::new(position_id))
    }

    pub fn vault(&self, position_id: PositionId) -> Option<&PositionVault> {
        self.vaults.get(&position_id)
    }

    pub fn exists(&self, position_id: PositionId) -> bool {
        self.vaults.contains_key(&position_id)
    }

    pub fn remove(&mut self, position_id: PositionId) -> Option<PositionVault> {
        self.vaults.remove(&position_id)
    }

    // sum of one asset across all live vaults. the ledger's per-asset TVL
    // tracker must match this at all times.
    pub fn total_of_asset(&self, asset: AssetId) -> Amount {
        self.vaults.values().map(|v| v.balance(asset)).sum()
    }

    pub fn vault_count(&self) -> usize {
        self.vaults.len()
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum CustodyError {
    #[error("Insufficient vault balance for asset {asset:?}: requested {requested}, held {held}")]
    InsufficientBalance {
        asset: AssetId,
        requested: Amount,
        held: Amount,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn amt(v: i64) -> Amount {
        Amount::new(Decimal::from(v)).unwrap()
    }

    #[test]
    fn lazy_vault_creation() {
        let mut registry = VaultRegistry::new();
        assert!(!registry.exists(PositionId(1)));

        registry.vault_mut(PositionId(1)).deposit(AssetId(1), amt(10));
        assert!(registry.exists(PositionId(1)));
        assert_eq!(registry.vault(PositionId(1)).unwrap().balance(AssetId(1)), amt(10));
    }

    #[test]
    fn withdraw_respects_balance() {
        let mut registry = VaultRegistry::new();
        let vault = registry.vault_mut(PositionId(1));
        vault.deposit(AssetId(1), amt(10));

        vault.withdraw(AssetId(1), amt(4)).unwrap();
        assert_eq!(vault.balance(AssetId(1)), amt(6));

        let result = vault.withdraw(AssetId(1), amt(7));
        assert!(matches!(
            result,
            Err(CustodyError::InsufficientBalance { .. })
        ));
        // failed withdrawal leaves the balance untouched
        assert_eq!(vault.balance(AssetId(1)), amt(6));
    }

    #[test]
    fn drain_empties_vault() {
        let mut registry = VaultRegistry::new();
        let vault = registry.vault_mut(PositionId(1));
        vault.deposit(AssetId(2), amt(5));
        vault.deposit(AssetId(1), amt(10));

        let drained = vault.drain();
        assert_eq!(drained.len(), 2);
        assert_eq!(drained[0].asset, AssetId(1));
        assert_eq!(drained[0].amount, amt(10));
        assert!(vault.is_empty());
    }

    #[test]
    fn asset_totals_span_vaults() {
        let mut registry = VaultRegistry::new();
        registry.vault_mut(PositionId(1)).deposit(AssetId(1), amt(10));
        registry.vault_mut(PositionId(2)).deposit(AssetId(1), amt(5));
        registry.vault_mut(PositionId(2)).deposit(AssetId(2), amt(7));

        assert_eq!(registry.total_of_asset(AssetId(1)), amt(15));
        assert_eq!(registry.total_of_asset(AssetId(2)), amt(7));
        assert_eq!(registry.total_of_asset(AssetId(3)), Amount::zero());
    }

    #[test]
    fn vault_isolation() {
        let mut registry = VaultRegistry::new();
        registry.vault_mut(PositionId(1)).deposit(AssetId(1), amt(10));
        registry.vault_mut(PositionId(2)).deposit(AssetId(1), amt(5));

        // draining one vault leaves the other byte-identical
        let before = registry.vault(PositionId(2)).unwrap().clone();
        registry.vault_mut(PositionId(1)).drain();
        let after = registry.vault(PositionId(2)).unwrap();
        assert_eq!(after.balance(AssetId(1)), before.balance(AssetId(1)));
    }
}
