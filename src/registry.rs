// 3.0: collateral registry. per-asset static config (tier, isolation debt cap)
// plus the live USD price with a staleness check. every credit-limit and health
// check reads prices through here; a stale price rejects the whole operation.

use crate::tier::Tier;
use crate::types::{Amount, AssetId, Price, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// protocol-wide cap on distinct registered collateral assets
pub const MAX_REGISTERED_ASSETS: usize = 3000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetConfig {
    pub asset: AssetId,
    pub tier: Tier,
    // cap on total debt backed by this asset across all isolated positions,
    // denominated in base-asset units. ignored for non-isolated tiers.
    pub isolation_debt_cap: Amount,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct PricePoint {
    price: Price,
    updated_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollateralRegistry {
    assets: HashMap<AssetId, AssetConfig>,
    prices: HashMap<AssetId, PricePoint>,
    // prices older than this are rejected
    max_price_staleness_ms: i64,
}

impl CollateralRegistry {
    pub fn new(max_price_staleness_ms: i64) -> Self {
        Self {
            assets: HashMap::new(),
            prices: HashMap::new(),
            max_price_staleness_ms,
        }
    }

    pub fn register_asset(
        &mut self,
        asset: AssetId,
        tier: Tier,
        isolation_debt_cap: Amount,
    ) -> Result<(), RegistryError> {
        if self.assets.contains_key(&asset) {
            return Err(RegistryError::AssetAlreadyRegistered(asset));
        }
        if self.assets.len() >= MAX_REGISTERED_ASSETS {
            return Err(RegistryError::AssetLimitReached {
                limit: MAX_REGISTERED_ASSETS,
            });
        }
        self.assets.insert(
            asset,
            AssetConfig {
                asset,
                tier,
                isolation_debt_cap,
            },
        );
        Ok(())
    }

    pub fn is_whitelisted(&self, asset: AssetId) -> bool {
        self.assets.contains_key(&asset)
    }

    pub fn asset_count(&self) -> usize {
        self.assets.len()
    }

    pub fn tier(&self, asset: AssetId) -> Result<Tier, RegistryError> {
        self.assets
            .get(&asset)
            .map(|c| c.tier)
            .ok_or(RegistryError::AssetNotWhitelisted(asset))
    }

    pub fn isolation_debt_cap(&self, asset: AssetId) -> Result<Amount, RegistryError> {
        self.assets
            .get(&asset)
            .map(|c| c.isolation_debt_cap)
            .ok_or(RegistryError::AssetNotWhitelisted(asset))
    }

    pub fn set_price(&mut self, asset: AssetId, price: Price, now: Timestamp) {
        self.prices.insert(
            asset,
            PricePoint {
                price,
                updated_at: now,
            },
        );
    }

    // staleness-checked price read. integrity failure, not a caller mistake.
    pub fn price(&self, asset: AssetId, now: Timestamp) -> Result<Price, RegistryError> {
        if !self.assets.contains_key(&asset) {
            return Err(RegistryError::AssetNotWhitelisted(asset));
        }
        let point = self
            .prices
            .get(&asset)
            .ok_or(RegistryError::NoPriceData(asset))?;

        let age_ms = point.updated_at.elapsed_millis(&now);
        if age_ms > self.max_price_staleness_ms {
            return Err(RegistryError::StalePriceData {
                asset,
                age_ms,
                max_age_ms: self.max_price_staleness_ms,
            });
        }
        Ok(point.price)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum RegistryError {
    #[error("Asset {0:?} is not whitelisted")]
    AssetNotWhitelisted(AssetId),

    #[error("Asset {0:?} is already registered")]
    AssetAlreadyRegistered(AssetId),

    #[error("Registered asset limit reached ({limit})")]
    AssetLimitReached { limit: usize },

    #[error("No price data for asset {0:?}")]
    NoPriceData(AssetId),

    #[error("Stale price for asset {asset:?}: {age_ms}ms old, max {max_age_ms}ms")]
    StalePriceData {
        asset: AssetId,
        age_ms: i64,
        max_age_ms: i64,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn registry_with_weth() -> CollateralRegistry {
        let mut registry = CollateralRegistry::new(60_000);
        registry
            .register_asset(AssetId(1), Tier::CrossA, Amount::zero())
            .unwrap();
        registry
    }

    #[test]
    fn register_and_read_back() {
        let registry = registry_with_weth();
        assert!(registry.is_whitelisted(AssetId(1)));
        assert_eq!(registry.tier(AssetId(1)).unwrap(), Tier::CrossA);
        assert!(!registry.is_whitelisted(AssetId(2)));
    }

    #[test]
    fn duplicate_registration_rejected() {
        let mut registry = registry_with_weth();
        let result = registry.register_asset(AssetId(1), Tier::Stable, Amount::zero());
        assert!(matches!(
            result,
            Err(RegistryError::AssetAlreadyRegistered(_))
        ));
    }

    #[test]
    fn fresh_price_accepted() {
        let mut registry = registry_with_weth();
        registry.set_price(
            AssetId(1),
            Price::new_unchecked(dec!(2000)),
            Timestamp::from_millis(1000),
        );

        let price = registry
            .price(AssetId(1), Timestamp::from_millis(30_000))
            .unwrap();
        assert_eq!(price.value(), dec!(2000));
    }

    #[test]
    fn stale_price_rejected() {
        let mut registry = registry_with_weth();
        registry.set_price(
            AssetId(1),
            Price::new_unchecked(dec!(2000)),
            Timestamp::from_millis(0),
        );

        let result = registry.price(AssetId(1), Timestamp::from_millis(60_001));
        assert!(matches!(result, Err(RegistryError::StalePriceData { .. })));
    }

    #[test]
    fn missing_price_rejected() {
        let registry = registry_with_weth();
        let result = registry.price(AssetId(1), Timestamp::from_millis(0));
        assert!(matches!(result, Err(RegistryError::NoPriceData(_))));
    }

    #[test]
    fn unknown_asset_price_rejected() {
        let registry = registry_with_weth();
        let result = registry.price(AssetId(99), Timestamp::from_millis(0));
        assert!(matches!(result, Err(RegistryError::AssetNotWhitelisted(_))));
    }
}
