// 9.0 config.rs: all settings in one place. market identity, rate curve, vault
// fee params, liquidation bond, price staleness. presets at the bottom.

use crate::liquidation::LiquidationParams;
use crate::market_vault::VaultParams;
use crate::rate_model::RateParams;
use crate::types::{Amount, AssetId, Bps, MarketId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

// Identity of one isolated lending pool. created once, immutable after.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    pub id: MarketId,
    // Human readable market name
    pub name: String,
    // The pooled asset lenders supply and borrowers draw
    pub base_asset: AssetId,
}

impl MarketConfig {
    pub fn usdc_market() -> Self {
        Self {
            id: MarketId(1),
            name: "USDC Lending Market".to_string(),
            base_asset: AssetId(0),
        }
    }
}

// The complete per-market configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketParams {
    pub market: MarketConfig,
    pub rate: RateParams,
    pub vault: VaultParams,
    pub liquidation: LiquidationParams,
    // prices older than this reject the operation
    pub max_price_staleness_ms: i64,
}

impl Default for MarketParams {
    fn default() -> Self {
        Self {
            market: MarketConfig::usdc_market(),
            rate: RateParams::default(),
            vault: VaultParams::default(),
            liquidation: LiquidationParams::default(),
            max_price_staleness_ms: 60_000,
        }
    }
}

impl MarketParams {
    // Conservative preset: steeper curve past the kink, fresher prices,
    // bigger liquidator bond.
    pub fn conservative() -> Self {
        let mut params = Self::default();
        params.rate.kink = dec!(0.70);
        params.rate.slope_high = dec!(1.00);
        params.max_price_staleness_ms = 15_000;
        params.liquidation.min_liquidator_stake = Amount::new_unchecked(dec!(1000));
        params
    }

    // Testnet preset: lax staleness, no liquidator bond, tiny fee target.
    pub fn testnet() -> Self {
        let mut params = Self::default();
        params.max_price_staleness_ms = 600_000;
        params.liquidation.min_liquidator_stake = Amount::zero();
        params.vault.fee_target = Amount::new_unchecked(dec!(10));
        params
    }

    // Validate the configuration for internal consistency
    pub fn validate(&self) -> Result<(), ConfigError> {
        // rate curve checks
        if self.rate.kink <= Decimal::ZERO || self.rate.kink >= Decimal::ONE {
            return Err(ConfigError::InvalidRateCurve {
                reason: "kink must be in (0, 1)".to_string(),
            });
        }
        if self.rate.base_rate < Decimal::ZERO
            || self.rate.slope_low < Decimal::ZERO
            || self.rate.slope_high < Decimal::ZERO
        {
            return Err(ConfigError::InvalidRateCurve {
                reason: "rates and slopes must be non-negative".to_string(),
            });
        }
        if self.rate.reserve_factor < Decimal::ZERO || self.rate.reserve_factor >= Decimal::ONE {
            return Err(ConfigError::InvalidRateCurve {
                reason: "reserve factor must be in [0, 1)".to_string(),
            });
        }

        // vault checks
        if self.vault.flash_loan_fee > Bps::new(100) {
            return Err(ConfigError::InvalidVault {
                reason: "flash loan fee above 1%".to_string(),
            });
        }

        // liquidation checks
        if self.liquidation.at_risk_threshold < Decimal::ONE {
            return Err(ConfigError::InvalidLiquidation {
                reason: "at-risk threshold below the liquidation boundary".to_string(),
            });
        }

        if self.max_price_staleness_ms <= 0 {
            return Err(ConfigError::InvalidOracle {
                reason: "price staleness window must be positive".to_string(),
            });
        }

        Ok(())
    }
}

// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    InvalidRateCurve { reason: String },
    InvalidVault { reason: String },
    InvalidLiquidation { reason: String },
    InvalidOracle { reason: String },
}
