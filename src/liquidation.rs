//! Liquidation math and conditions.
//!
//! A position is liquidatable when its health factor (credit limit over live
//! debt value) drops below one. Liquidation is all-or-nothing per position:
//! the liquidator pays the discounted debt and receives the entire collateral
//! basket. No partial liquidation exists, which keeps per-position isolation
//! trivial and never leaves under-collateralized residual debt behind.

use crate::tier::Tier;
use crate::types::{Amount, Bps, Usd};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidationParams {
    // governance-token stake a liquidator must hold. anti-griefing bond,
    // not a capital requirement on the debt.
    pub min_liquidator_stake: Amount,
    // health factor below which a position is flagged as at-risk
    pub at_risk_threshold: Decimal,
}

impl Default for LiquidationParams {
    fn default() -> Self {
        Self {
            min_liquidator_stake: Amount::new_unchecked(dec!(100)),
            at_risk_threshold: dec!(1.1),
        }
    }
}

// credit limit / debt value. a debt-free position is infinitely healthy.
pub fn health_factor(credit_limit: Usd, debt_value: Usd) -> Decimal {
    if debt_value.value() <= Decimal::ZERO {
        return Decimal::MAX;
    }
    credit_limit.value() / debt_value.value()
}

#[derive(Debug, Clone, PartialEq)]
pub enum HealthStatus {
    Healthy {
        health_factor: Decimal,
    },
    AtRisk {
        health_factor: Decimal,
    },
    Liquidatable {
        health_factor: Decimal,
        shortfall: Usd,
    },
}

pub fn evaluate_health(
    credit_limit: Usd,
    debt_value: Usd,
    params: &LiquidationParams,
) -> HealthStatus {
    let hf = health_factor(credit_limit, debt_value);

    if hf < Decimal::ONE {
        return HealthStatus::Liquidatable {
            health_factor: hf,
            shortfall: debt_value.sub(credit_limit),
        };
    }
    if hf < params.at_risk_threshold {
        return HealthStatus::AtRisk { health_factor: hf };
    }
    HealthStatus::Healthy { health_factor: hf }
}

pub fn is_liquidatable(credit_limit: Usd, debt_value: Usd) -> bool {
    health_factor(credit_limit, debt_value) < Decimal::ONE
}

// 6.2: the liquidator's bonus, weighted by each collateral asset's USD share
// of the basket. a single-asset position gets exactly its tier's bonus.
pub fn weighted_bonus(collateral_values: &[(Tier, Usd)]) -> Decimal {
    let total: Decimal = collateral_values.iter().map(|(_, v)| v.value()).sum();
    if total <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let weighted: Decimal = collateral_values
        .iter()
        .map(|(tier, v)| tier.liquidation_bonus() * v.value())
        .sum();
    weighted / total
}

#[derive(Debug, Clone)]
pub struct LiquidationQuote {
    // full debt being closed, base-asset units
    pub debt: Amount,
    // what the liquidator actually pays: debt discounted by the bonus
    pub cost: Amount,
    pub bonus: Decimal,
}

pub fn quote_liquidation(debt: Amount, collateral_values: &[(Tier, Usd)]) -> LiquidationQuote {
    let bonus = weighted_bonus(collateral_values);
    let cost = Amount::new_unchecked(debt.value() * (Decimal::ONE - bonus));
    LiquidationQuote { debt, cost, bonus }
}

// deviation of actual from expected, measured against expected, in fraction
// form. expected == 0 only matches actual == 0.
pub fn within_slippage(expected: Amount, actual: Amount, max_slippage: Bps) -> bool {
    if expected.is_zero() {
        return actual.is_zero();
    }
    let deviation = (actual.value() - expected.value()).abs() / expected.value();
    deviation <= max_slippage.as_fraction()
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum LiquidationError {
    #[error("Position is not liquidatable: health factor {health_factor}")]
    NotLiquidatable { health_factor: Decimal },

    #[error("Not enough governance tokens staked: held {held}, required {required}")]
    NotEnoughGovernanceTokens { held: Amount, required: Amount },

    #[error("Slippage exceeded: expected cost {expected}, actual {actual}, max {max_bps:?}")]
    SlippageExceeded {
        expected: Amount,
        actual: Amount,
        max_bps: Bps,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn usd(v: Decimal) -> Usd {
        Usd::new(v)
    }

    #[test]
    fn health_factor_boundary() {
        assert_eq!(health_factor(usd(dec!(100)), usd(dec!(100))), dec!(1));
        assert!(health_factor(usd(dec!(99)), usd(dec!(100))) < Decimal::ONE);
        assert_eq!(health_factor(usd(dec!(100)), Usd::zero()), Decimal::MAX);
    }

    #[test]
    fn liquidatable_strictly_below_one() {
        // exactly at the limit is NOT liquidatable
        assert!(!is_liquidatable(usd(dec!(16000)), usd(dec!(16000))));
        assert!(is_liquidatable(usd(dec!(15999)), usd(dec!(16000))));
    }

    #[test]
    fn evaluate_health_bands() {
        let params = LiquidationParams::default();

        let healthy = evaluate_health(usd(dec!(200)), usd(dec!(100)), &params);
        assert!(matches!(healthy, HealthStatus::Healthy { .. }));

        let at_risk = evaluate_health(usd(dec!(105)), usd(dec!(100)), &params);
        assert!(matches!(at_risk, HealthStatus::AtRisk { .. }));

        let liq = evaluate_health(usd(dec!(80)), usd(dec!(100)), &params);
        match liq {
            HealthStatus::Liquidatable { shortfall, .. } => {
                assert_eq!(shortfall.value(), dec!(20));
            }
            other => panic!("expected liquidatable, got {other:?}"),
        }
    }

    #[test]
    fn single_asset_bonus_is_tier_bonus() {
        let values = [(Tier::CrossA, usd(dec!(10000)))];
        assert_eq!(weighted_bonus(&values), dec!(0.02));
    }

    #[test]
    fn mixed_basket_bonus_is_value_weighted() {
        // 75% CrossA (2%) + 25% CrossB (3%) = 2.25%
        let values = [
            (Tier::CrossA, usd(dec!(7500))),
            (Tier::CrossB, usd(dec!(2500))),
        ];
        assert_eq!(weighted_bonus(&values), dec!(0.0225));
    }

    #[test]
    fn quote_discounts_cost_by_bonus() {
        let debt = Amount::new_unchecked(dec!(10000));
        let values = [(Tier::CrossA, usd(dec!(12000)))];

        let quote = quote_liquidation(debt, &values);
        assert_eq!(quote.bonus, dec!(0.02));
        assert_eq!(quote.cost.value(), dec!(9800)); // 2% off the debt
    }

    #[test]
    fn empty_basket_has_no_bonus() {
        let quote = quote_liquidation(Amount::new_unchecked(dec!(100)), &[]);
        assert_eq!(quote.bonus, Decimal::ZERO);
        assert_eq!(quote.cost.value(), dec!(100));
    }

    #[test]
    fn slippage_tolerance() {
        let expected = Amount::new_unchecked(dec!(10000));
        let max = Bps::new(50); // 0.5%

        assert!(within_slippage(expected, Amount::new_unchecked(dec!(10000)), max));
        assert!(within_slippage(expected, Amount::new_unchecked(dec!(10050)), max));
        assert!(within_slippage(expected, Amount::new_unchecked(dec!(9950)), max));
        assert!(!within_slippage(expected, Amount::new_unchecked(dec!(10051)), max));
        assert!(!within_slippage(expected, Amount::new_unchecked(dec!(9949)), max));
    }
}
