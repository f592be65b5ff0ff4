// 2.0: risk tiers for collateral assets. a closed enum with a constant table per
// variant: collateral factor (credit weight), liquidation bonus, rate multiplier.
// Stable is the safest (highest factor, smallest bonus), Isolated the riskiest.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    Stable,
    CrossA,
    CrossB,
    Isolated,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Stable, Tier::CrossA, Tier::CrossB, Tier::Isolated];

    // credit weight applied to collateral value. strictly decreasing with risk.
    pub fn collateral_factor(&self) -> Decimal {
        match self {
            Tier::Stable => dec!(0.90),
            Tier::CrossA => dec!(0.80),
            Tier::CrossB => dec!(0.70),
            Tier::Isolated => dec!(0.50),
        }
    }

    // discount on the liquidator's effective payment when seizing this tier
    pub fn liquidation_bonus(&self) -> Decimal {
        match self {
            Tier::Stable => dec!(0.01),
            Tier::CrossA => dec!(0.02),
            Tier::CrossB => dec!(0.03),
            Tier::Isolated => dec!(0.04),
        }
    }

    // scales the borrow rate curve. riskier collateral pays more.
    pub fn rate_multiplier(&self) -> Decimal {
        match self {
            Tier::Stable => dec!(0.8),
            Tier::CrossA => dec!(1.0),
            Tier::CrossB => dec!(1.2),
            Tier::Isolated => dec!(1.5),
        }
    }

    // isolated-tier assets may only back single-asset isolated positions
    pub fn is_isolated(&self) -> bool {
        matches!(self, Tier::Isolated)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tier::Stable => "STABLE",
            Tier::CrossA => "CROSS_A",
            Tier::CrossB => "CROSS_B",
            Tier::Isolated => "ISOLATED",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn collateral_factors_strictly_decreasing() {
        let factors: Vec<Decimal> = Tier::ALL.iter().map(|t| t.collateral_factor()).collect();
        for pair in factors.windows(2) {
            assert!(pair[0] > pair[1], "factors must strictly decrease with risk");
        }
    }

    #[test]
    fn liquidation_bonuses_increase_with_risk() {
        assert_eq!(Tier::Stable.liquidation_bonus(), dec!(0.01));
        assert_eq!(Tier::CrossA.liquidation_bonus(), dec!(0.02));
        assert_eq!(Tier::CrossB.liquidation_bonus(), dec!(0.03));
        assert_eq!(Tier::Isolated.liquidation_bonus(), dec!(0.04));
    }

    #[test]
    fn only_isolated_tier_is_isolated() {
        assert!(Tier::Isolated.is_isolated());
        assert!(!Tier::Stable.is_isolated());
        assert!(!Tier::CrossA.is_isolated());
        assert!(!Tier::CrossB.is_isolated());
    }
}
