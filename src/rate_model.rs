// 4.0: interest rate model. pure function from utilization to annual rate,
// kinked at a target utilization: gentle slope below the kink, steep above it.
// a per-tier multiplier scales the whole curve. no state lives here.

use crate::tier::Tier;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateParams {
    // annual rate at zero utilization
    pub base_rate: Decimal,
    // slope below the kink
    pub slope_low: Decimal,
    // slope above the kink
    pub slope_high: Decimal,
    // utilization where the curve kinks, in (0, 1)
    pub kink: Decimal,
    // share of borrower interest withheld from suppliers
    pub reserve_factor: Decimal,
}

impl Default for RateParams {
    fn default() -> Self {
        Self {
            base_rate: dec!(0.01),   // 1%
            slope_low: dec!(0.05),   // +5% per unit utilization below kink
            slope_high: dec!(0.60),  // +60% per unit utilization above kink
            kink: dec!(0.80),
            reserve_factor: dec!(0.10),
        }
    }
}

// utilization = borrowed / total base. clamped to [0, 1].
pub fn utilization(total_borrow: Decimal, total_base: Decimal) -> Decimal {
    if total_base <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    (total_borrow / total_base).clamp(Decimal::ZERO, Decimal::ONE)
}

// 4.1: annual borrow rate. monotonically non-decreasing in utilization.
pub fn borrow_rate(utilization: Decimal, tier: Tier, params: &RateParams) -> Decimal {
    let u = utilization.clamp(Decimal::ZERO, Decimal::ONE);

    let curve = if u <= params.kink {
        params.base_rate + params.slope_low * u
    } else {
        params.base_rate + params.slope_low * params.kink + params.slope_high * (u - params.kink)
    };

    curve * tier.rate_multiplier()
}

// 4.2: annual supply rate. borrowers' interest flows to suppliers pro rata to
// utilization, minus the reserve factor.
pub fn supply_rate(utilization: Decimal, tier: Tier, params: &RateParams) -> Decimal {
    let u = utilization.clamp(Decimal::ZERO, Decimal::ONE);
    borrow_rate(u, tier, params) * u * (Decimal::ONE - params.reserve_factor)
}
