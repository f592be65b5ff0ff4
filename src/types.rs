// 1.0: all the primitives live here. nothing in the engine works without these types.
// IDs, token amounts, USD values, prices, bps, timestamps. each is a newtype so the
// compiler catches type mixups (an Amount of WETH never adds to a Usd value directly).

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MarketId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PositionId(pub u64);

// collateral assets are registered once and referenced by id everywhere after
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AssetId(pub u32);

// 1.1: token quantity in native units. always non-negative; subtraction is checked
// so a ledger bug surfaces as None instead of a silently negative balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Amount(Decimal);

impl Amount {
    #[must_use]
    pub fn new(value: Decimal) -> Option<Self> {
        if value >= Decimal::ZERO {
            Some(Self(value))
        } else {
            None
        }
    }

    pub fn new_unchecked(value: Decimal) -> Self {
        debug_assert!(value >= Decimal::ZERO);
        Self(value)
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn add(&self, other: Amount) -> Self {
        Self(self.0 + other.0)
    }

    pub fn checked_sub(&self, other: Amount) -> Option<Self> {
        if other.0 > self.0 {
            None
        } else {
            Some(Self(self.0 - other.0))
        }
    }

    pub fn saturating_sub(&self, other: Amount) -> Self {
        Self((self.0 - other.0).max(Decimal::ZERO))
    }

    pub fn mul(&self, factor: Decimal) -> Self {
        debug_assert!(factor >= Decimal::ZERO);
        Self(self.0 * factor)
    }

    pub fn min(&self, other: Amount) -> Self {
        Self(self.0.min(other.0))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), |acc, a| acc.add(a))
    }
}

// 1.2: USD-denominated value. credit limits, debt values, TVL all use this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usd(Decimal);

impl Usd {
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn add(&self, other: Usd) -> Self {
        Self(self.0 + other.0)
    }

    pub fn sub(&self, other: Usd) -> Self {
        Self(self.0 - other.0)
    }

    pub fn mul(&self, factor: Decimal) -> Self {
        Self(self.0 * factor)
    }
}

impl fmt::Display for Usd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}", self.0)
    }
}

impl PartialOrd for Usd {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Usd {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl Sum for Usd {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), |acc, u| acc.add(u))
    }
}

// 1.3: USD per native unit of an asset. must be positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Price(Decimal);

impl Price {
    #[must_use]
    pub fn new(value: Decimal) -> Option<Self> {
        if value > Decimal::ZERO {
            Some(Self(value))
        } else {
            None
        }
    }

    pub fn new_unchecked(value: Decimal) -> Self {
        debug_assert!(value > Decimal::ZERO);
        Self(value)
    }

    pub fn value(&self) -> Decimal {
        self.0
    }

    pub fn value_of(&self, amount: Amount) -> Usd {
        Usd::new(self.0 * amount.value())
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// 1.4: basis points. 100 bps = 1%. slippage tolerances and flash fees use this.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Bps(u32);

impl Bps {
    pub fn new(bps: u32) -> Self {
        Self(bps)
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    pub fn as_fraction(&self) -> Decimal {
        Decimal::new(self.0 as i64, 4)
    }
}

// 1.5: millisecond timestamp. one distinct value on the engine clock is the
// "block" the same-block guard operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

pub const MILLIS_PER_YEAR: i64 = 31_536_000_000; // 365 days

impl Timestamp {
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp_millis())
    }

    pub fn from_millis(ms: i64) -> Self {
        Self(ms)
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }

    // fraction of a 365-day year between self and a later timestamp.
    // interest accrual is linear in this.
    pub fn elapsed_years(&self, later: &Timestamp) -> Decimal {
        let diff_ms = (later.0 - self.0).max(0);
        Decimal::new(diff_ms, 0) / dec!(31_536_000_000)
    }

    pub fn elapsed_millis(&self, later: &Timestamp) -> i64 {
        (later.0 - self.0).max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn amount_checked_sub() {
        let a = Amount::new(dec!(10)).unwrap();
        let b = Amount::new(dec!(4)).unwrap();

        assert_eq!(a.checked_sub(b).unwrap().value(), dec!(6));
        assert!(b.checked_sub(a).is_none());
        assert_eq!(b.saturating_sub(a), Amount::zero());
    }

    #[test]
    fn amount_rejects_negative() {
        assert!(Amount::new(dec!(-1)).is_none());
        assert!(Amount::new(dec!(0)).is_some());
    }

    #[test]
    fn price_values_amounts() {
        let price = Price::new_unchecked(dec!(2000));
        let qty = Amount::new(dec!(10)).unwrap();

        assert_eq!(price.value_of(qty).value(), dec!(20000));
    }

    #[test]
    fn bps_conversion() {
        assert_eq!(Bps::new(100).as_fraction(), dec!(0.01)); // 1%
        assert_eq!(Bps::new(9).as_fraction(), dec!(0.0009)); // flash fee default
    }

    #[test]
    fn elapsed_years() {
        let start = Timestamp::from_millis(0);
        let one_year = Timestamp::from_millis(MILLIS_PER_YEAR);
        let half_year = Timestamp::from_millis(MILLIS_PER_YEAR / 2);

        assert_eq!(start.elapsed_years(&one_year), dec!(1));
        assert_eq!(start.elapsed_years(&half_year), dec!(0.5));
        // clock going backwards never produces negative elapsed time
        assert_eq!(one_year.elapsed_years(&start), dec!(0));
    }
}
