// 5.0: borrower position: an ordered collateral basket plus a two-bucket debt
// (principal borrowed and interest accrued onto it). 5.2 has the accrual rule.

use crate::types::{AccountId, Amount, AssetId, PositionId, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// distinct collateral assets one position may hold
pub const MAX_COLLATERAL_ASSETS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralEntry {
    pub asset: AssetId,
    pub amount: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Position {
    pub owner: AccountId,
    pub id: PositionId,
    // isolated positions hold exactly one Isolated-tier asset
    pub is_isolated: bool,
    // insertion-ordered set, max MAX_COLLATERAL_ASSETS entries
    pub collateral: Vec<CollateralEntry>,
    // base-asset units borrowed, net of principal repayments
    pub debt_principal: Amount,
    // interest folded in at each accrual, paid before principal
    pub accrued_interest: Amount,
    pub last_accrual: Timestamp,
    pub opened_at: Timestamp,
}

impl Position {
    pub fn new(owner: AccountId, id: PositionId, is_isolated: bool, timestamp: Timestamp) -> Self {
        Self {
            owner,
            id,
            is_isolated,
            collateral: Vec::new(),
            debt_principal: Amount::zero(),
            accrued_interest: Amount::zero(),
            last_accrual: timestamp,
            opened_at: timestamp,
        }
    }

    pub fn has_debt(&self) -> bool {
        !self.debt_principal.is_zero() || !self.accrued_interest.is_zero()
    }

    // principal + already-accrued interest. pending interest not included.
    pub fn booked_debt(&self) -> Amount {
        self.debt_principal.add(self.accrued_interest)
    }

    pub fn collateral_amount(&self, asset: AssetId) -> Amount {
        self.collateral
            .iter()
            .find(|e| e.asset == asset)
            .map(|e| e.amount)
            .unwrap_or_else(Amount::zero)
    }

    pub fn holds_asset(&self, asset: AssetId) -> bool {
        self.collateral.iter().any(|e| e.asset == asset)
    }

    pub fn asset_count(&self) -> usize {
        self.collateral.len()
    }

    // caller has already validated the asset-count and isolation rules
    pub fn add_collateral(&mut self, asset: AssetId, amount: Amount) {
        match self.collateral.iter_mut().find(|e| e.asset == asset) {
            Some(entry) => entry.amount = entry.amount.add(amount),
            None => self.collateral.push(CollateralEntry { asset, amount }),
        }
    }

    // removes the entry entirely when the balance hits zero
    pub fn remove_collateral(&mut self, asset: AssetId, amount: Amount) -> Option<Amount> {
        let entry = self.collateral.iter_mut().find(|e| e.asset == asset)?;
        let remaining = entry.amount.checked_sub(amount)?;
        if remaining.is_zero() {
            self.collateral.retain(|e| e.asset != asset);
        } else {
            entry.amount = remaining;
        }
        Some(remaining)
    }

    // 5.1: pure view of the debt at `now` under the live rate, without mutating.
    pub fn debt_with_interest(&self, rate: Decimal, now: Timestamp) -> Amount {
        self.booked_debt().add(self.pending_interest(rate, now))
    }

    pub fn pending_interest(&self, rate: Decimal, now: Timestamp) -> Amount {
        pending_interest(self.booked_debt(), rate, self.last_accrual, now)
    }

    // 5.2: accrual rule: simple interest per interval, compounding across
    // accruals. interest on (principal + accrued) for the elapsed time folds
    // into the accrued bucket and the accrual clock restamps.
    pub fn accrue(&mut self, rate: Decimal, now: Timestamp) -> Amount {
        let interest = self.pending_interest(rate, now);
        self.accrued_interest = self.accrued_interest.add(interest);
        self.last_accrual = now;
        interest
    }

    // 5.3: repayment split: interest first, remainder to principal.
    // call accrue() before this so the interest bucket is current.
    pub fn apply_repayment(&mut self, amount: Amount) -> Option<RepaymentSplit> {
        let total = self.booked_debt();
        if amount > total {
            return None;
        }
        let interest_paid = amount.min(self.accrued_interest);
        let principal_paid = amount.saturating_sub(interest_paid);

        self.accrued_interest = self.accrued_interest.saturating_sub(interest_paid);
        self.debt_principal = self.debt_principal.saturating_sub(principal_paid);

        Some(RepaymentSplit {
            interest_paid,
            principal_paid,
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RepaymentSplit {
    pub interest_paid: Amount,
    pub principal_paid: Amount,
}

// interest = debt * rate * elapsed_years. linear within an interval.
pub fn pending_interest(debt: Amount, rate: Decimal, from: Timestamp, to: Timestamp) -> Amount {
    if debt.is_zero() || rate <= Decimal::ZERO {
        return Amount::zero();
    }
    let elapsed = from.elapsed_years(&to);
    Amount::new_unchecked(debt.value() * rate * elapsed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MILLIS_PER_YEAR;
    use rust_decimal_macros::dec;

    fn test_position() -> Position {
        let mut pos = Position::new(
            AccountId(1),
            PositionId(1),
            false,
            Timestamp::from_millis(0),
        );
        pos.debt_principal = Amount::new(dec!(1000)).unwrap();
        pos
    }

    #[test]
    fn collateral_ordered_set_semantics() {
        let mut pos = test_position();
        pos.add_collateral(AssetId(1), Amount::new(dec!(10)).unwrap());
        pos.add_collateral(AssetId(2), Amount::new(dec!(5)).unwrap());
        pos.add_collateral(AssetId(1), Amount::new(dec!(3)).unwrap());

        assert_eq!(pos.asset_count(), 2);
        assert_eq!(pos.collateral_amount(AssetId(1)).value(), dec!(13));
        assert_eq!(pos.collateral[0].asset, AssetId(1)); // insertion order kept
    }

    #[test]
    fn remove_collateral_drops_empty_entries() {
        let mut pos = test_position();
        pos.add_collateral(AssetId(1), Amount::new(dec!(10)).unwrap());

        let remaining = pos
            .remove_collateral(AssetId(1), Amount::new(dec!(10)).unwrap())
            .unwrap();
        assert!(remaining.is_zero());
        assert_eq!(pos.asset_count(), 0);
    }

    #[test]
    fn remove_more_than_held_fails() {
        let mut pos = test_position();
        pos.add_collateral(AssetId(1), Amount::new(dec!(10)).unwrap());

        assert!(pos
            .remove_collateral(AssetId(1), Amount::new(dec!(11)).unwrap())
            .is_none());
        // balance untouched on failure
        assert_eq!(pos.collateral_amount(AssetId(1)).value(), dec!(10));
    }

    #[test]
    fn one_year_simple_interest() {
        let mut pos = test_position();
        let one_year = Timestamp::from_millis(MILLIS_PER_YEAR);

        let interest = pos.accrue(dec!(0.05), one_year);
        assert_eq!(interest.value(), dec!(50));
        assert_eq!(pos.booked_debt().value(), dec!(1050));
        assert_eq!(pos.last_accrual, one_year);
    }

    #[test]
    fn interest_compounds_across_accruals() {
        // 1000 at 5%/yr with one mid-year accrual: 1025 at six months,
        // then 1025 * (1 + 0.05 * 0.5) = 1050.625 at one year.
        let mut pos = test_position();
        pos.accrue(dec!(0.05), Timestamp::from_millis(MILLIS_PER_YEAR / 2));
        assert_eq!(pos.booked_debt().value(), dec!(1025));

        pos.accrue(dec!(0.05), Timestamp::from_millis(MILLIS_PER_YEAR));
        assert_eq!(pos.booked_debt().value(), dec!(1050.625));
    }

    #[test]
    fn debt_view_does_not_mutate() {
        let pos = test_position();
        let one_year = Timestamp::from_millis(MILLIS_PER_YEAR);

        let debt = pos.debt_with_interest(dec!(0.05), one_year);
        assert_eq!(debt.value(), dec!(1050));
        // accrual clock unchanged by the view
        assert_eq!(pos.last_accrual, Timestamp::from_millis(0));
        assert_eq!(pos.booked_debt().value(), dec!(1000));
    }

    #[test]
    fn repayment_pays_interest_first() {
        let mut pos = test_position();
        pos.accrue(dec!(0.05), Timestamp::from_millis(MILLIS_PER_YEAR));
        // debt now 1000 principal + 50 interest

        let split = pos.apply_repayment(Amount::new(dec!(200)).unwrap()).unwrap();
        assert_eq!(split.interest_paid.value(), dec!(50));
        assert_eq!(split.principal_paid.value(), dec!(150));
        assert_eq!(pos.debt_principal.value(), dec!(850));
        assert!(pos.accrued_interest.is_zero());
    }

    #[test]
    fn overpayment_rejected() {
        let mut pos = test_position();
        assert!(pos.apply_repayment(Amount::new(dec!(1001)).unwrap()).is_none());
        // nothing changed
        assert_eq!(pos.booked_debt().value(), dec!(1000));
    }

    #[test]
    fn zero_rate_accrues_nothing() {
        let mut pos = test_position();
        let interest = pos.accrue(dec!(0), Timestamp::from_millis(MILLIS_PER_YEAR));
        assert!(interest.is_zero());
    }
}
