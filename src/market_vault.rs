// 8.0 market_vault.rs: the pooled base-asset vault. lenders deposit against
// proportional yield shares; borrow disbursements and repayments flow through
// here. total_base is stored redundantly and re-checked against
// idle_balance + total_borrow after every mutation: a mismatch is a fatal
// integrity error, never silently tolerated.
//
// share price = total_base / total_shares. it only moves up: deposits mint at
// the current price, withdrawals burn at the current price, and total_base
// only grows from real interest and flash-loan fee inflows.

use crate::mev_guard::{GuardScope, MevError, MevGuard};
use crate::rate_model;
use crate::types::{AccountId, Amount, Bps, Timestamp};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultParams {
    // virtual protocol fee threshold, base-asset units
    pub fee_target: Amount,
    // flash loan fee
    pub flash_loan_fee: Bps,
}

impl Default for VaultParams {
    fn default() -> Self {
        Self {
            fee_target: Amount::new_unchecked(dec!(1000)),
            flash_loan_fee: Bps::new(9),
        }
    }
}

// reporting-only reserve transparency figure, refreshed by perform_upkeep
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReserveReport {
    pub total_borrow: Amount,
    pub total_supplied_liquidity: Amount,
    pub utilization: Decimal,
    pub updated_at: Timestamp,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketVault {
    params: VaultParams,
    // stored identity: must equal idle_balance + total_borrow at all times
    total_base: Amount,
    idle_balance: Amount,
    total_borrow: Amount,
    total_shares: Amount,
    share_balances: HashMap<AccountId, Amount>,
    // lender principal still in the pool (deposits minus withdrawals)
    total_supplied_liquidity: Amount,
    // interest actually collected into the pool
    total_accrued_interest: Amount,
    // interest booked onto borrower debt at accrual time. monotone, written
    // only by accrual paths, never decremented.
    total_accrued_borrower_interest: Amount,
    guard: MevGuard,
    reserve_report: Option<ReserveReport>,
}

impl MarketVault {
    pub fn new(params: VaultParams) -> Self {
        Self {
            params,
            total_base: Amount::zero(),
            idle_balance: Amount::zero(),
            total_borrow: Amount::zero(),
            total_shares: Amount::zero(),
            share_balances: HashMap::new(),
            total_supplied_liquidity: Amount::zero(),
            total_accrued_interest: Amount::zero(),
            total_accrued_borrower_interest: Amount::zero(),
            guard: MevGuard::new(),
            reserve_report: None,
        }
    }

    // ===== views =====

    pub fn total_base(&self) -> Amount {
        self.total_base
    }

    pub fn idle_balance(&self) -> Amount {
        self.idle_balance
    }

    pub fn total_borrow(&self) -> Amount {
        self.total_borrow
    }

    pub fn total_shares(&self) -> Amount {
        self.total_shares
    }

    pub fn total_supplied_liquidity(&self) -> Amount {
        self.total_supplied_liquidity
    }

    pub fn total_accrued_interest(&self) -> Amount {
        self.total_accrued_interest
    }

    pub fn total_accrued_borrower_interest(&self) -> Amount {
        self.total_accrued_borrower_interest
    }

    pub fn share_balance(&self, account: AccountId) -> Amount {
        self.share_balances
            .get(&account)
            .copied()
            .unwrap_or_else(Amount::zero)
    }

    pub fn share_price(&self) -> Decimal {
        if self.total_shares.is_zero() {
            return Decimal::ONE;
        }
        self.total_base.value() / self.total_shares.value()
    }

    pub fn utilization(&self) -> Decimal {
        rate_model::utilization(self.total_borrow.value(), self.total_base.value())
    }

    pub fn reserve_report(&self) -> Option<&ReserveReport> {
        self.reserve_report.as_ref()
    }

    pub fn params(&self) -> &VaultParams {
        &self.params
    }

    // governance-controlled knob, routed through the engine
    pub fn set_fee_target(&mut self, target: Amount) {
        self.params.fee_target = target;
    }

    // 8.1: virtual fee. computed on demand instead of minting fee shares per
    // accrual: equal to the target once the surplus over lender principal
    // clears it, zero before. identical for every caller at a given state.
    pub fn virtual_fee(&self) -> Amount {
        let reserves = self.idle_balance.add(self.total_borrow);
        let threshold = self.total_supplied_liquidity.add(self.params.fee_target);
        if reserves >= threshold {
            self.params.fee_target
        } else {
            Amount::zero()
        }
    }

    // ===== lender operations (per-account same-block guarded) =====

    pub fn deposit(
        &mut self,
        account: AccountId,
        amount: Amount,
        min_shares_out: Amount,
        now: Timestamp,
    ) -> Result<Amount, VaultError> {
        self.guard.check(GuardScope::Liquidity(account), now)?;

        let shares = Amount::new_unchecked(amount.value() / self.share_price());
        if shares < min_shares_out {
            return Err(VaultError::SlippageExceeded {
                expected: min_shares_out,
                actual: shares,
            });
        }

        self.guard.touch(GuardScope::Liquidity(account), now);
        self.idle_balance = self.idle_balance.add(amount);
        self.total_base = self.total_base.add(amount);
        self.total_supplied_liquidity = self.total_supplied_liquidity.add(amount);
        self.total_shares = self.total_shares.add(shares);
        let balance = self.share_balances.entry(account).or_insert_with(Amount::zero);
        *balance = balance.add(shares);

        self.check_conservation()?;
        Ok(shares)
    }

    // mint an exact share count, paying whatever the current price demands
    pub fn mint_shares(
        &mut self,
        account: AccountId,
        shares: Amount,
        max_amount_in: Amount,
        now: Timestamp,
    ) -> Result<Amount, VaultError> {
        self.guard.check(GuardScope::Liquidity(account), now)?;

        let amount = Amount::new_unchecked(shares.value() * self.share_price());
        if amount > max_amount_in {
            return Err(VaultError::SlippageExceeded {
                expected: max_amount_in,
                actual: amount,
            });
        }

        self.guard.touch(GuardScope::Liquidity(account), now);
        self.idle_balance = self.idle_balance.add(amount);
        self.total_base = self.total_base.add(amount);
        self.total_supplied_liquidity = self.total_supplied_liquidity.add(amount);
        self.total_shares = self.total_shares.add(shares);
        let balance = self.share_balances.entry(account).or_insert_with(Amount::zero);
        *balance = balance.add(shares);

        self.check_conservation()?;
        Ok(amount)
    }

    // withdraw an exact base amount, burning the matching shares
    pub fn withdraw(
        &mut self,
        account: AccountId,
        amount: Amount,
        min_amount_out: Amount,
        now: Timestamp,
    ) -> Result<Amount, VaultError> {
        let shares = Amount::new_unchecked(amount.value() / self.share_price());
        self.burn_for(account, shares, amount, min_amount_out, now)
    }

    // redeem an exact share count for the base it represents
    pub fn redeem(
        &mut self,
        account: AccountId,
        shares: Amount,
        min_amount_out: Amount,
        now: Timestamp,
    ) -> Result<Amount, VaultError> {
        let amount = Amount::new_unchecked(shares.value() * self.share_price());
        self.burn_for(account, shares, amount, min_amount_out, now)
    }

    fn burn_for(
        &mut self,
        account: AccountId,
        shares: Amount,
        amount: Amount,
        min_amount_out: Amount,
        now: Timestamp,
    ) -> Result<Amount, VaultError> {
        self.guard.check(GuardScope::Liquidity(account), now)?;

        let held = self.share_balance(account);
        if shares > held {
            return Err(VaultError::InsufficientShares {
                requested: shares,
                held,
            });
        }
        if amount > self.idle_balance {
            return Err(VaultError::InsufficientLiquidity {
                requested: amount,
                available: self.idle_balance,
            });
        }
        if amount < min_amount_out {
            return Err(VaultError::SlippageExceeded {
                expected: min_amount_out,
                actual: amount,
            });
        }

        self.guard.touch(GuardScope::Liquidity(account), now);
        self.idle_balance = self.idle_balance.saturating_sub(amount);
        self.total_base = self.total_base.saturating_sub(amount);
        self.total_supplied_liquidity = self.total_supplied_liquidity.saturating_sub(amount);
        self.total_shares = self.total_shares.saturating_sub(shares);
        let balance = self.share_balances.entry(account).or_insert_with(Amount::zero);
        *balance = balance.saturating_sub(shares);

        self.check_conservation()?;
        Ok(amount)
    }

    // ===== borrow-side hooks (called by the engine, not end users) =====

    // principal leaves the idle pool; total_base is unchanged because the
    // outstanding principal stays counted.
    pub fn disburse_borrow(&mut self, amount: Amount) -> Result<(), VaultError> {
        if amount > self.idle_balance {
            return Err(VaultError::InsufficientLiquidity {
                requested: amount,
                available: self.idle_balance,
            });
        }
        self.idle_balance = self.idle_balance.saturating_sub(amount);
        self.total_borrow = self.total_borrow.add(amount);
        self.check_conservation()
    }

    // a repayment arrives split by the ledger. only the interest portion grows
    // total_base; principal was already counted while outstanding.
    pub fn absorb_repayment(&mut self, principal: Amount, interest: Amount) -> Result<(), VaultError> {
        let remaining = self
            .total_borrow
            .checked_sub(principal)
            .ok_or(VaultError::AccountingMismatch {
                detail: "principal repayment exceeds outstanding borrow",
            })?;
        self.total_borrow = remaining;
        self.idle_balance = self.idle_balance.add(principal).add(interest);
        self.total_base = self.total_base.add(interest);
        self.total_accrued_interest = self.total_accrued_interest.add(interest);
        self.check_conservation()
    }

    // interest booked onto borrower debt at accrual time. monotone counter;
    // the cash arrives later through absorb_repayment.
    pub fn book_borrower_interest(&mut self, interest: Amount) {
        self.total_accrued_borrower_interest =
            self.total_accrued_borrower_interest.add(interest);
    }

    // liquidation proceeds: the position's whole principal comes off the books
    // against whatever the liquidator paid. a payment above principal is
    // interest income; below principal is a realized loss eaten by total_base.
    pub fn absorb_liquidation(&mut self, principal: Amount, payment: Amount) -> Result<(), VaultError> {
        let remaining = self
            .total_borrow
            .checked_sub(principal)
            .ok_or(VaultError::AccountingMismatch {
                detail: "liquidated principal exceeds outstanding borrow",
            })?;
        self.total_borrow = remaining;
        self.idle_balance = self.idle_balance.add(payment);
        if payment >= principal {
            let interest = payment.saturating_sub(principal);
            self.total_base = self.total_base.add(interest);
            self.total_accrued_interest = self.total_accrued_interest.add(interest);
        } else {
            self.total_base = self.total_base.saturating_sub(principal.saturating_sub(payment));
        }
        self.check_conservation()
    }

    // ===== flash loan =====

    // transient loan of idle liquidity. the closure receives the amount and
    // returns what it pays back; anything short of amount + fee reverts.
    pub fn flash_loan<F>(
        &mut self,
        account: AccountId,
        amount: Amount,
        now: Timestamp,
        f: F,
    ) -> Result<Amount, VaultError>
    where
        F: FnOnce(Amount) -> Amount,
    {
        self.guard.check(GuardScope::Liquidity(account), now)?;
        if amount > self.idle_balance {
            return Err(VaultError::InsufficientLiquidity {
                requested: amount,
                available: self.idle_balance,
            });
        }

        let fee = Amount::new_unchecked(amount.value() * self.params.flash_loan_fee.as_fraction());
        let required = amount.add(fee);
        let returned = f(amount);
        if returned < required {
            return Err(VaultError::FlashLoanNotRepaid { required, returned });
        }

        self.guard.touch(GuardScope::Liquidity(account), now);
        let profit = returned.saturating_sub(amount);
        self.idle_balance = self.idle_balance.add(profit);
        self.total_base = self.total_base.add(profit);
        self.total_accrued_interest = self.total_accrued_interest.add(profit);
        self.check_conservation()?;
        Ok(fee)
    }

    // ===== upkeep =====

    // reporting only. callable by anyone, touches no core balances.
    pub fn perform_upkeep(&mut self, now: Timestamp) -> ReserveReport {
        let report = ReserveReport {
            total_borrow: self.total_borrow,
            total_supplied_liquidity: self.total_supplied_liquidity,
            utilization: self.utilization(),
            updated_at: now,
        };
        self.reserve_report = Some(report);
        report
    }

    // the stored identity re-derived. called after every mutation.
    fn check_conservation(&self) -> Result<(), VaultError> {
        if self.total_base != self.idle_balance.add(self.total_borrow) {
            return Err(VaultError::AccountingMismatch {
                detail: "total_base != idle_balance + total_borrow",
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum VaultError {
    #[error("Slippage exceeded: expected {expected}, actual {actual}")]
    SlippageExceeded { expected: Amount, actual: Amount },

    #[error("Insufficient liquidity: requested {requested}, available {available}")]
    InsufficientLiquidity { requested: Amount, available: Amount },

    #[error("Insufficient shares: requested {requested}, held {held}")]
    InsufficientShares { requested: Amount, held: Amount },

    #[error("Flash loan not repaid: required {required}, returned {returned}")]
    FlashLoanNotRepaid { required: Amount, returned: Amount },

    #[error("Accounting mismatch: {detail}")]
    AccountingMismatch { detail: &'static str },

    #[error(transparent)]
    Mev(#[from] MevError),
}
