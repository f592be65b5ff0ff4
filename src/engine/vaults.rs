// 11.4 engine/vaults.rs: lender-facing liquidity entry points plus the flash
// loan and upkeep surfaces. thin wrappers over the vault that add events.

use super::core::Market;
use super::results::MarketError;
use crate::events::{EventPayload, FlashLoanEvent, LiquidityEvent, ReserveReportEvent};
use crate::market_vault::ReserveReport;
use crate::types::{AccountId, Amount};

impl Market {
    pub fn deposit_liquidity(
        &mut self,
        account: AccountId,
        amount: Amount,
        min_shares_out: Amount,
    ) -> Result<Amount, MarketError> {
        let now = self.current_time;
        let shares = self.vault.deposit(account, amount, min_shares_out, now)?;
        let share_price = self.vault.share_price();
        self.emit_event(EventPayload::LiquidityDeposited(LiquidityEvent {
            account,
            amount,
            shares,
            share_price,
        }));
        Ok(shares)
    }

    pub fn mint_shares(
        &mut self,
        account: AccountId,
        shares: Amount,
        max_amount_in: Amount,
    ) -> Result<Amount, MarketError> {
        let now = self.current_time;
        let amount = self.vault.mint_shares(account, shares, max_amount_in, now)?;
        let share_price = self.vault.share_price();
        self.emit_event(EventPayload::LiquidityDeposited(LiquidityEvent {
            account,
            amount,
            shares,
            share_price,
        }));
        Ok(amount)
    }

    pub fn withdraw_liquidity(
        &mut self,
        account: AccountId,
        amount: Amount,
        min_amount_out: Amount,
    ) -> Result<Amount, MarketError> {
        let now = self.current_time;
        // shares burned at the pre-withdrawal price; the price itself is
        // unchanged by a proportional burn
        let shares = Amount::new_unchecked(amount.value() / self.vault.share_price());
        let out = self.vault.withdraw(account, amount, min_amount_out, now)?;
        let share_price = self.vault.share_price();
        self.emit_event(EventPayload::LiquidityWithdrawn(LiquidityEvent {
            account,
            amount: out,
            shares,
            share_price,
        }));
        Ok(out)
    }

    pub fn redeem_shares(
        &mut self,
        account: AccountId,
        shares: Amount,
        min_amount_out: Amount,
    ) -> Result<Amount, MarketError> {
        let now = self.current_time;
        let out = self.vault.redeem(account, shares, min_amount_out, now)?;
        let share_price = self.vault.share_price();
        self.emit_event(EventPayload::LiquidityWithdrawn(LiquidityEvent {
            account,
            amount: out,
            shares,
            share_price,
        }));
        Ok(out)
    }

    // transient loan of idle liquidity, settled inside the closure
    pub fn flash_loan<F>(
        &mut self,
        account: AccountId,
        amount: Amount,
        f: F,
    ) -> Result<Amount, MarketError>
    where
        F: FnOnce(Amount) -> Amount,
    {
        let now = self.current_time;
        let fee = self.vault.flash_loan(account, amount, now, f)?;
        self.emit_event(EventPayload::FlashLoan(FlashLoanEvent {
            account,
            amount,
            fee,
        }));
        Ok(fee)
    }

    // reporting only, callable by anyone
    pub fn perform_upkeep(&mut self) -> ReserveReport {
        let report = self.vault.perform_upkeep(self.current_time);
        self.emit_event(EventPayload::ReserveReportUpdated(ReserveReportEvent {
            total_borrow: report.total_borrow,
            total_supplied_liquidity: report.total_supplied_liquidity,
            utilization: report.utilization,
        }));
        report
    }

    pub fn virtual_fee(&self) -> Amount {
        self.vault.virtual_fee()
    }
}
