// 11.2 engine/positions.rs: borrower-facing entry points. each op resolves the
// position's rate and the base-asset price, delegates the guarded mutation to
// the ledger, settles the vault side, and emits events.

use super::core::Market;
use super::results::{BorrowResult, MarketError, RepayResult};
use crate::events::{
    BorrowedEvent, CloseReason, CollateralSuppliedEvent, CollateralWithdrawnEvent, EventPayload,
    InterestAccruedEvent, PositionClosedEvent, PositionOpenedEvent, RepaidEvent,
};
use crate::market_vault::VaultError;
use crate::position::CollateralEntry;
use crate::types::{AccountId, Amount, AssetId, PositionId, Price};
use rust_decimal::Decimal;

impl Market {
    pub fn open_position(
        &mut self,
        caller: AccountId,
        is_isolated: bool,
    ) -> Result<PositionId, MarketError> {
        let id = self.ledger.open_position(caller, is_isolated, self.current_time)?;
        self.emit_event(EventPayload::PositionOpened(PositionOpenedEvent {
            market_id: self.params.market.id,
            owner: caller,
            position_id: id,
            is_isolated,
        }));
        Ok(id)
    }

    pub fn supply_collateral(
        &mut self,
        caller: AccountId,
        id: PositionId,
        asset: AssetId,
        amount: Amount,
    ) -> Result<(), MarketError> {
        let now = self.current_time;
        self.ledger
            .supply_collateral(caller, id, asset, amount, &self.registry, now)?;
        let new_tvl_native = self
            .ledger
            .asset_tracking(asset)
            .map(|t| t.tvl_native)
            .unwrap_or_else(Amount::zero);
        self.emit_event(EventPayload::CollateralSupplied(CollateralSuppliedEvent {
            position_id: id,
            asset,
            amount,
            new_tvl_native,
        }));
        Ok(())
    }

    pub fn withdraw_collateral(
        &mut self,
        caller: AccountId,
        id: PositionId,
        asset: AssetId,
        amount: Amount,
    ) -> Result<(), MarketError> {
        let now = self.current_time;
        let rate = self.position_borrow_rate(id)?;
        // a debt-free position never consults the base price
        let base_price = if self.ledger.position(id)?.has_debt() {
            self.base_price()?
        } else {
            Price::new_unchecked(Decimal::ONE)
        };
        let accrued = self.ledger.withdraw_collateral(
            caller,
            id,
            asset,
            amount,
            &self.registry,
            rate,
            base_price,
            now,
        )?;
        self.vault.book_borrower_interest(accrued);
        if !accrued.is_zero() {
            self.emit_event(EventPayload::InterestAccrued(InterestAccruedEvent {
                position_id: id,
                interest: accrued,
                borrow_rate: rate,
            }));
        }
        let new_tvl_native = self
            .ledger
            .asset_tracking(asset)
            .map(|t| t.tvl_native)
            .unwrap_or_else(Amount::zero);
        self.emit_event(EventPayload::CollateralWithdrawn(CollateralWithdrawnEvent {
            position_id: id,
            asset,
            amount,
            new_tvl_native,
        }));
        Ok(())
    }

    // draw base asset against the collateral basket. the vault's idle pool is
    // checked up front so the ledger never commits a draw the vault cannot fund.
    pub fn borrow(
        &mut self,
        caller: AccountId,
        id: PositionId,
        amount: Amount,
    ) -> Result<BorrowResult, MarketError> {
        let now = self.current_time;
        let rate = self.position_borrow_rate(id)?;
        let base_price = self.base_price()?;

        if amount > self.vault.idle_balance() {
            return Err(MarketError::Vault(VaultError::InsufficientLiquidity {
                requested: amount,
                available: self.vault.idle_balance(),
            }));
        }

        let accrued = self
            .ledger
            .borrow(caller, id, amount, &self.registry, rate, base_price, now)?;
        self.vault.book_borrower_interest(accrued);
        self.vault.disburse_borrow(amount)?;

        let new_debt = self.ledger.position(id)?.booked_debt();
        let credit_limit = self.ledger.credit_limit(id, &self.registry, now)?;

        if !accrued.is_zero() {
            self.emit_event(EventPayload::InterestAccrued(InterestAccruedEvent {
                position_id: id,
                interest: accrued,
                borrow_rate: rate,
            }));
        }
        self.emit_event(EventPayload::Borrowed(BorrowedEvent {
            position_id: id,
            amount,
            new_debt,
            credit_limit,
            borrow_rate: rate,
        }));

        Ok(BorrowResult {
            amount,
            new_debt,
            credit_limit,
            borrow_rate: rate,
        })
    }

    pub fn repay(
        &mut self,
        caller: AccountId,
        id: PositionId,
        amount: Amount,
    ) -> Result<RepayResult, MarketError> {
        let now = self.current_time;
        let rate = self.position_borrow_rate(id)?;

        let (split, accrued) = self.ledger.repay(caller, id, amount, rate, now)?;
        self.vault.book_borrower_interest(accrued);
        self.vault
            .absorb_repayment(split.principal_paid, split.interest_paid)?;

        let remaining_debt = self.ledger.position(id)?.booked_debt();

        if !accrued.is_zero() {
            self.emit_event(EventPayload::InterestAccrued(InterestAccruedEvent {
                position_id: id,
                interest: accrued,
                borrow_rate: rate,
            }));
        }
        self.emit_event(EventPayload::Repaid(RepaidEvent {
            position_id: id,
            interest_paid: split.interest_paid,
            principal_paid: split.principal_paid,
            remaining_debt,
        }));

        Ok(RepayResult {
            interest_paid: split.interest_paid,
            principal_paid: split.principal_paid,
            remaining_debt,
        })
    }

    // full close: debt must be zero, all collateral comes back to the owner.
    pub fn close_position(
        &mut self,
        caller: AccountId,
        id: PositionId,
    ) -> Result<Vec<CollateralEntry>, MarketError> {
        let now = self.current_time;
        let returned = self
            .ledger
            .close_position(caller, id, &self.registry, now)?;
        self.emit_event(EventPayload::PositionClosed(PositionClosedEvent {
            position_id: id,
            owner: caller,
            assets_returned: returned.len(),
            close_reason: CloseReason::UserClosed,
        }));
        Ok(returned)
    }

    // fold pending interest into the booked debt. callable by anyone; the
    // market-wide borrower-interest counter moves in lockstep.
    pub fn accrue_interest(&mut self, id: PositionId) -> Result<Amount, MarketError> {
        let now = self.current_time;
        let rate = self.position_borrow_rate(id)?;
        let accrued = self.ledger.accrue_position(id, rate, now)?;
        self.vault.book_borrower_interest(accrued);
        if !accrued.is_zero() {
            self.emit_event(EventPayload::InterestAccrued(InterestAccruedEvent {
                position_id: id,
                interest: accrued,
                borrow_rate: rate,
            }));
        }
        Ok(accrued)
    }
}
