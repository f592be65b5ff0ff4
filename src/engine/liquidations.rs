// 11.3 engine/liquidations.rs: all-or-nothing liquidation flow. every check
// runs before anything mutates: bond, health, quote, slippage. only then does
// the position fold its interest, leave the ledger, and settle the vault.

use super::core::Market;
use super::results::{LiquidationOutcome, MarketError};
use crate::events::{CloseReason, EventPayload, LiquidatedEvent, PositionClosedEvent};
use crate::liquidation::{self, HealthStatus, LiquidationError};
use crate::types::{AccountId, Amount, Bps, PositionId, Usd};

impl Market {
    // health of one position at the current clock and rates
    pub fn position_health(&self, id: PositionId) -> Result<HealthStatus, MarketError> {
        let (limit, debt_usd) = self.risk_figures(id)?;
        Ok(liquidation::evaluate_health(
            limit,
            debt_usd,
            &self.params.liquidation,
        ))
    }

    pub fn is_position_liquidatable(&self, id: PositionId) -> Result<bool, MarketError> {
        let (limit, debt_usd) = self.risk_figures(id)?;
        Ok(liquidation::is_liquidatable(limit, debt_usd))
    }

    pub fn liquidate(
        &mut self,
        liquidator: AccountId,
        id: PositionId,
        expected_cost: Amount,
        max_slippage: Bps,
    ) -> Result<LiquidationOutcome, MarketError> {
        let now = self.current_time;

        // the anti-griefing bond comes first
        let required = self.params.liquidation.min_liquidator_stake;
        let held = self.governance_stake(liquidator);
        if held < required {
            return Err(LiquidationError::NotEnoughGovernanceTokens { held, required }.into());
        }

        let rate = self.position_borrow_rate(id)?;
        let base_price = self.base_price()?;
        let debt = self.ledger.debt_with_interest(id, rate, now)?;
        let debt_usd = base_price.value_of(debt);
        let limit = self.ledger.credit_limit(id, &self.registry, now)?;
        if !liquidation::is_liquidatable(limit, debt_usd) {
            return Err(LiquidationError::NotLiquidatable {
                health_factor: liquidation::health_factor(limit, debt_usd),
            }
            .into());
        }

        // value the basket per tier for the weighted bonus
        let position = self.ledger.position(id)?;
        let owner = position.owner;
        let principal = position.debt_principal;
        let mut values = Vec::with_capacity(position.collateral.len());
        for entry in &position.collateral {
            let tier = self.registry.tier(entry.asset)?;
            let price = self.registry.price(entry.asset, now)?;
            values.push((tier, price.value_of(entry.amount)));
        }

        let quote = liquidation::quote_liquidation(debt, &values);
        if !liquidation::within_slippage(expected_cost, quote.cost, max_slippage) {
            return Err(LiquidationError::SlippageExceeded {
                expected: expected_cost,
                actual: quote.cost,
                max_bps: max_slippage,
            }
            .into());
        }

        // commit: the accrual passes through the same-block guard, so a
        // position touched this block cannot be liquidated in it either
        let accrued = self.ledger.accrue_position(id, rate, now)?;
        self.vault.book_borrower_interest(accrued);
        let (debt_closed, seized) = self.ledger.seize_position(id, &self.registry, now)?;
        self.vault.absorb_liquidation(principal, quote.cost)?;

        self.emit_event(EventPayload::Liquidated(LiquidatedEvent {
            position_id: id,
            owner,
            liquidator,
            debt_closed,
            cost_paid: quote.cost,
            bonus: quote.bonus,
            assets_seized: seized.len(),
        }));
        self.emit_event(EventPayload::PositionClosed(PositionClosedEvent {
            position_id: id,
            owner,
            assets_returned: seized.len(),
            close_reason: CloseReason::Liquidation,
        }));

        Ok(LiquidationOutcome {
            debt_closed,
            cost_paid: quote.cost,
            bonus: quote.bonus,
            seized,
        })
    }

    fn risk_figures(&self, id: PositionId) -> Result<(Usd, Usd), MarketError> {
        let now = self.current_time;
        let limit = self.ledger.credit_limit(id, &self.registry, now)?;
        let position = self.ledger.position(id)?;
        if !position.has_debt() {
            return Ok((limit, Usd::zero()));
        }
        let rate = self.position_borrow_rate(id)?;
        let debt = position.debt_with_interest(rate, now);
        let debt_usd = self.base_price()?.value_of(debt);
        Ok((limit, debt_usd))
    }
}
