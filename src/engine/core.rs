// 11.1 engine/core.rs: main market struct. registry, ledger, vault, governance
// stakes, logical clock, and the event log all live here.

use super::config::MarketOptions;
use super::results::MarketError;
use crate::config::MarketParams;
use crate::events::{Event, EventId, EventPayload, PriceUpdatedEvent};
use crate::ledger::PositionLedger;
use crate::market_vault::MarketVault;
use crate::rate_model::{self, RateParams};
use crate::registry::CollateralRegistry;
use crate::tier::Tier;
use crate::types::{AccountId, Amount, AssetId, PositionId, Price, Timestamp};
use rust_decimal::Decimal;
use std::collections::HashMap;

/** 11.1: one isolated lending market. all state lives here */
#[derive(Debug)]
pub struct Market {
    pub(super) options: MarketOptions,
    pub(super) params: MarketParams,
    pub(super) registry: CollateralRegistry,
    pub(super) ledger: PositionLedger,
    pub(super) vault: MarketVault,
    pub(super) governance: AccountId,
    // governance-token stakes, the liquidator bond lives here
    pub(super) stakes: HashMap<AccountId, Amount>,
    pub(super) events: Vec<Event>,
    pub(super) next_event_id: u64,
    pub(super) current_time: Timestamp,
}

impl Market {
    pub fn new(params: MarketParams, governance: AccountId) -> Self {
        Self::with_options(params, governance, MarketOptions::default())
    }

    pub fn with_options(params: MarketParams, governance: AccountId, options: MarketOptions) -> Self {
        let registry = CollateralRegistry::new(params.max_price_staleness_ms);
        let vault = MarketVault::new(params.vault.clone());
        Self {
            options,
            params,
            registry,
            ledger: PositionLedger::new(),
            vault,
            governance,
            stakes: HashMap::new(),
            events: Vec::new(),
            next_event_id: 1,
            current_time: Timestamp::from_millis(0),
        }
    }

    // ===== clock =====

    pub fn set_time(&mut self, timestamp: Timestamp) {
        self.current_time = timestamp;
    }

    pub fn time(&self) -> Timestamp {
        self.current_time
    }

    pub fn advance_time(&mut self, millis: i64) {
        self.current_time = Timestamp::from_millis(self.current_time.as_millis() + millis);
    }

    // ===== asset onboarding and prices =====

    pub fn register_asset(
        &mut self,
        caller: AccountId,
        asset: AssetId,
        tier: Tier,
        isolation_debt_cap: Amount,
    ) -> Result<(), MarketError> {
        self.require_governance(caller)?;
        self.registry.register_asset(asset, tier, isolation_debt_cap)?;
        Ok(())
    }

    pub fn set_price(&mut self, asset: AssetId, price: Price) {
        self.registry.set_price(asset, price, self.current_time);
        self.emit_event(EventPayload::PriceUpdated(PriceUpdatedEvent {
            asset,
            price: price.value(),
        }));
    }

    // ===== governance stakes =====

    pub fn stake_governance_tokens(&mut self, account: AccountId, amount: Amount) {
        let balance = self.stakes.entry(account).or_insert_with(Amount::zero);
        *balance = balance.add(amount);
    }

    pub fn unstake_governance_tokens(
        &mut self,
        account: AccountId,
        amount: Amount,
    ) -> Result<(), MarketError> {
        let held = self.governance_stake(account);
        let remaining = held
            .checked_sub(amount)
            .ok_or(MarketError::InsufficientStake {
                held,
                requested: amount,
            })?;
        self.stakes.insert(account, remaining);
        Ok(())
    }

    pub fn governance_stake(&self, account: AccountId) -> Amount {
        self.stakes.get(&account).copied().unwrap_or_else(Amount::zero)
    }

    // ===== governance-gated parameter updates =====

    pub fn set_rate_params(&mut self, caller: AccountId, rate: RateParams) -> Result<(), MarketError> {
        self.require_governance(caller)?;
        self.params.rate = rate;
        Ok(())
    }

    pub fn set_fee_target(&mut self, caller: AccountId, target: Amount) -> Result<(), MarketError> {
        self.require_governance(caller)?;
        self.params.vault.fee_target = target;
        self.vault.set_fee_target(target);
        Ok(())
    }

    pub fn set_min_liquidator_stake(
        &mut self,
        caller: AccountId,
        stake: Amount,
    ) -> Result<(), MarketError> {
        self.require_governance(caller)?;
        self.params.liquidation.min_liquidator_stake = stake;
        Ok(())
    }

    // ===== views =====

    pub fn params(&self) -> &MarketParams {
        &self.params
    }

    pub fn registry(&self) -> &CollateralRegistry {
        &self.registry
    }

    pub fn ledger(&self) -> &PositionLedger {
        &self.ledger
    }

    pub fn vault(&self) -> &MarketVault {
        &self.vault
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    // annual borrow rate at the current utilization for a given tier
    pub fn borrow_rate(&self, tier: Tier) -> Decimal {
        rate_model::borrow_rate(self.vault.utilization(), tier, &self.params.rate)
    }

    pub fn supply_rate(&self, tier: Tier) -> Decimal {
        rate_model::supply_rate(self.vault.utilization(), tier, &self.params.rate)
    }

    // the rate a specific position pays right now, from its riskiest tier
    pub fn position_borrow_rate(&self, id: PositionId) -> Result<Decimal, MarketError> {
        let tier = self.ledger.rate_tier(id, &self.registry)?;
        Ok(self.borrow_rate(tier))
    }

    // ===== internals =====

    pub(super) fn require_governance(&self, caller: AccountId) -> Result<(), MarketError> {
        if caller != self.governance {
            return Err(MarketError::Unauthorized { caller });
        }
        Ok(())
    }

    pub(super) fn base_price(&self) -> Result<Price, MarketError> {
        let price = self
            .registry
            .price(self.params.market.base_asset, self.current_time)?;
        Ok(price)
    }

    pub(super) fn emit_event(&mut self, payload: EventPayload) {
        let event = Event::new(EventId(self.next_event_id), self.current_time, payload);
        self.next_event_id += 1;

        if self.options.verbose {
            println!("[Event {}] {:?}", event.id.0, event.payload);
        }

        self.events.push(event);

        if self.events.len() > self.options.max_events {
            let drain_count = self.events.len() - self.options.max_events;
            self.events.drain(0..drain_count);
        }
    }
}
