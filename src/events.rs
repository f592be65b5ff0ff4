// 10.0: every state change produces an event. used for audit trails, state
// reconstruction, and notifying external systems. the EventPayload enum lists
// all event types.

use crate::types::{AccountId, Amount, AssetId, MarketId, PositionId, Timestamp, Usd};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub timestamp: Timestamp,
    pub payload: EventPayload,
}

impl Event {
    pub fn new(id: EventId, timestamp: Timestamp, payload: EventPayload) -> Self {
        Self {
            id,
            timestamp,
            payload,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    // Position events
    PositionOpened(PositionOpenedEvent),
    CollateralSupplied(CollateralSuppliedEvent),
    CollateralWithdrawn(CollateralWithdrawnEvent),
    PositionClosed(PositionClosedEvent),

    // Debt events
    Borrowed(BorrowedEvent),
    Repaid(RepaidEvent),
    InterestAccrued(InterestAccruedEvent),

    // Risk events
    Liquidated(LiquidatedEvent),

    // Liquidity events
    LiquidityDeposited(LiquidityEvent),
    LiquidityWithdrawn(LiquidityEvent),
    FlashLoan(FlashLoanEvent),

    // Reporting events
    ReserveReportUpdated(ReserveReportEvent),
    PriceUpdated(PriceUpdatedEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionOpenedEvent {
    pub market_id: MarketId,
    pub owner: AccountId,
    pub position_id: PositionId,
    pub is_isolated: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollateralSuppliedEvent {
    pub position_id: PositionId,
    pub asset: AssetId,
    pub amount: Amount,
    pub new_tvl_native: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollateralWithdrawnEvent {
    pub position_id: PositionId,
    pub asset: AssetId,
    pub amount: Amount,
    pub new_tvl_native: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionClosedEvent {
    pub position_id: PositionId,
    pub owner: AccountId,
    pub assets_returned: usize,
    pub close_reason: CloseReason,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CloseReason {
    UserClosed,
    Liquidation,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BorrowedEvent {
    pub position_id: PositionId,
    pub amount: Amount,
    pub new_debt: Amount,
    pub credit_limit: Usd,
    pub borrow_rate: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepaidEvent {
    pub position_id: PositionId,
    pub interest_paid: Amount,
    pub principal_paid: Amount,
    pub remaining_debt: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterestAccruedEvent {
    pub position_id: PositionId,
    pub interest: Amount,
    pub borrow_rate: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidatedEvent {
    pub position_id: PositionId,
    pub owner: AccountId,
    pub liquidator: AccountId,
    pub debt_closed: Amount,
    pub cost_paid: Amount,
    pub bonus: Decimal,
    pub assets_seized: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiquidityEvent {
    pub account: AccountId,
    pub amount: Amount,
    pub shares: Amount,
    pub share_price: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlashLoanEvent {
    pub account: AccountId,
    pub amount: Amount,
    pub fee: Amount,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReserveReportEvent {
    pub total_borrow: Amount,
    pub total_supplied_liquidity: Amount,
    pub utilization: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceUpdatedEvent {
    pub asset: AssetId,
    pub price: Decimal,
}
