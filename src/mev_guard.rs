// 7.0: same-block reentry guard. every state-mutating entry point touches a
// guard scope; a second touch of the same scope at an unchanged timestamp is
// rejected. this kills same-block open/borrow/repay/close cycles and deposit/
// withdraw sandwiches without any cross-position locking.

use crate::types::{AccountId, PositionId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GuardScope {
    // one scope per position covers all ledger mutations on it
    Position(PositionId),
    // one scope per account covers all market-vault liquidity operations
    Liquidity(AccountId),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MevGuard {
    last_touch: HashMap<GuardScope, Timestamp>,
}

impl MevGuard {
    pub fn new() -> Self {
        Self::default()
    }

    // passes only when the scope was last touched strictly before `now`.
    // non-mutating so callers can validate everything before committing.
    pub fn check(&self, scope: GuardScope, now: Timestamp) -> Result<(), MevError> {
        if let Some(last) = self.last_touch.get(&scope) {
            if *last >= now {
                return Err(MevError::SameBlockOperation { scope, at: now });
            }
        }
        Ok(())
    }

    pub fn touch(&mut self, scope: GuardScope, now: Timestamp) {
        self.last_touch.insert(scope, now);
    }

    pub fn check_and_touch(&mut self, scope: GuardScope, now: Timestamp) -> Result<(), MevError> {
        self.check(scope, now)?;
        self.touch(scope, now);
        Ok(())
    }

    pub fn last_touch(&self, scope: GuardScope) -> Option<Timestamp> {
        self.last_touch.get(&scope).copied()
    }

    // forget a closed position's scope so the id slot can't pin memory
    pub fn release(&mut self, scope: GuardScope) {
        self.last_touch.remove(&scope);
    }
}

#[derive(Debug, Clone, Copy, thiserror::Error)]
pub enum MevError {
    #[error("Same-block operation rejected for {scope:?} at {at:?}")]
    SameBlockOperation { scope: GuardScope, at: Timestamp },
}
