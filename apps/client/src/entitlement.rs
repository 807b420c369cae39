//! Entitlement gate: decides whether an AI-cost action may be dispatched.
//!
//! The check here is a fast path only. The backend owns the counter,
//! decrements it, and answers 402 when the gate is violated on its side;
//! workflows treat that answer exactly like a local refusal. Nothing in the
//! client ever decrements the counter.

use crate::models::user::{Plan, DEFAULT_FREE_USES};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entitlement {
    pub plan: Plan,
    pub free_uses_remaining: u32,
}

impl Default for Entitlement {
    fn default() -> Self {
        Self::free(DEFAULT_FREE_USES)
    }
}

impl Entitlement {
    pub fn free(free_uses_remaining: u32) -> Self {
        Self {
            plan: Plan::Free,
            free_uses_remaining,
        }
    }

    pub fn premium() -> Self {
        Self {
            plan: Plan::Premium,
            free_uses_remaining: 0,
        }
    }

    pub fn is_premium(&self) -> bool {
        self.plan == Plan::Premium
    }

    pub fn can_use_ai(&self) -> bool {
        self.is_premium() || self.free_uses_remaining > 0
    }
}

/// Where workflows read the current entitlement from.
pub trait EntitlementSource: Send + Sync {
    fn entitlement(&self) -> Entitlement;
}

impl EntitlementSource for Entitlement {
    fn entitlement(&self) -> Entitlement {
        *self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allowed,
    UpgradeRequired,
}

pub fn check(source: &dyn EntitlementSource) -> GateDecision {
    if source.entitlement().can_use_ai() {
        GateDecision::Allowed
    } else {
        GateDecision::UpgradeRequired
    }
}
