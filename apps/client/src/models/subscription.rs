use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::user::{Plan, DEFAULT_FREE_USES};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BillingStatus {
    #[default]
    Active,
    Canceled,
    PastDue,
    Unpaid,
    Trialing,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubscriptionStatus {
    pub plan: Plan,
    #[serde(default)]
    pub status: BillingStatus,
    #[serde(default)]
    pub current_period_start: Option<DateTime<Utc>>,
    #[serde(default)]
    pub current_period_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cancel_at_period_end: bool,
}

/// Subscription state combined with the free-use counter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanStatus {
    pub plan: Plan,
    #[serde(default = "no_subscription")]
    pub subscription_status: BillingStatus,
    #[serde(default = "default_free_uses")]
    pub free_uses_remaining: u32,
    #[serde(default)]
    pub current_period_end: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cancel_at_period_end: bool,
}

fn no_subscription() -> BillingStatus {
    BillingStatus::None
}

fn default_free_uses() -> u32 {
    DEFAULT_FREE_USES
}

#[derive(Debug, Clone, Serialize)]
pub struct CheckoutRequest {
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckoutSession {
    pub checkout_url: String,
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortalSession {
    pub portal_url: String,
}
