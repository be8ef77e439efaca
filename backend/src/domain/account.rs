//! Per-source account payloads returned by the upstream gateway.
//!
//! These are already-validated domain values; adapters decode transport DTOs
//! into them and reject payloads that break the invariants documented here.

use std::num::NonZeroU64;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Member profile as owned by the profile service.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileData {
    /// Display name of the member's loyalty tier.
    pub membership_level: String,
    /// Lifetime savings; finite and non-negative.
    pub total_savings: f64,
    /// Points required to reach the next tier.
    pub next_level_points: NonZeroU64,
    /// Favourite shopping categories, most preferred first.
    pub favorite_categories: Vec<String>,
}

/// Current loyalty points balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointsBalance {
    /// Spendable points.
    pub points: u64,
}

/// A recent usage or participation record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageRecord {
    /// Human-readable description of what happened.
    pub description: String,
    /// When it happened.
    pub occurred_at: DateTime<Utc>,
}

/// Something that expires soon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiringRecord {
    /// Coupon or campaign name.
    pub name: String,
    /// Whole days until expiry.
    pub days_left: u32,
}

/// Coupon service digest.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CouponDigest {
    /// Number of coupons currently available to the member.
    pub available_count: usize,
    /// Recent coupon usage in upstream order.
    pub recent_usage: Vec<UsageRecord>,
    /// Coupons expiring soon in upstream order.
    pub expiring_soon: Vec<ExpiringRecord>,
}

/// Campaign service digest.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CampaignDigest {
    /// Number of campaigns currently active.
    pub active_count: usize,
    /// Recent campaign participation in upstream order.
    pub recent_participation: Vec<UsageRecord>,
    /// Campaigns expiring soon in upstream order.
    pub expiring_soon: Vec<ExpiringRecord>,
}

/// Rewards service digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RewardsDigest {
    /// Number of rewards the member can redeem.
    pub available_count: usize,
}

/// Cart service digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CartDigest {
    /// Number of line items in the cart.
    pub item_count: usize,
}

/// One stored payment method, reduced to what the dashboard shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodSummary {
    /// Upstream identifier.
    pub id: String,
    /// Card brand or wallet label.
    pub label: String,
    /// Last four digits when the method is a card.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last4: Option<String>,
    /// Whether this is the member's default method.
    pub is_default: bool,
}
