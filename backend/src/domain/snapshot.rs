//! The aggregated dashboard snapshot.

use std::collections::BTreeMap;
use std::num::NonZeroU64;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::{Notification, PaymentMethodSummary, Source};

/// Origin of an activity or expiration entry.
///
/// Declaration order doubles as the tie-break order when merging activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivitySource {
    /// Coupon service.
    Coupon,
    /// Campaign service.
    Campaign,
}

/// One entry of the merged recent-activity feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEvent {
    /// Which service produced the entry.
    pub source: ActivitySource,
    /// Human-readable description.
    pub description: String,
    /// When the activity happened.
    pub occurred_at: DateTime<Utc>,
}

/// Something the member should use before it lapses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpirationItem {
    /// Coupon or campaign name.
    pub name: String,
    /// Whole days left.
    pub days_left: u32,
    /// Which service reported it.
    pub source: ActivitySource,
}

/// Immutable, point-in-time view of the member's account.
///
/// Built by [`crate::domain::merge`] once per aggregation cycle and replaced
/// wholesale by the next cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    /// Spendable points.
    pub points: u64,
    /// Loyalty tier label.
    pub membership_level: String,
    /// Lifetime savings.
    pub total_savings: f64,
    /// Points needed for the next tier; `None` when the profile is missing.
    pub next_level_points: Option<NonZeroU64>,
    /// Coupons available right now.
    pub available_coupons_count: usize,
    /// Campaigns active right now.
    pub active_campaigns_count: usize,
    /// Rewards the member can redeem.
    pub available_rewards_count: usize,
    /// Coupon and campaign activity, newest first.
    pub recent_activity: Vec<ActivityEvent>,
    /// Coupons then campaigns expiring soon, unsorted.
    pub upcoming_expirations: Vec<ExpirationItem>,
    /// Favourite categories, most preferred first.
    pub favorite_categories: Vec<String>,
    /// Line items in the cart.
    pub cart_item_count: usize,
    /// Stored payment methods in upstream order.
    pub payment_methods: Vec<PaymentMethodSummary>,
    /// Notifications as returned by the initial fetch.
    pub notifications: Vec<Notification>,
    /// Sources that failed or timed out, with the failure text.
    pub source_errors: BTreeMap<Source, String>,
}

impl DashboardSnapshot {
    /// Whether any source fell back to its defaults.
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        !self.source_errors.is_empty()
    }

    /// Progress towards the next tier as `points / next_level_points`.
    ///
    /// # Examples
    /// ```
    /// use std::num::NonZeroU64;
    /// use loyalty_dashboard::domain::DashboardSnapshot;
    ///
    /// let mut snapshot = DashboardSnapshot::empty();
    /// snapshot.points = 1200;
    /// snapshot.next_level_points = NonZeroU64::new(2000);
    /// assert_eq!(snapshot.level_progress(), Some(0.6));
    /// ```
    #[must_use]
    pub fn level_progress(&self) -> Option<f64> {
        self.next_level_points
            .map(|target| self.points as f64 / target.get() as f64)
    }

    /// Snapshot with every field at its documented default.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            points: 0,
            membership_level: String::new(),
            total_savings: 0.0,
            next_level_points: None,
            available_coupons_count: 0,
            active_campaigns_count: 0,
            available_rewards_count: 0,
            recent_activity: Vec::new(),
            upcoming_expirations: Vec::new(),
            favorite_categories: Vec::new(),
            cart_item_count: 0,
            payment_methods: Vec::new(),
            notifications: Vec::new(),
            source_errors: BTreeMap::new(),
        }
    }
}
