//! Pure fan-in of per-source results into a [`DashboardSnapshot`].
//!
//! The merge never looks at completion order, so the same inputs always yield
//! the same snapshot.

use std::collections::BTreeMap;

use super::ports::{UpstreamError, UpstreamResult};
use super::{
    ActivityEvent, ActivitySource, CampaignDigest, CartDigest, CouponDigest, DashboardSnapshot,
    ExpirationItem, ExpiringRecord, Notification, PaymentMethodSummary, PointsBalance,
    ProfileData, RewardsDigest, Source, UsageRecord,
};

/// Typed outcome of every upstream call for one aggregation cycle.
#[derive(Debug, Clone)]
pub struct SourceResults {
    /// Profile service.
    pub profile: UpstreamResult<ProfileData>,
    /// Points service.
    pub points: UpstreamResult<PointsBalance>,
    /// Coupon service.
    pub coupons: UpstreamResult<CouponDigest>,
    /// Campaign service.
    pub campaigns: UpstreamResult<CampaignDigest>,
    /// Rewards service.
    pub rewards: UpstreamResult<RewardsDigest>,
    /// Notification service.
    pub notifications: UpstreamResult<Vec<Notification>>,
    /// Cart service.
    pub cart: UpstreamResult<CartDigest>,
    /// Payment-method service.
    pub payment_methods: UpstreamResult<Vec<PaymentMethodSummary>>,
}

impl SourceResults {
    /// Every failure, in [`Source`] declaration order.
    #[must_use]
    pub fn failures(&self) -> Vec<&UpstreamError> {
        [
            self.profile.as_ref().err(),
            self.points.as_ref().err(),
            self.coupons.as_ref().err(),
            self.campaigns.as_ref().err(),
            self.rewards.as_ref().err(),
            self.notifications.as_ref().err(),
            self.cart.as_ref().err(),
            self.payment_methods.as_ref().err(),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

/// Collects failures while unwrapping each result to its value or default.
#[derive(Default)]
struct FailureLedger(BTreeMap<Source, String>);

impl FailureLedger {
    fn take<T: Default>(&mut self, result: UpstreamResult<T>) -> T {
        self.take_or(result, T::default())
    }

    fn take_or<T>(&mut self, result: UpstreamResult<T>, fallback: T) -> T {
        match result {
            Ok(value) => value,
            Err(error) => {
                self.0.insert(error.upstream, error.to_string());
                fallback
            }
        }
    }
}

/// Merge one cycle's results into a fresh snapshot.
///
/// Missing sources fall back to zero counts, empty sequences, an empty
/// membership level and no next-level target, and are listed in
/// `source_errors`.
///
/// # Examples
/// ```
/// use loyalty_dashboard::domain::merge::{SourceResults, merge};
/// use loyalty_dashboard::domain::ports::{UpstreamCause, UpstreamError};
/// use loyalty_dashboard::domain::{PointsBalance, Source};
///
/// let missing = |source| Err(UpstreamError::new(source, UpstreamCause::deadline_exceeded()));
/// let snapshot = merge(SourceResults {
///     profile: missing(Source::Profile),
///     points: Ok(PointsBalance { points: 42 }),
///     coupons: missing(Source::Coupons),
///     campaigns: missing(Source::Campaigns),
///     rewards: missing(Source::Rewards),
///     notifications: missing(Source::Notifications),
///     cart: missing(Source::Cart),
///     payment_methods: missing(Source::PaymentMethods),
/// });
/// assert_eq!(snapshot.points, 42);
/// assert_eq!(snapshot.source_errors.len(), 7);
/// ```
#[must_use]
pub fn merge(results: SourceResults) -> DashboardSnapshot {
    let mut ledger = FailureLedger::default();

    let profile = ledger.take_or(results.profile.map(Some), None);
    let points = ledger.take_or(results.points, PointsBalance { points: 0 });
    let coupons = ledger.take(results.coupons);
    let campaigns = ledger.take(results.campaigns);
    let rewards = ledger.take(results.rewards);
    let notifications = ledger.take(results.notifications);
    let cart = ledger.take(results.cart);
    let payment_methods = ledger.take(results.payment_methods);

    let recent_activity = merge_activity(coupons.recent_usage, campaigns.recent_participation);
    let upcoming_expirations = tag_expirations(coupons.expiring_soon, ActivitySource::Coupon)
        .chain(tag_expirations(
            campaigns.expiring_soon,
            ActivitySource::Campaign,
        ))
        .collect();

    let (membership_level, total_savings, next_level_points, favorite_categories) = match profile
    {
        Some(profile) => (
            profile.membership_level,
            profile.total_savings,
            Some(profile.next_level_points),
            profile.favorite_categories,
        ),
        None => (String::new(), 0.0, None, Vec::new()),
    };

    DashboardSnapshot {
        points: points.points,
        membership_level,
        total_savings,
        next_level_points,
        available_coupons_count: coupons.available_count,
        active_campaigns_count: campaigns.active_count,
        available_rewards_count: rewards.available_count,
        recent_activity,
        upcoming_expirations,
        favorite_categories,
        cart_item_count: cart.item_count,
        payment_methods,
        notifications,
        source_errors: ledger.0,
    }
}

fn merge_activity(coupon: Vec<UsageRecord>, campaign: Vec<UsageRecord>) -> Vec<ActivityEvent> {
    let mut events: Vec<ActivityEvent> = tag_activity(coupon, ActivitySource::Coupon)
        .chain(tag_activity(campaign, ActivitySource::Campaign))
        .collect();
    // Stable: equal timestamps keep coupon-before-campaign order.
    events.sort_by(|left, right| right.occurred_at.cmp(&left.occurred_at));
    events
}

fn tag_activity(
    records: Vec<UsageRecord>,
    source: ActivitySource,
) -> impl Iterator<Item = ActivityEvent> {
    records.into_iter().map(move |record| ActivityEvent {
        source,
        description: record.description,
        occurred_at: record.occurred_at,
    })
}

fn tag_expirations(
    records: Vec<ExpiringRecord>,
    source: ActivitySource,
) -> impl Iterator<Item = ExpirationItem> {
    records.into_iter().map(move |record| ExpirationItem {
        name: record.name,
        days_left: record.days_left,
        source,
    })
}

#[cfg(test)]
#[path = "merge_tests.rs"]
mod tests;
