//! Tests for snapshot merging.

use std::num::NonZeroU64;

use chrono::{DateTime, TimeZone, Utc};
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::UpstreamCause;
use crate::domain::{NotificationId, NotificationKind};

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0)
        .single()
        .expect("valid timestamp")
}

fn usage(description: &str, occurred_at: DateTime<Utc>) -> UsageRecord {
    UsageRecord {
        description: description.to_owned(),
        occurred_at,
    }
}

fn expiring(name: &str, days_left: u32) -> ExpiringRecord {
    ExpiringRecord {
        name: name.to_owned(),
        days_left,
    }
}

fn missing<T>(source: Source) -> UpstreamResult<T> {
    Err(UpstreamError::new(source, UpstreamCause::deadline_exceeded()))
}

#[fixture]
fn complete() -> SourceResults {
    SourceResults {
        profile: Ok(ProfileData {
            membership_level: "Gold".to_owned(),
            total_savings: 152.5,
            next_level_points: NonZeroU64::new(2000).expect("non-zero"),
            favorite_categories: vec!["coffee".to_owned(), "books".to_owned()],
        }),
        points: Ok(PointsBalance { points: 1200 }),
        coupons: Ok(CouponDigest {
            available_count: 3,
            recent_usage: vec![usage("10% off shoes", at(2, 9)), usage("free coffee", at(4, 9))],
            expiring_soon: vec![expiring("spring sale", 3)],
        }),
        campaigns: Ok(CampaignDigest {
            active_count: 2,
            recent_participation: vec![usage("summer quiz", at(3, 9))],
            expiring_soon: vec![expiring("double points", 1), expiring("spring sale", 3)],
        }),
        rewards: Ok(RewardsDigest { available_count: 5 }),
        notifications: Ok(vec![Notification {
            id: NotificationId::new("n1"),
            title: "Welcome".to_owned(),
            message: "Thanks for joining".to_owned(),
            kind: NotificationKind::Info,
            timestamp: at(1, 8),
            read: false,
        }]),
        cart: Ok(CartDigest { item_count: 4 }),
        payment_methods: Ok(vec![PaymentMethodSummary {
            id: "pm-1".to_owned(),
            label: "Visa".to_owned(),
            last4: Some("4242".to_owned()),
            is_default: true,
        }]),
    }
}

#[rstest]
fn merges_every_source(complete: SourceResults) {
    let snapshot = merge(complete);

    assert_eq!(snapshot.points, 1200);
    assert_eq!(snapshot.membership_level, "Gold");
    assert_eq!(snapshot.next_level_points, NonZeroU64::new(2000));
    assert_eq!(snapshot.level_progress(), Some(0.6));
    assert_eq!(snapshot.available_coupons_count, 3);
    assert_eq!(snapshot.active_campaigns_count, 2);
    assert_eq!(snapshot.available_rewards_count, 5);
    assert_eq!(snapshot.cart_item_count, 4);
    assert_eq!(snapshot.payment_methods.len(), 1);
    assert_eq!(snapshot.notifications.len(), 1);
    assert!(!snapshot.is_degraded());
}

#[rstest]
fn activity_is_sorted_newest_first(complete: SourceResults) {
    let snapshot = merge(complete);

    let descriptions: Vec<&str> = snapshot
        .recent_activity
        .iter()
        .map(|event| event.description.as_str())
        .collect();
    assert_eq!(descriptions, ["free coffee", "summer quiz", "10% off shoes"]);
    assert!(
        snapshot
            .recent_activity
            .windows(2)
            .all(|pair| pair[0].occurred_at >= pair[1].occurred_at)
    );
}

#[rstest]
fn equal_timestamps_keep_coupon_before_campaign(mut complete: SourceResults) {
    complete.coupons = Ok(CouponDigest {
        recent_usage: vec![usage("coupon", at(5, 12))],
        ..CouponDigest::default()
    });
    complete.campaigns = Ok(CampaignDigest {
        recent_participation: vec![usage("campaign", at(5, 12))],
        ..CampaignDigest::default()
    });

    let snapshot = merge(complete);

    let sources: Vec<ActivitySource> = snapshot
        .recent_activity
        .iter()
        .map(|event| event.source)
        .collect();
    assert_eq!(sources, [ActivitySource::Coupon, ActivitySource::Campaign]);
}

#[rstest]
fn expirations_are_concatenated_without_dedup(complete: SourceResults) {
    let snapshot = merge(complete);

    let entries: Vec<(&str, ActivitySource)> = snapshot
        .upcoming_expirations
        .iter()
        .map(|item| (item.name.as_str(), item.source))
        .collect();
    assert_eq!(
        entries,
        [
            ("spring sale", ActivitySource::Coupon),
            ("double points", ActivitySource::Campaign),
            ("spring sale", ActivitySource::Campaign),
        ]
    );
}

#[rstest]
fn missing_sources_fall_back_to_defaults(mut complete: SourceResults) {
    complete.profile = missing(Source::Profile);
    complete.coupons = missing(Source::Coupons);
    complete.cart = Err(UpstreamError::new(
        Source::Cart,
        UpstreamCause::status(502_u16, "bad gateway"),
    ));

    let snapshot = merge(complete);

    assert_eq!(snapshot.membership_level, "");
    assert_eq!(snapshot.total_savings, 0.0);
    assert_eq!(snapshot.next_level_points, None);
    assert_eq!(snapshot.level_progress(), None);
    assert!(snapshot.favorite_categories.is_empty());
    assert_eq!(snapshot.available_coupons_count, 0);
    assert_eq!(snapshot.cart_item_count, 0);
    assert_eq!(snapshot.points, 1200);
    assert_eq!(
        snapshot.source_errors.keys().copied().collect::<Vec<_>>(),
        [Source::Profile, Source::Coupons, Source::Cart]
    );
    assert_eq!(
        snapshot.source_errors.get(&Source::Cart).map(String::as_str),
        Some("cart upstream failed: unexpected status 502: bad gateway")
    );
    assert!(snapshot.is_degraded());
}

#[rstest]
fn missing_coupons_keep_campaign_activity(mut complete: SourceResults) {
    complete.coupons = missing(Source::Coupons);

    let snapshot = merge(complete);

    assert_eq!(snapshot.recent_activity.len(), 1);
    assert_eq!(snapshot.recent_activity[0].source, ActivitySource::Campaign);
}

#[rstest]
fn merge_is_deterministic(complete: SourceResults) {
    let first = serde_json::to_vec(&merge(complete.clone())).expect("serialise");
    let second = serde_json::to_vec(&merge(complete)).expect("serialise");
    assert_eq!(first, second);
}

#[rstest]
fn failures_follow_source_order(mut complete: SourceResults) {
    complete.payment_methods = missing(Source::PaymentMethods);
    complete.points = missing(Source::Points);

    let sources: Vec<Source> = complete
        .failures()
        .into_iter()
        .map(|error| error.upstream)
        .collect();
    assert_eq!(sources, [Source::Points, Source::PaymentMethods]);
}
