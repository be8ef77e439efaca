//! Sample upstream payloads.
//!
//! The values line up with the worked examples: 1200 points against a
//! 2000-point tier target, three cached notifications with two unread.

use std::num::NonZeroU64;

use chrono::{DateTime, TimeZone, Utc};

use crate::domain::{
    CampaignDigest, CartDigest, CouponDigest, ExpiringRecord, Notification, NotificationId,
    NotificationKind, PaymentMethodSummary, PointsBalance, ProfileData, RewardsDigest,
    UsageRecord,
};

const NEXT_LEVEL_POINTS: NonZeroU64 = match NonZeroU64::new(2000) {
    Some(points) => points,
    None => panic!("tier target must be non-zero"),
};

/// Fixed timestamp on 2026-03-`day` at `hour`:00 UTC.
pub fn at(day: u32, hour: u32) -> DateTime<Utc> {
    match Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).single() {
        Some(timestamp) => timestamp,
        None => panic!("invalid fixture timestamp: day {day} hour {hour}"),
    }
}

/// Notification `id` with a fixed timestamp.
pub fn notification(id: &str, read: bool) -> Notification {
    Notification {
        id: NotificationId::new(id),
        title: format!("Notification {id}"),
        message: format!("Body of {id}"),
        kind: NotificationKind::Info,
        timestamp: at(1, 8),
        read,
    }
}

pub fn sample_profile() -> ProfileData {
    ProfileData {
        membership_level: "Gold".to_owned(),
        total_savings: 152.5,
        next_level_points: NEXT_LEVEL_POINTS,
        favorite_categories: vec!["coffee".to_owned(), "books".to_owned()],
    }
}

pub fn sample_points() -> PointsBalance {
    PointsBalance { points: 1200 }
}

pub fn sample_coupons() -> CouponDigest {
    CouponDigest {
        available_count: 3,
        recent_usage: vec![UsageRecord {
            description: "Used 10% off shoes".to_owned(),
            occurred_at: at(2, 9),
        }],
        expiring_soon: vec![ExpiringRecord {
            name: "Spring sale".to_owned(),
            days_left: 3,
        }],
    }
}

pub fn sample_campaigns() -> CampaignDigest {
    CampaignDigest {
        active_count: 2,
        recent_participation: vec![UsageRecord {
            description: "Joined summer quiz".to_owned(),
            occurred_at: at(3, 9),
        }],
        expiring_soon: vec![ExpiringRecord {
            name: "Double points".to_owned(),
            days_left: 1,
        }],
    }
}

pub fn sample_rewards() -> RewardsDigest {
    RewardsDigest { available_count: 5 }
}

/// Three notifications, newest first; `n2` is read.
pub fn sample_notifications() -> Vec<Notification> {
    vec![
        notification("n3", false),
        notification("n2", true),
        notification("n1", false),
    ]
}

pub fn sample_cart() -> CartDigest {
    CartDigest { item_count: 4 }
}

pub fn sample_payment_methods() -> Vec<PaymentMethodSummary> {
    vec![PaymentMethodSummary {
        id: "pm-1".to_owned(),
        label: "Visa".to_owned(),
        last4: Some("4242".to_owned()),
        is_default: true,
    }]
}
