//! DTOs for decoding the REST collaborators' JSON payloads.
//!
//! The adapter decodes into these transport DTOs first, then maps into domain
//! values in one pass, rejecting payloads that break domain invariants.

use std::num::NonZeroU64;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde::de::IgnoredAny;

use crate::domain::{
    CampaignDigest, CartDigest, CouponDigest, ExpiringRecord, Notification, NotificationId,
    NotificationKind, PaymentMethodSummary, PointsBalance, ProfileData, RewardsDigest,
    UsageRecord,
};

/// Identifier that some collaborators send as a number.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum IdDto {
    Text(String),
    Number(u64),
}

impl IdDto {
    fn into_string(self) -> String {
        match self {
            Self::Text(text) => text,
            Self::Number(number) => number.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ProfileDto {
    membership_level: String,
    total_savings: f64,
    next_level_points: u64,
    #[serde(default)]
    favorite_categories: Vec<String>,
}

impl ProfileDto {
    pub(super) fn into_domain(self) -> Result<ProfileData, String> {
        if !self.total_savings.is_finite() || self.total_savings < 0.0 {
            return Err(format!(
                "totalSavings must be finite and non-negative, got {}",
                self.total_savings
            ));
        }
        let next_level_points = NonZeroU64::new(self.next_level_points)
            .ok_or_else(|| "nextLevelPoints must be positive".to_owned())?;
        Ok(ProfileData {
            membership_level: self.membership_level,
            total_savings: self.total_savings,
            next_level_points,
            favorite_categories: self.favorite_categories,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct PointsDto {
    points: u64,
}

impl PointsDto {
    pub(super) fn into_domain(self) -> PointsBalance {
        PointsBalance {
            points: self.points,
        }
    }
}

#[derive(Debug, Deserialize)]
struct UsageDto {
    description: String,
    date: DateTime<Utc>,
}

impl From<UsageDto> for UsageRecord {
    fn from(dto: UsageDto) -> Self {
        Self {
            description: dto.description,
            occurred_at: dto.date,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExpiringDto {
    name: String,
    days_left: u32,
}

impl From<ExpiringDto> for ExpiringRecord {
    fn from(dto: ExpiringDto) -> Self {
        Self {
            name: dto.name,
            days_left: dto.days_left,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CouponsDto {
    #[serde(default)]
    coupons: Vec<IgnoredAny>,
    #[serde(default)]
    recent_usage: Vec<UsageDto>,
    #[serde(default)]
    expiring_soon: Vec<ExpiringDto>,
}

impl CouponsDto {
    pub(super) fn into_domain(self) -> CouponDigest {
        CouponDigest {
            available_count: self.coupons.len(),
            recent_usage: self.recent_usage.into_iter().map(Into::into).collect(),
            expiring_soon: self.expiring_soon.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct CampaignsDto {
    #[serde(default)]
    campaigns: Vec<IgnoredAny>,
    #[serde(default)]
    recent_participation: Vec<UsageDto>,
    #[serde(default)]
    expiring_soon: Vec<ExpiringDto>,
}

impl CampaignsDto {
    pub(super) fn into_domain(self) -> CampaignDigest {
        CampaignDigest {
            active_count: self.campaigns.len(),
            recent_participation: self
                .recent_participation
                .into_iter()
                .map(Into::into)
                .collect(),
            expiring_soon: self.expiring_soon.into_iter().map(Into::into).collect(),
        }
    }
}

/// The rewards endpoint returns a bare array.
#[derive(Debug, Deserialize)]
#[serde(transparent)]
pub(super) struct RewardsDto(Vec<IgnoredAny>);

impl RewardsDto {
    pub(super) fn into_domain(self) -> RewardsDigest {
        RewardsDigest {
            available_count: self.0.len(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct CartDto {
    #[serde(default)]
    items: Vec<IgnoredAny>,
}

impl CartDto {
    pub(super) fn into_domain(self) -> CartDigest {
        CartDigest {
            item_count: self.items.len(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct PaymentMethodDto {
    id: IdDto,
    #[serde(rename = "type")]
    label: String,
    last4: Option<String>,
    #[serde(default)]
    is_default: bool,
}

impl PaymentMethodDto {
    pub(super) fn into_domain(self) -> PaymentMethodSummary {
        PaymentMethodSummary {
            id: self.id.into_string(),
            label: self.label,
            last4: self.last4,
            is_default: self.is_default,
        }
    }
}

/// Notification as sent by the REST list and the push channel.
#[derive(Debug, Deserialize)]
pub(crate) struct NotificationDto {
    id: IdDto,
    title: String,
    message: String,
    #[serde(rename = "type", default)]
    kind: Option<String>,
    timestamp: DateTime<Utc>,
    #[serde(default)]
    read: bool,
}

impl NotificationDto {
    pub(crate) fn into_domain(self) -> Notification {
        Notification {
            id: NotificationId::new(self.id.into_string()),
            title: self.title,
            message: self.message,
            kind: self
                .kind
                .as_deref()
                .map_or(NotificationKind::Default, NotificationKind::from_label),
            timestamp: self.timestamp,
            read: self.read,
        }
    }
}
