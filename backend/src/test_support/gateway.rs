//! Scripted [`AccountGateway`] with per-source failures and delays.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::fixtures::{
    sample_campaigns, sample_cart, sample_coupons, sample_notifications, sample_payment_methods,
    sample_points, sample_profile, sample_rewards,
};
use super::lock;
use crate::domain::ports::{
    AccountGateway, FetchOptions, UpstreamCause, UpstreamError, UpstreamResult,
};
use crate::domain::{
    CampaignDigest, CartDigest, CouponDigest, Notification, PaymentMethodSummary, PointsBalance,
    ProfileData, RewardsDigest, Source,
};

/// Gateway answering every source from the sample fixtures unless scripted
/// otherwise.
#[derive(Default)]
pub struct ScriptedGateway {
    failures: HashMap<Source, UpstreamCause>,
    delays: HashMap<Source, Duration>,
    notifications: Option<Vec<Notification>>,
    points: Option<u64>,
    finished: Mutex<Vec<Source>>,
}

impl ScriptedGateway {
    /// Every source answers immediately with sample data.
    pub fn healthy() -> Self {
        Self::default()
    }

    /// `source` fails with `cause`.
    #[must_use]
    pub fn failing(mut self, source: Source, cause: UpstreamCause) -> Self {
        self.failures.insert(source, cause);
        self
    }

    /// `source` answers only after `delay`.
    #[must_use]
    pub fn delayed(mut self, source: Source, delay: Duration) -> Self {
        self.delays.insert(source, delay);
        self
    }

    /// Replace the sample notification list.
    #[must_use]
    pub fn with_notifications(mut self, notifications: Vec<Notification>) -> Self {
        self.notifications = Some(notifications);
        self
    }

    /// Replace the sample points balance.
    #[must_use]
    pub fn with_points(mut self, points: u64) -> Self {
        self.points = Some(points);
        self
    }

    /// Sources whose call ran to completion, in completion order.
    pub fn finished_sources(&self) -> Vec<Source> {
        lock(&self.finished, "finished sources").clone()
    }

    async fn respond<T>(&self, source: Source, value: impl FnOnce() -> T) -> UpstreamResult<T> {
        if let Some(delay) = self.delays.get(&source) {
            tokio::time::sleep(*delay).await;
        }
        lock(&self.finished, "finished sources").push(source);
        match self.failures.get(&source) {
            Some(cause) => Err(UpstreamError::new(source, cause.clone())),
            None => Ok(value()),
        }
    }
}

#[async_trait]
impl AccountGateway for ScriptedGateway {
    async fn fetch_profile(&self, _options: &FetchOptions) -> UpstreamResult<ProfileData> {
        self.respond(Source::Profile, sample_profile).await
    }

    async fn fetch_points(&self, _options: &FetchOptions) -> UpstreamResult<PointsBalance> {
        self.respond(Source::Points, || match self.points {
            Some(points) => PointsBalance { points },
            None => sample_points(),
        })
        .await
    }

    async fn fetch_coupons(&self, _options: &FetchOptions) -> UpstreamResult<CouponDigest> {
        self.respond(Source::Coupons, sample_coupons).await
    }

    async fn fetch_campaigns(&self, _options: &FetchOptions) -> UpstreamResult<CampaignDigest> {
        self.respond(Source::Campaigns, sample_campaigns).await
    }

    async fn fetch_rewards(&self, _options: &FetchOptions) -> UpstreamResult<RewardsDigest> {
        self.respond(Source::Rewards, sample_rewards).await
    }

    async fn fetch_notifications(
        &self,
        _options: &FetchOptions,
    ) -> UpstreamResult<Vec<Notification>> {
        self.respond(Source::Notifications, || {
            self.notifications
                .clone()
                .unwrap_or_else(sample_notifications)
        })
        .await
    }

    async fn fetch_cart(&self, _options: &FetchOptions) -> UpstreamResult<CartDigest> {
        self.respond(Source::Cart, sample_cart).await
    }

    async fn fetch_payment_methods(
        &self,
        _options: &FetchOptions,
    ) -> UpstreamResult<Vec<PaymentMethodSummary>> {
        self.respond(Source::PaymentMethods, sample_payment_methods)
            .await
    }
}
