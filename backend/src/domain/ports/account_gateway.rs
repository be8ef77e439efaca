//! Driven port for reading account data from the upstream services.
//!
//! Every operation reports failure as a value tagged with the failing
//! [`Source`] so the aggregator can tell per-source failures apart.

use async_trait::async_trait;
use tokio::time::Instant;

use super::define_port_error;
use crate::domain::{
    CampaignDigest, CartDigest, CouponDigest, Notification, PaymentMethodSummary, PointsBalance,
    ProfileData, RewardsDigest, Source,
};

define_port_error! {
    /// Why one upstream call failed.
    pub enum UpstreamCause {
        /// Network transport failed before a response arrived.
        Transport { message: String } =>
            "transport failed: {message}",
        /// The upstream call timed out on its own request timeout.
        Timeout { message: String } =>
            "timed out: {message}",
        /// The aggregation deadline elapsed and the call was cancelled.
        DeadlineExceeded =>
            "aggregation deadline exceeded",
        /// The upstream rejected the session (401/403).
        Unauthorized { message: String } =>
            "session rejected: {message}",
        /// The addressed resource does not exist upstream.
        NotFound { message: String } =>
            "not found: {message}",
        /// Any other non-success status.
        Status { status: u16, message: String } =>
            "unexpected status {status}: {message}",
        /// The response body could not be decoded or broke an invariant.
        Decode { message: String } =>
            "response decode failed: {message}",
    }
}

/// Failure of one upstream call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{upstream} upstream failed: {cause}")]
pub struct UpstreamError {
    /// The service that failed.
    pub upstream: Source,
    /// Why it failed.
    #[source]
    pub cause: UpstreamCause,
}

impl UpstreamError {
    /// Tag a cause with the failing source.
    #[must_use]
    pub fn new(upstream: Source, cause: UpstreamCause) -> Self {
        Self { upstream, cause }
    }

    /// Whether the failure means the session is no longer valid.
    #[must_use]
    pub fn is_auth(&self) -> bool {
        matches!(self.cause, UpstreamCause::Unauthorized { .. })
    }
}

/// Result of one upstream call.
pub type UpstreamResult<T> = Result<T, UpstreamError>;

/// Per-call options supplied by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FetchOptions {
    /// Instant after which the call is pointless.
    pub deadline: Option<Instant>,
}

impl FetchOptions {
    /// Options bounded by `deadline`.
    #[must_use]
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            deadline: Some(deadline),
        }
    }
}

/// Port for reading every upstream capability the dashboard needs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccountGateway: Send + Sync {
    /// Fetch the member profile.
    async fn fetch_profile(&self, options: &FetchOptions) -> UpstreamResult<ProfileData>;

    /// Fetch the points balance.
    async fn fetch_points(&self, options: &FetchOptions) -> UpstreamResult<PointsBalance>;

    /// Fetch the coupon digest.
    async fn fetch_coupons(&self, options: &FetchOptions) -> UpstreamResult<CouponDigest>;

    /// Fetch the campaign digest.
    async fn fetch_campaigns(&self, options: &FetchOptions) -> UpstreamResult<CampaignDigest>;

    /// Fetch the rewards digest.
    async fn fetch_rewards(&self, options: &FetchOptions) -> UpstreamResult<RewardsDigest>;

    /// Fetch the current notification list, newest first.
    async fn fetch_notifications(
        &self,
        options: &FetchOptions,
    ) -> UpstreamResult<Vec<Notification>>;

    /// Fetch the cart digest.
    async fn fetch_cart(&self, options: &FetchOptions) -> UpstreamResult<CartDigest>;

    /// Fetch stored payment methods.
    async fn fetch_payment_methods(
        &self,
        options: &FetchOptions,
    ) -> UpstreamResult<Vec<PaymentMethodSummary>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_source_and_cause() {
        let error = UpstreamError::new(Source::Cart, UpstreamCause::timeout("5s elapsed"));
        assert_eq!(error.to_string(), "cart upstream failed: timed out: 5s elapsed");
    }

    #[test]
    fn only_unauthorized_is_auth() {
        assert!(UpstreamError::new(Source::Profile, UpstreamCause::unauthorized("401")).is_auth());
        assert!(!UpstreamError::new(Source::Profile, UpstreamCause::deadline_exceeded()).is_auth());
    }
}
