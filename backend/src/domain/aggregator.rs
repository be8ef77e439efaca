//! Fan-out of every upstream read under one shared deadline.
//!
//! All eight calls start together and each is bounded by the same
//! [`Instant`]; calls still pending when it passes are dropped and recorded as
//! [`UpstreamCause::DeadlineExceeded`]. The [`FailurePolicy`] decides whether a
//! failure aborts the cycle or degrades the snapshot.

use std::fmt;
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, timeout_at};
use tracing::Instrument;
use uuid::Uuid;

use super::merge::{SourceResults, merge};
use super::ports::{AccountGateway, FetchOptions, UpstreamCause, UpstreamError, UpstreamResult};
use super::{DashboardSnapshot, Source};

/// How the aggregator reacts to failed or late sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Any failure aborts the cycle and cancels the remaining calls.
    AllOrNothing,
    /// Failed sources fall back to defaults and are listed on the snapshot.
    #[default]
    PartialResult,
}

impl FailurePolicy {
    /// Configuration label.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AllOrNothing => "all-or-nothing",
            Self::PartialResult => "partial",
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognised failure policy label.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown failure policy `{0}`; expected `all-or-nothing` or `partial`")]
pub struct ParseFailurePolicyError(String);

impl FromStr for FailurePolicy {
    type Err = ParseFailurePolicyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "all-or-nothing" | "all_or_nothing" => Ok(Self::AllOrNothing),
            "partial" | "partial-result" | "partial_result" => Ok(Self::PartialResult),
            _ => Err(ParseFailurePolicyError(value.to_owned())),
        }
    }
}

/// The cycle produced no snapshot.
///
/// The display text is deliberately generic; the per-source detail lives in
/// `failures` for logging.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("dashboard unavailable: {} of {} sources failed", .failures.len(), Source::ALL.len())]
pub struct AggregateError {
    /// Policy in force for the failed cycle.
    pub policy: FailurePolicy,
    /// The failures that ended the cycle.
    pub failures: Vec<UpstreamError>,
}

impl AggregateError {
    /// Whether an upstream rejected the session.
    #[must_use]
    pub fn is_session_expired(&self) -> bool {
        self.failures.iter().any(UpstreamError::is_auth)
    }

    /// Whether an identical cycle later might succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !self.failures.is_empty()
            && self.failures.iter().all(|failure| match &failure.cause {
                UpstreamCause::Transport { .. }
                | UpstreamCause::Timeout { .. }
                | UpstreamCause::DeadlineExceeded => true,
                UpstreamCause::Status { status, .. } => *status >= 500,
                UpstreamCause::Unauthorized { .. }
                | UpstreamCause::NotFound { .. }
                | UpstreamCause::Decode { .. } => false,
            })
    }
}

/// Runs aggregation cycles against an [`AccountGateway`].
#[derive(Clone)]
pub struct DashboardAggregator {
    gateway: Arc<dyn AccountGateway>,
    policy: FailurePolicy,
}

impl DashboardAggregator {
    /// Create an aggregator using `policy` for every cycle.
    pub fn new(gateway: Arc<dyn AccountGateway>, policy: FailurePolicy) -> Self {
        Self { gateway, policy }
    }

    /// Policy applied to every cycle.
    #[must_use]
    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Run one cycle, giving every source at most `deadline` to answer.
    pub async fn aggregate(&self, deadline: Duration) -> Result<DashboardSnapshot, AggregateError> {
        let cycle_id = Uuid::new_v4();
        let span = tracing::info_span!(
            "dashboard_aggregate",
            %cycle_id,
            policy = %self.policy,
            deadline_ms = u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX),
        );
        let until = Instant::now() + deadline;
        async move {
            let outcome = match self.policy {
                FailurePolicy::AllOrNothing => self.all_or_nothing(until).await,
                FailurePolicy::PartialResult => self.partial(until).await,
            };
            match &outcome {
                Ok(snapshot) => tracing::info!(
                    degraded_sources = snapshot.source_errors.len(),
                    "aggregation cycle complete"
                ),
                Err(error) => tracing::warn!(
                    failed_sources = error.failures.len(),
                    session_expired = error.is_session_expired(),
                    "aggregation cycle failed"
                ),
            }
            outcome
        }
        .instrument(span)
        .await
    }

    async fn all_or_nothing(&self, until: Instant) -> Result<DashboardSnapshot, AggregateError> {
        let options = FetchOptions::with_deadline(until);
        let gateway = self.gateway.as_ref();
        let joined = tokio::try_join!(
            bounded(Source::Profile, until, gateway.fetch_profile(&options)),
            bounded(Source::Points, until, gateway.fetch_points(&options)),
            bounded(Source::Coupons, until, gateway.fetch_coupons(&options)),
            bounded(Source::Campaigns, until, gateway.fetch_campaigns(&options)),
            bounded(Source::Rewards, until, gateway.fetch_rewards(&options)),
            bounded(Source::Notifications, until, gateway.fetch_notifications(&options)),
            bounded(Source::Cart, until, gateway.fetch_cart(&options)),
            bounded(Source::PaymentMethods, until, gateway.fetch_payment_methods(&options)),
        );
        let (profile, points, coupons, campaigns, rewards, notifications, cart, payment_methods) =
            joined.map_err(|failure| {
                log_failure(&failure);
                AggregateError {
                    policy: FailurePolicy::AllOrNothing,
                    failures: vec![failure],
                }
            })?;
        Ok(merge(SourceResults {
            profile: Ok(profile),
            points: Ok(points),
            coupons: Ok(coupons),
            campaigns: Ok(campaigns),
            rewards: Ok(rewards),
            notifications: Ok(notifications),
            cart: Ok(cart),
            payment_methods: Ok(payment_methods),
        }))
    }

    async fn partial(&self, until: Instant) -> Result<DashboardSnapshot, AggregateError> {
        let options = FetchOptions::with_deadline(until);
        let gateway = self.gateway.as_ref();
        let (profile, points, coupons, campaigns, rewards, notifications, cart, payment_methods) =
            tokio::join!(
                bounded(Source::Profile, until, gateway.fetch_profile(&options)),
                bounded(Source::Points, until, gateway.fetch_points(&options)),
                bounded(Source::Coupons, until, gateway.fetch_coupons(&options)),
                bounded(Source::Campaigns, until, gateway.fetch_campaigns(&options)),
                bounded(Source::Rewards, until, gateway.fetch_rewards(&options)),
                bounded(Source::Notifications, until, gateway.fetch_notifications(&options)),
                bounded(Source::Cart, until, gateway.fetch_cart(&options)),
                bounded(Source::PaymentMethods, until, gateway.fetch_payment_methods(&options)),
            );
        let results = SourceResults {
            profile,
            points,
            coupons,
            campaigns,
            rewards,
            notifications,
            cart,
            payment_methods,
        };

        let failures = results.failures();
        failures.iter().for_each(|failure| log_failure(failure));
        // A rejected session invalidates every other answer too.
        if failures.iter().any(|failure| failure.is_auth()) {
            return Err(AggregateError {
                policy: FailurePolicy::PartialResult,
                failures: failures.into_iter().cloned().collect(),
            });
        }
        Ok(merge(results))
    }
}

async fn bounded<T, F>(source: Source, until: Instant, call: F) -> UpstreamResult<T>
where
    F: Future<Output = UpstreamResult<T>>,
{
    timeout_at(until, call)
        .await
        .unwrap_or_else(|_| Err(UpstreamError::new(source, UpstreamCause::deadline_exceeded())))
}

fn log_failure(failure: &UpstreamError) {
    tracing::warn!(
        source = %failure.upstream,
        cause = failure.cause.kind(),
        error = %failure,
        "upstream source failed"
    );
}

#[cfg(test)]
#[path = "aggregator_tests.rs"]
mod tests;
