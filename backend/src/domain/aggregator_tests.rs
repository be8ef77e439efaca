//! Unit tests for the fan-out aggregator.

use std::sync::Arc;
use std::time::Duration;

use rstest::rstest;

use super::*;
use crate::domain::ports::MockAccountGateway;
use crate::test_support::ScriptedGateway;
use crate::test_support::fixtures::{
    sample_campaigns, sample_cart, sample_coupons, sample_notifications, sample_payment_methods,
    sample_points, sample_profile, sample_rewards,
};

const GENEROUS: Duration = Duration::from_secs(2);

fn healthy_mock() -> MockAccountGateway {
    let mut gateway = MockAccountGateway::new();
    gateway.expect_fetch_profile().returning(|_| Ok(sample_profile()));
    gateway.expect_fetch_points().returning(|_| Ok(sample_points()));
    gateway.expect_fetch_coupons().returning(|_| Ok(sample_coupons()));
    gateway.expect_fetch_campaigns().returning(|_| Ok(sample_campaigns()));
    gateway.expect_fetch_rewards().returning(|_| Ok(sample_rewards()));
    gateway
        .expect_fetch_notifications()
        .returning(|_| Ok(sample_notifications()));
    gateway.expect_fetch_cart().returning(|_| Ok(sample_cart()));
    gateway
        .expect_fetch_payment_methods()
        .returning(|_| Ok(sample_payment_methods()));
    gateway
}

#[rstest]
#[case("all-or-nothing", FailurePolicy::AllOrNothing)]
#[case("ALL_OR_NOTHING", FailurePolicy::AllOrNothing)]
#[case("partial", FailurePolicy::PartialResult)]
#[case(" partial-result ", FailurePolicy::PartialResult)]
fn parses_policy_labels(#[case] label: &str, #[case] expected: FailurePolicy) {
    assert_eq!(label.parse::<FailurePolicy>().expect("policy"), expected);
}

#[test]
fn rejects_unknown_policy_label() {
    let error = "best-effort".parse::<FailurePolicy>().expect_err("unknown label");
    assert!(error.to_string().contains("best-effort"));
}

#[test]
fn default_policy_is_partial() {
    assert_eq!(FailurePolicy::default(), FailurePolicy::PartialResult);
}

#[rstest]
#[case(FailurePolicy::AllOrNothing)]
#[case(FailurePolicy::PartialResult)]
#[tokio::test]
async fn healthy_sources_produce_complete_snapshot(#[case] policy: FailurePolicy) {
    let aggregator = DashboardAggregator::new(Arc::new(healthy_mock()), policy);

    let snapshot = aggregator.aggregate(GENEROUS).await.expect("snapshot");

    assert_eq!(snapshot.points, 1200);
    assert_eq!(snapshot.level_progress(), Some(0.6));
    assert!(!snapshot.is_degraded());
}

#[tokio::test]
async fn every_call_carries_the_shared_deadline() {
    let mut gateway = MockAccountGateway::new();
    gateway
        .expect_fetch_profile()
        .withf(|options| options.deadline.is_some())
        .returning(|_| Ok(sample_profile()));
    gateway
        .expect_fetch_points()
        .withf(|options| options.deadline.is_some())
        .returning(|_| Ok(sample_points()));
    gateway.expect_fetch_coupons().returning(|_| Ok(sample_coupons()));
    gateway.expect_fetch_campaigns().returning(|_| Ok(sample_campaigns()));
    gateway.expect_fetch_rewards().returning(|_| Ok(sample_rewards()));
    gateway
        .expect_fetch_notifications()
        .returning(|_| Ok(sample_notifications()));
    gateway.expect_fetch_cart().returning(|_| Ok(sample_cart()));
    gateway
        .expect_fetch_payment_methods()
        .returning(|_| Ok(sample_payment_methods()));
    let aggregator = DashboardAggregator::new(Arc::new(gateway), FailurePolicy::PartialResult);

    aggregator.aggregate(GENEROUS).await.expect("snapshot");
}

#[tokio::test]
async fn partial_policy_degrades_failed_source() {
    let gateway = ScriptedGateway::healthy()
        .failing(Source::Coupons, UpstreamCause::transport("connection reset"));
    let aggregator = DashboardAggregator::new(Arc::new(gateway), FailurePolicy::PartialResult);

    let snapshot = aggregator.aggregate(GENEROUS).await.expect("snapshot");

    assert_eq!(snapshot.available_coupons_count, 0);
    assert_eq!(snapshot.points, 1200);
    assert_eq!(
        snapshot.source_errors.keys().copied().collect::<Vec<_>>(),
        [Source::Coupons]
    );
}

#[tokio::test]
async fn all_or_nothing_returns_first_failure() {
    let gateway = ScriptedGateway::healthy()
        .failing(Source::Cart, UpstreamCause::status(503_u16, "maintenance"));
    let aggregator = DashboardAggregator::new(Arc::new(gateway), FailurePolicy::AllOrNothing);

    let error = aggregator.aggregate(GENEROUS).await.expect_err("aggregate error");

    assert_eq!(error.policy, FailurePolicy::AllOrNothing);
    assert_eq!(error.failures.len(), 1);
    assert_eq!(error.failures[0].upstream, Source::Cart);
    assert!(error.is_retryable());
    assert!(!error.is_session_expired());
}

#[tokio::test]
async fn all_or_nothing_cancels_pending_calls_on_failure() {
    let gateway = Arc::new(
        ScriptedGateway::healthy()
            .failing(Source::Points, UpstreamCause::not_found("no balance"))
            .delayed(Source::Rewards, Duration::from_millis(500)),
    );
    let aggregator = DashboardAggregator::new(gateway.clone(), FailurePolicy::AllOrNothing);

    let error = aggregator.aggregate(GENEROUS).await.expect_err("aggregate error");
    tokio::time::sleep(Duration::from_millis(600)).await;

    assert_eq!(error.failures[0].upstream, Source::Points);
    assert!(!gateway.finished_sources().contains(&Source::Rewards));
}

#[tokio::test]
async fn late_source_is_reported_as_deadline_exceeded() {
    let gateway = ScriptedGateway::healthy().delayed(Source::Points, Duration::from_secs(5));
    let aggregator = DashboardAggregator::new(Arc::new(gateway), FailurePolicy::PartialResult);

    let started = Instant::now();
    let snapshot = aggregator
        .aggregate(Duration::from_millis(100))
        .await
        .expect("snapshot");

    assert!(started.elapsed() < Duration::from_secs(1));
    assert_eq!(snapshot.points, 0);
    assert_eq!(
        snapshot.source_errors.get(&Source::Points).map(String::as_str),
        Some("points upstream failed: aggregation deadline exceeded")
    );
}

#[tokio::test]
async fn unauthorized_escalates_under_partial_policy() {
    let gateway = ScriptedGateway::healthy()
        .failing(Source::Profile, UpstreamCause::unauthorized("token expired"))
        .failing(Source::Cart, UpstreamCause::timeout("slow"));
    let aggregator = DashboardAggregator::new(Arc::new(gateway), FailurePolicy::PartialResult);

    let error = aggregator.aggregate(GENEROUS).await.expect_err("aggregate error");

    assert!(error.is_session_expired());
    assert!(!error.is_retryable());
    assert_eq!(error.failures.len(), 2);
    assert_eq!(error.to_string(), "dashboard unavailable: 2 of 8 sources failed");
}

#[rstest]
#[case(UpstreamCause::decode("bad json"), false)]
#[case(UpstreamCause::status(400_u16, "bad request"), false)]
#[case(UpstreamCause::status(502_u16, "bad gateway"), true)]
#[case(UpstreamCause::deadline_exceeded(), true)]
fn retryability_follows_cause(#[case] cause: UpstreamCause, #[case] expected: bool) {
    let error = AggregateError {
        policy: FailurePolicy::AllOrNothing,
        failures: vec![UpstreamError::new(Source::Rewards, cause)],
    };
    assert_eq!(error.is_retryable(), expected);
}
