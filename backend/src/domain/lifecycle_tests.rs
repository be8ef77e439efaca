//! Unit tests for notification lifecycle operations.

use std::sync::Arc;

use rstest::{fixture, rstest};
use serde_json::json;

use super::*;
use crate::domain::ErrorCode;
use crate::domain::ports::{MockNotificationCommand, MockSettingsStore};
use crate::domain::Source;
use crate::test_support::RecordingCommand;
use crate::test_support::fixtures::sample_notifications;

#[fixture]
fn cache() -> NotificationCache {
    let cache = NotificationCache::new();
    cache.seed(sample_notifications()).expect("seed cache");
    cache
}

fn lifecycle(
    cache: &NotificationCache,
    command: MockNotificationCommand,
    store: MockSettingsStore,
) -> NotificationLifecycle {
    NotificationLifecycle::new(cache.clone(), Arc::new(command), Arc::new(store))
}

fn failure(cause: UpstreamCause) -> UpstreamError {
    UpstreamError::new(Source::Notifications, cause)
}

#[rstest]
#[tokio::test]
async fn marking_unread_notification_calls_service_then_updates_cache(cache: NotificationCache) {
    let mut command = MockNotificationCommand::new();
    command
        .expect_mark_read()
        .withf(|id| id.as_str() == "n3")
        .times(1)
        .returning(|_| Ok(()));
    let lifecycle = lifecycle(&cache, command, MockSettingsStore::new());

    lifecycle
        .mark_as_read(&NotificationId::new("n3"))
        .await
        .expect("mark read");

    let view = cache.view().expect("view");
    assert_eq!(view.unread_count, 1);
    assert!(view.notifications[0].read);
}

#[rstest]
#[tokio::test]
async fn marking_read_notification_skips_service(cache: NotificationCache) {
    let mut command = MockNotificationCommand::new();
    command.expect_mark_read().times(0);
    let lifecycle = lifecycle(&cache, command, MockSettingsStore::new());

    lifecycle
        .mark_as_read(&NotificationId::new("n2"))
        .await
        .expect("already read");

    assert_eq!(cache.unread_count().expect("count"), 2);
}

#[rstest]
#[tokio::test]
async fn unknown_notification_is_not_found(cache: NotificationCache) {
    let mut command = MockNotificationCommand::new();
    command.expect_mark_read().times(0);
    command.expect_delete().times(0);
    let lifecycle = lifecycle(&cache, command, MockSettingsStore::new());
    let id = NotificationId::new("n5");

    let marked = lifecycle.mark_as_read(&id).await.expect_err("unknown id");
    let deleted = lifecycle.delete_notification(&id).await.expect_err("unknown id");

    for error in [marked, deleted] {
        assert_eq!(error.code(), ErrorCode::NotFound);
        assert_eq!(error.details(), Some(&json!({ "notificationId": "n5" })));
    }
    assert_eq!(cache.view().expect("view").notifications.len(), 3);
}

#[rstest]
#[case(UpstreamCause::timeout("5s"), ErrorCode::ServiceUnavailable)]
#[case(UpstreamCause::status(500_u16, "boom"), ErrorCode::ServiceUnavailable)]
#[case(UpstreamCause::unauthorized("401"), ErrorCode::Unauthorized)]
#[case(UpstreamCause::not_found("gone"), ErrorCode::NotFound)]
#[case(UpstreamCause::decode("bad body"), ErrorCode::InternalError)]
#[tokio::test]
async fn failed_mark_read_leaves_cache_untouched(
    cache: NotificationCache,
    #[case] cause: UpstreamCause,
    #[case] expected: ErrorCode,
) {
    let mut command = MockNotificationCommand::new();
    command
        .expect_mark_read()
        .times(1)
        .returning(move |_| Err(failure(cause.clone())));
    let lifecycle = lifecycle(&cache, command, MockSettingsStore::new());

    let error = lifecycle
        .mark_as_read(&NotificationId::new("n1"))
        .await
        .expect_err("upstream failure");

    assert_eq!(error.code(), expected);
    assert_eq!(
        error.details().and_then(|details| details.get("notificationId")),
        Some(&json!("n1"))
    );
    assert_eq!(cache.unread_count().expect("count"), 2);
}

#[rstest]
#[case("n3", 1)]
#[case("n2", 2)]
#[tokio::test]
async fn deleting_adjusts_counter_only_for_unread(
    cache: NotificationCache,
    #[case] id: &str,
    #[case] unread_after: usize,
) {
    let mut command = MockNotificationCommand::new();
    command.expect_delete().times(1).returning(|_| Ok(()));
    let lifecycle = lifecycle(&cache, command, MockSettingsStore::new());

    lifecycle
        .delete_notification(&NotificationId::new(id))
        .await
        .expect("delete");

    let view = cache.view().expect("view");
    assert_eq!(view.notifications.len(), 2);
    assert_eq!(view.unread_count, unread_after);
}

#[rstest]
#[tokio::test]
async fn failed_delete_keeps_notification(cache: NotificationCache) {
    let mut command = MockNotificationCommand::new();
    command
        .expect_delete()
        .returning(|_| Err(failure(UpstreamCause::transport("reset"))));
    let lifecycle = lifecycle(&cache, command, MockSettingsStore::new());

    let error = lifecycle
        .delete_notification(&NotificationId::new("n1"))
        .await
        .expect_err("delete failure");

    assert_eq!(error.code(), ErrorCode::ServiceUnavailable);
    assert!(error.code().is_retryable());
    assert_eq!(cache.view().expect("view").notifications.len(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_mark_read_and_delete_keep_counter_consistent() {
    let id = NotificationId::new("n3");
    for _ in 0..64 {
        let cache = NotificationCache::new();
        cache.seed(sample_notifications()).expect("seed cache");
        let lifecycle = Arc::new(NotificationLifecycle::new(
            cache.clone(),
            Arc::new(RecordingCommand::new().yielding()),
            Arc::new(MockSettingsStore::new()),
        ));

        let marking = tokio::spawn({
            let lifecycle = lifecycle.clone();
            let id = id.clone();
            async move { lifecycle.mark_as_read(&id).await }
        });
        let deleting = tokio::spawn({
            let lifecycle = lifecycle.clone();
            let id = id.clone();
            async move { lifecycle.delete_notification(&id).await }
        });
        let (marked, deleted) = tokio::join!(marking, deleting);

        // Mark-read may start after the delete already removed the item.
        if let Err(error) = marked.expect("mark task") {
            assert_eq!(error.code(), ErrorCode::NotFound);
        }
        deleted.expect("delete task").expect("delete");
        let view = cache.view().expect("view");
        let unread = view.notifications.iter().filter(|item| !item.read).count();
        assert_eq!(view.unread_count, unread);
        assert_eq!(view.unread_count, 1);
        assert!(view.notifications.iter().all(|item| item.id != id));
    }
}

#[rstest]
fn settings_changes_stay_local_until_commit(cache: NotificationCache) {
    let mut store = MockSettingsStore::new();
    store.expect_commit().times(0);
    let lifecycle = lifecycle(&cache, MockNotificationCommand::new(), store);

    let toggled = lifecycle.toggle_setting(SettingKey::Marketing).expect("toggle");
    let patched = lifecycle
        .update_settings(SettingsPatch {
            email: Some(false),
            ..SettingsPatch::default()
        })
        .expect("patch");

    assert!(toggled.marketing);
    assert!(!patched.email);
    assert!(patched.marketing);
    assert!(lifecycle.has_uncommitted_settings().expect("drift"));
}

#[rstest]
#[tokio::test]
async fn commit_hands_current_settings_to_store(cache: NotificationCache) {
    let mut store = MockSettingsStore::new();
    store
        .expect_commit()
        .withf(|settings| settings.marketing && settings.email)
        .times(1)
        .returning(|_| Ok(()));
    let lifecycle = lifecycle(&cache, MockNotificationCommand::new(), store);
    lifecycle.toggle_setting(SettingKey::Marketing).expect("toggle");

    let committed = lifecycle.commit_settings().await.expect("commit");

    assert!(committed.marketing);
    assert!(!lifecycle.has_uncommitted_settings().expect("drift"));
}

#[rstest]
#[case(SettingsStoreError::unavailable("offline"), ErrorCode::ServiceUnavailable)]
#[case(SettingsStoreError::rejected("marketing locked"), ErrorCode::InvalidRequest)]
#[tokio::test]
async fn failed_commit_keeps_settings_uncommitted(
    cache: NotificationCache,
    #[case] failure: SettingsStoreError,
    #[case] expected: ErrorCode,
) {
    let mut store = MockSettingsStore::new();
    store
        .expect_commit()
        .returning(move |_| Err(failure.clone()));
    let lifecycle = lifecycle(&cache, MockNotificationCommand::new(), store);
    lifecycle.toggle_setting(SettingKey::Push).expect("toggle");

    let error = lifecycle.commit_settings().await.expect_err("commit failure");

    assert_eq!(error.code(), expected);
    assert!(lifecycle.has_uncommitted_settings().expect("drift"));
    assert!(!lifecycle.settings().expect("settings").push);
}
