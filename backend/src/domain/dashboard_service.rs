//! Publishes aggregated snapshots and seeds the notification cache.
//!
//! Refreshes may overlap. Each one takes a generation number when it starts;
//! a result is published only if no newer refresh has published already.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::watch;

use super::aggregator::{AggregateError, DashboardAggregator};
use super::notification_cache::{NotificationCache, PushMark};
use super::{DashboardSnapshot, Source};

#[derive(Debug, Clone, Default)]
struct Published {
    generation: u64,
    snapshot: Option<Arc<DashboardSnapshot>>,
}

/// Runs aggregation cycles and owns the published snapshot.
pub struct DashboardService {
    aggregator: DashboardAggregator,
    cache: NotificationCache,
    deadline: Duration,
    next_generation: AtomicU64,
    published: watch::Sender<Published>,
    snapshots: watch::Sender<Option<Arc<DashboardSnapshot>>>,
}

impl DashboardService {
    /// Create a service whose cycles wait at most `deadline` for sources.
    pub fn new(
        aggregator: DashboardAggregator,
        cache: NotificationCache,
        deadline: Duration,
    ) -> Self {
        let (published, _) = watch::channel(Published::default());
        let (snapshots, _) = watch::channel(None);
        Self {
            aggregator,
            cache,
            deadline,
            next_generation: AtomicU64::new(1),
            published,
            snapshots,
        }
    }

    /// Run one cycle and publish its snapshot unless a newer one exists.
    ///
    /// Returns the snapshot this cycle produced, even when it was superseded.
    pub async fn refresh(&self) -> Result<Arc<DashboardSnapshot>, AggregateError> {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let mark = self.push_mark();
        let snapshot = Arc::new(self.aggregator.aggregate(self.deadline).await?);

        let accepted = self.published.send_if_modified(|current| {
            if current.generation >= generation {
                return false;
            }
            current.generation = generation;
            current.snapshot = Some(snapshot.clone());
            // Still under the publication lock, so generations land in order.
            self.snapshots.send_replace(Some(snapshot.clone()));
            self.seed_cache(&snapshot, mark);
            true
        });

        if accepted {
            tracing::debug!(generation, "dashboard snapshot published");
        } else {
            tracing::debug!(generation, "stale dashboard snapshot discarded");
        }
        Ok(snapshot)
    }

    /// Most recently published snapshot.
    #[must_use]
    pub fn latest(&self) -> Option<Arc<DashboardSnapshot>> {
        self.published.borrow().snapshot.clone()
    }

    /// Receiver observing every published snapshot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<Arc<DashboardSnapshot>>> {
        self.snapshots.subscribe()
    }

    fn push_mark(&self) -> PushMark {
        self.cache.push_mark().unwrap_or_else(|error| {
            tracing::error!(%error, "failed to read notification push sequence");
            PushMark::default()
        })
    }

    /// Pushes applied while the cycle was in flight survive the reseed.
    fn seed_cache(&self, snapshot: &DashboardSnapshot, mark: PushMark) {
        if snapshot.source_errors.contains_key(&Source::Notifications) {
            tracing::debug!("notification source degraded; keeping cached notifications");
            return;
        }
        if let Err(error) = self.cache.reseed(snapshot.notifications.clone(), mark) {
            tracing::error!(%error, "failed to seed notification cache");
        }
    }
}
