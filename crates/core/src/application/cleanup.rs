// Cleanup Scheduler
//
// Age-based eviction runs on a schedule owned by this composition layer,
// not transactionally with write/poll. Each tick sweeps every known queue
// with the currently configured maximum entry age.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{error, info};

use crate::config::ConfigHandle;
use crate::error::Result;
use crate::port::{QueueRepository, TimeProvider};

pub struct CleanupScheduler {
    queue_repo: Arc<dyn QueueRepository>,
    time_provider: Arc<dyn TimeProvider>,
    config: Arc<ConfigHandle>,
}

impl CleanupScheduler {
    pub fn new(
        queue_repo: Arc<dyn QueueRepository>,
        time_provider: Arc<dyn TimeProvider>,
        config: Arc<ConfigHandle>,
    ) -> Self {
        Self {
            queue_repo,
            time_provider,
            config,
        }
    }

    /// Run the cleanup loop. Should be spawned in tokio::spawn.
    ///
    /// The interval is re-read from the configuration snapshot before every
    /// tick, so a reload takes effect at the next sweep. A failed sweep is
    /// logged and the loop continues; the next tick retries from scratch.
    pub async fn run(self) {
        info!(
            interval_secs = self.config.snapshot().cleanup_interval_secs,
            "cleanup scheduler started"
        );

        loop {
            let interval_secs = self.config.snapshot().cleanup_interval_secs.max(1);
            sleep(Duration::from_secs(interval_secs)).await;
            if let Err(e) = self.sweep().await {
                error!(error = ?e, "scheduled cleanup failed");
            }
        }
    }

    /// Sweep every queue once with the configured maximum entry age.
    pub async fn sweep(&self) -> Result<u64> {
        let max_age_secs = self.config.snapshot().max_entry_age_secs;
        let cutoff = self.time_provider.now_millis() - max_age_secs * 1000;

        let queues = self.queue_repo.list_queues().await?;
        let mut removed = 0u64;
        for queue in &queues {
            removed += self
                .queue_repo
                .delete_entries_older_than(&queue.id, cutoff)
                .await?;
        }
        if removed > 0 {
            info!(removed, queues = queues.len(), "cleanup sweep completed");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::domain::{EntryId, Queue, QueueEntry, QueueId};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU64, Ordering};

    /// Queue store fake counting sweep passes.
    #[derive(Default)]
    struct CountingQueues {
        sweeps: AtomicU64,
    }

    #[async_trait]
    impl QueueRepository for CountingQueues {
        async fn insert_queue(&self, _queue: &Queue) -> Result<()> {
            unimplemented!()
        }
        async fn delete_queue(&self, _id: &QueueId) -> Result<()> {
            unimplemented!()
        }
        async fn list_queues(&self) -> Result<Vec<Queue>> {
            self.sweeps.fetch_add(1, Ordering::SeqCst);
            Ok(vec![Queue::new("q1", "")])
        }
        async fn insert_entry(&self, _entry: &QueueEntry) -> Result<()> {
            unimplemented!()
        }
        async fn oldest_entry(&self, _queue_id: &QueueId) -> Result<Option<QueueEntry>> {
            unimplemented!()
        }
        async fn delete_entry(&self, _queue_id: &QueueId, _entry_id: &EntryId) -> Result<()> {
            unimplemented!()
        }
        async fn has_entries(&self, _queue_id: &QueueId) -> Result<bool> {
            unimplemented!()
        }
        async fn delete_entries_older_than(
            &self,
            _queue_id: &QueueId,
            _cutoff_millis: i64,
        ) -> Result<u64> {
            Ok(0)
        }
    }

    struct FixedTime;
    impl TimeProvider for FixedTime {
        fn now_millis(&self) -> i64 {
            1_000_000
        }
    }

    #[tokio::test(start_paused = true)]
    async fn reloaded_interval_applies_without_restart() {
        let store = Arc::new(CountingQueues::default());
        let config = Arc::new(ConfigHandle::from_config(AppConfig {
            cleanup_interval_secs: 300,
            ..AppConfig::default()
        }));
        let scheduler = CleanupScheduler::new(store.clone(), Arc::new(FixedTime), config.clone());
        let task = tokio::spawn(scheduler.run());

        // Let the loop register its first sleep before advancing the clock
        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_secs(300)).await;
        tokio::task::yield_now().await;
        assert_eq!(store.sweeps.load(Ordering::SeqCst), 1);

        // Shrink the interval. The sleep already in flight still runs its
        // original 300s; the one after it picks up the new value.
        config.replace(AppConfig {
            cleanup_interval_secs: 10,
            ..AppConfig::default()
        });
        tokio::time::advance(Duration::from_secs(300)).await;
        tokio::task::yield_now().await;
        assert_eq!(store.sweeps.load(Ordering::SeqCst), 2);

        tokio::time::advance(Duration::from_secs(10)).await;
        tokio::task::yield_now().await;
        assert_eq!(store.sweeps.load(Ordering::SeqCst), 3);

        task.abort();
    }
}
