use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tracing::{debug, warn};

/// Shortest period a repeating task may tick at.
pub const MIN_PERIOD: Duration = Duration::from_millis(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskKey {
    AutoAdvance,
    PassiveIncome,
    MinigameSpawner,
}

/// Identifies one scheduling of a key. Stale handles cannot cancel newer tasks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskHandle {
    pub key: TaskKey,
    generation: u64,
}

struct ScheduledTask {
    generation: u64,
    handle: JoinHandle<()>,
}

/// Keyed background timers. Scheduling a key replaces whatever ran under it before.
#[derive(Default)]
pub struct Scheduler {
    tasks: Arc<DashMap<TaskKey, ScheduledTask>>,
    next_generation: AtomicU64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `task` once after `delay`.
    pub fn schedule_once<F>(&self, key: TaskKey, delay: Duration, task: F) -> TaskHandle
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);
        let tasks = self.tasks.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Deregister first so the task can schedule or cancel its own key
            tasks.remove_if(&key, |_, scheduled| scheduled.generation == generation);
            task.await;
        });

        self.register(key, generation, handle)
    }

    /// Runs `task` every `period`, first after one full period.
    pub fn schedule_repeating<F, Fut>(&self, key: TaskKey, period: Duration, mut task: F) -> TaskHandle
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let period = if period.is_zero() {
            warn!("Zero period for {:?}, using {:?}", key, MIN_PERIOD);
            MIN_PERIOD
        } else {
            period
        };
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                task().await;
            }
        });

        self.register(key, generation, handle)
    }

    fn register(&self, key: TaskKey, generation: u64, handle: JoinHandle<()>) -> TaskHandle {
        if let Some(previous) = self.tasks.insert(key, ScheduledTask { generation, handle }) {
            debug!("Superseding {:?} task", key);
            previous.handle.abort();
        }
        TaskHandle { key, generation }
    }

    pub fn cancel(&self, key: TaskKey) -> bool {
        match self.tasks.remove(&key) {
            Some((_, scheduled)) => {
                scheduled.handle.abort();
                true
            }
            None => false,
        }
    }

    /// Cancels only if the handle still refers to the live task for its key.
    pub fn cancel_handle(&self, handle: TaskHandle) -> bool {
        match self
            .tasks
            .remove_if(&handle.key, |_, scheduled| scheduled.generation == handle.generation)
        {
            Some((_, scheduled)) => {
                scheduled.handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn is_scheduled(&self, key: TaskKey) -> bool {
        self.tasks
            .get(&key)
            .is_some_and(|scheduled| !scheduled.handle.is_finished())
    }

    pub fn cancel_all(&self) {
        self.tasks.retain(|_, scheduled| {
            scheduled.handle.abort();
            false
        });
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, Arc<AtomicUsize>) {
        let count = Arc::new(AtomicUsize::new(0));
        (count.clone(), count)
    }

    #[tokio::test(start_paused = true)]
    async fn test_once_fires_after_delay() {
        let scheduler = Scheduler::new();
        let (count, seen) = counter();

        scheduler.schedule_once(TaskKey::AutoAdvance, Duration::from_secs(5), async move {
            count.fetch_add(1, Ordering::SeqCst);
        });
        assert!(scheduler.is_scheduled(TaskKey::AutoAdvance));

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert_eq!(seen.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(seen.load(Ordering::SeqCst), 1);
        assert!(!scheduler.is_scheduled(TaskKey::AutoAdvance));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_prevents_firing() {
        let scheduler = Scheduler::new();
        let (count, seen) = counter();

        scheduler.schedule_once(TaskKey::AutoAdvance, Duration::from_secs(5), async move {
            count.fetch_add(1, Ordering::SeqCst);
        });
        assert!(scheduler.cancel(TaskKey::AutoAdvance));
        assert!(!scheduler.cancel(TaskKey::AutoAdvance));

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(seen.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rescheduling_supersedes() {
        let scheduler = Scheduler::new();
        let (count, seen) = counter();
        let first_count = count.clone();

        let stale = scheduler.schedule_once(TaskKey::AutoAdvance, Duration::from_secs(1), async move {
            first_count.fetch_add(10, Ordering::SeqCst);
        });
        scheduler.schedule_once(TaskKey::AutoAdvance, Duration::from_secs(2), async move {
            count.fetch_add(1, Ordering::SeqCst);
        });

        // The stale handle no longer owns the key
        assert!(!scheduler.cancel_handle(stale));

        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeating_ticks_until_cancelled() {
        let scheduler = Scheduler::new();
        let (count, seen) = counter();

        scheduler.schedule_repeating(TaskKey::PassiveIncome, Duration::from_secs(10), move || {
            let count = count.clone();
            async move {
                count.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_secs(35)).await;
        assert_eq!(seen.load(Ordering::SeqCst), 3);

        scheduler.cancel_all();
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(seen.load(Ordering::SeqCst), 3);
        assert!(!scheduler.is_scheduled(TaskKey::PassiveIncome));
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_period_is_clamped() {
        let scheduler = Scheduler::new();
        let (count, seen) = counter();

        scheduler.schedule_repeating(TaskKey::PassiveIncome, Duration::ZERO, move || {
            let count = count.clone();
            async move {
                count.fetch_add(1, Ordering::SeqCst);
            }
        });

        tokio::time::sleep(Duration::from_millis(5)).await;
        assert!(scheduler.is_scheduled(TaskKey::PassiveIncome));
        assert!(seen.load(Ordering::SeqCst) >= 1);
        scheduler.cancel_all();
    }
}
