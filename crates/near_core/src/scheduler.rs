//! Scheduled task capability.
//!
//! Trackers never sleep or spawn on their own; they ask a [`Scheduler`] for a
//! repeating or one-shot task and keep the returned [`TaskHandle`] so they
//! can cancel it. Two implementations are provided:
//!
//! - [`TokioScheduler`] - runs tasks on a tokio runtime
//! - [`ManualScheduler`] - a virtual clock advanced explicitly, for
//!   deterministic tests and simulations

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tokio::time::{Instant, MissedTickBehavior};

pub type RepeatingTask = Arc<dyn Fn() + Send + Sync>;
pub type OnceTask = Box<dyn FnOnce() + Send>;

/// Source of repeating and one-shot tasks plus the clock they run on.
pub trait Scheduler: Send + Sync {
    /// Runs `task` every `interval`, first after one full interval.
    fn schedule_every(&self, interval: Duration, task: RepeatingTask) -> TaskHandle;

    /// Runs `task` once after `delay`.
    fn schedule_once(&self, delay: Duration, task: OnceTask) -> TaskHandle;

    /// Time elapsed on this scheduler's clock.
    fn now(&self) -> Duration;
}

/// Cancellation handle for a scheduled task.
///
/// Once [`cancel`](TaskHandle::cancel) returns the task will not start
/// again. Dropping the handle does not cancel the task.
#[derive(Debug)]
pub struct TaskHandle {
    cancelled: Arc<AtomicBool>,
    abort: Option<AbortHandle>,
}

impl TaskHandle {
    fn new(cancelled: Arc<AtomicBool>, abort: Option<AbortHandle>) -> Self {
        Self { cancelled, abort }
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
        if let Some(abort) = &self.abort {
            abort.abort();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

// ============================================================================
// Tokio Scheduler
// ============================================================================

/// Scheduler backed by tokio timers.
pub struct TokioScheduler {
    handle: Handle,
    epoch: Instant,
}

impl TokioScheduler {
    /// Uses the runtime the caller is running on.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn current() -> Self {
        Self::new(Handle::current())
    }

    pub fn new(handle: Handle) -> Self {
        Self {
            handle,
            epoch: Instant::now(),
        }
    }
}

impl Scheduler for TokioScheduler {
    fn schedule_every(&self, interval: Duration, task: RepeatingTask) -> TaskHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = cancelled.clone();
        let interval = interval.max(Duration::from_millis(1));

        let join = self.handle.spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if flag.load(Ordering::Acquire) {
                    break;
                }
                task();
            }
        });

        TaskHandle::new(cancelled, Some(join.abort_handle()))
    }

    fn schedule_once(&self, delay: Duration, task: OnceTask) -> TaskHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = cancelled.clone();

        let join = self.handle.spawn(async move {
            tokio::time::sleep(delay).await;
            if !flag.load(Ordering::Acquire) {
                task();
            }
        });

        TaskHandle::new(cancelled, Some(join.abort_handle()))
    }

    fn now(&self) -> Duration {
        self.epoch.elapsed()
    }
}

// ============================================================================
// Manual Scheduler
// ============================================================================

enum ManualTask {
    Repeating { task: RepeatingTask, every: Duration },
    Once(OnceTask),
}

struct ManualEntry {
    seq: u64,
    due: Duration,
    task: ManualTask,
    cancelled: Arc<AtomicBool>,
}

/// Scheduler driven by an explicit virtual clock.
///
/// Nothing runs until [`advance`](ManualScheduler::advance) is called; tasks
/// then fire in due order, each seeing [`now`](Scheduler::now) equal to its
/// due time. Tasks run without any scheduler lock held, so they may schedule
/// or cancel other tasks.
#[derive(Default)]
pub struct ManualScheduler {
    now: Mutex<Duration>,
    entries: Mutex<Vec<ManualEntry>>,
    next_seq: AtomicU64,
}

enum Fire {
    Repeating(RepeatingTask, Arc<AtomicBool>),
    Once(OnceTask, Arc<AtomicBool>),
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the clock forward by `by`, running every task that falls due.
    pub fn advance(&self, by: Duration) {
        let target = *self.now.lock() + by;

        while let Some(fire) = self.next_due(target) {
            match fire {
                Fire::Repeating(task, cancelled) => {
                    if !cancelled.load(Ordering::Acquire) {
                        task();
                    }
                }
                Fire::Once(task, cancelled) => {
                    if !cancelled.load(Ordering::Acquire) {
                        task();
                    }
                }
            }
        }

        *self.now.lock() = target;
    }

    /// Number of tasks still scheduled (cancelled ones excluded).
    pub fn pending(&self) -> usize {
        self.entries
            .lock()
            .iter()
            .filter(|entry| !entry.cancelled.load(Ordering::Acquire))
            .count()
    }

    fn next_due(&self, target: Duration) -> Option<Fire> {
        let mut entries = self.entries.lock();
        entries.retain(|entry| !entry.cancelled.load(Ordering::Acquire));

        let index = entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.due <= target)
            .min_by_key(|(_, entry)| (entry.due, entry.seq))
            .map(|(index, _)| index)?;

        *self.now.lock() = entries[index].due;

        if matches!(entries[index].task, ManualTask::Once(_)) {
            let entry = entries.swap_remove(index);
            return match entry.task {
                ManualTask::Once(task) => Some(Fire::Once(task, entry.cancelled)),
                ManualTask::Repeating { .. } => None,
            };
        }

        let entry = &mut entries[index];
        let ManualTask::Repeating { task, every } = &entry.task else {
            return None;
        };
        let (task, every) = (task.clone(), *every);
        entry.due += every;
        Some(Fire::Repeating(task, entry.cancelled.clone()))
    }

    fn push(&self, due: Duration, task: ManualTask) -> TaskHandle {
        let cancelled = Arc::new(AtomicBool::new(false));
        self.entries.lock().push(ManualEntry {
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
            due,
            task,
            cancelled: cancelled.clone(),
        });
        TaskHandle::new(cancelled, None)
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_every(&self, interval: Duration, task: RepeatingTask) -> TaskHandle {
        let every = interval.max(Duration::from_millis(1));
        let due = *self.now.lock() + every;
        self.push(due, ManualTask::Repeating { task, every })
    }

    fn schedule_once(&self, delay: Duration, task: OnceTask) -> TaskHandle {
        let due = *self.now.lock() + delay;
        self.push(due, ManualTask::Once(task))
    }

    fn now(&self) -> Duration {
        *self.now.lock()
    }
}
