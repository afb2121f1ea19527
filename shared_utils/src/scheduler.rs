//! Bounded Scheduler
//!
//! Runs a list of tasks on a rayon pool while a counting semaphore caps how
//! many of them are admitted at once. Tasks are admitted in list order from
//! the calling thread; completion order is whatever the pool produces.
//!
//! A task holds its [`AdmissionPermit`] from admission until its completion
//! callback returns. The permit is an RAII guard, so it is released on panic
//! as well. Panics inside a task are caught and handed to the completion
//! callback; they never take down sibling tasks.
//!
//! There is no cancellation and no per-task timeout: a stalled task keeps its
//! slot until it returns.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Condvar, Mutex, MutexGuard};
use thiserror::Error;
use tracing::{debug, error};

#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("failed to create worker pool: {0}")]
    PoolBuild(#[from] rayon::ThreadPoolBuildError),
}

/// A task that panicked instead of returning.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("task panicked: {message}")]
pub struct TaskPanic {
    pub message: String,
}

impl TaskPanic {
    fn from_payload(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        Self { message }
    }
}

// ═══════════════════════════════════════════════════════════════
// Counting semaphore
// ═══════════════════════════════════════════════════════════════

/// Blocking counting semaphore with a fixed number of permits.
#[derive(Debug)]
pub struct Semaphore {
    capacity: usize,
    available: Mutex<usize>,
    released: Condvar,
}

impl Semaphore {
    /// Capacity is clamped to at least one permit.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            available: Mutex::new(capacity),
            released: Condvar::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn available(&self) -> usize {
        *self.lock()
    }

    /// Block until a permit is free and take it.
    pub fn acquire(&self) -> AdmissionPermit<'_> {
        let mut available = self.lock();
        while *available == 0 {
            available = self
                .released
                .wait(available)
                .unwrap_or_else(|e| e.into_inner());
        }
        *available -= 1;
        AdmissionPermit { semaphore: self }
    }

    /// Take a permit if one is free right now.
    pub fn try_acquire(&self) -> Option<AdmissionPermit<'_>> {
        let mut available = self.lock();
        if *available == 0 {
            return None;
        }
        *available -= 1;
        Some(AdmissionPermit { semaphore: self })
    }

    fn release(&self) {
        let mut available = self.lock();
        *available += 1;
        debug_assert!(*available <= self.capacity, "semaphore over-released");
        drop(available);
        self.released.notify_one();
    }

    fn lock(&self) -> MutexGuard<'_, usize> {
        self.available.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Held while a task occupies a slot; dropping it frees the slot.
#[derive(Debug)]
pub struct AdmissionPermit<'a> {
    semaphore: &'a Semaphore,
}

impl Drop for AdmissionPermit<'_> {
    fn drop(&mut self) {
        self.semaphore.release();
    }
}

// ═══════════════════════════════════════════════════════════════
// Scheduler
// ═══════════════════════════════════════════════════════════════

/// Fixed-width worker pool.
#[derive(Debug, Clone, Copy)]
pub struct BoundedScheduler {
    limit: usize,
}

impl BoundedScheduler {
    /// `limit` is clamped to at least 1.
    pub fn new(limit: usize) -> Self {
        Self {
            limit: limit.max(1),
        }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Run every task to completion.
    ///
    /// `work` runs on a pool thread while the task holds a permit;
    /// `on_done` receives the task and its result (or the caught panic) before
    /// the permit is released. Returns once every admitted task finished.
    pub fn run<T, O, W, D>(&self, tasks: Vec<T>, work: W, on_done: D) -> Result<(), SchedulerError>
    where
        T: Send,
        W: Fn(&T) -> O + Sync,
        D: Fn(&T, Result<O, TaskPanic>) + Sync,
    {
        if tasks.is_empty() {
            return Ok(());
        }

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.limit)
            .thread_name(|i| format!("convert-worker-{}", i))
            .build()?;
        let permits = Semaphore::new(self.limit);

        debug!(
            tasks = tasks.len(),
            limit = self.limit,
            "Dispatching tasks to bounded pool"
        );

        let work = &work;
        let on_done = &on_done;
        let permits_ref = &permits;

        pool.in_place_scope_fifo(|scope| {
            for task in tasks {
                let permit = permits_ref.acquire();
                scope.spawn_fifo(move |_| {
                    let _permit = permit;
                    let result = panic::catch_unwind(AssertUnwindSafe(|| work(&task)))
                        .map_err(TaskPanic::from_payload);
                    if let Err(ref p) = result {
                        error!(message = %p.message, "Task panicked");
                    }
                    if panic::catch_unwind(AssertUnwindSafe(|| on_done(&task, result))).is_err() {
                        error!("Completion callback panicked");
                    }
                });
            }
        });

        debug_assert_eq!(permits.available(), permits.capacity());
        Ok(())
    }
}
