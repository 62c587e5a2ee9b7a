//! The in-crate two-lane executor: one affinity thread plus a background
//! pool.
//!
//! # Design
//!
//! Each lane owns a lock-free FIFO queue and a condvar for thread parking.
//! `execute` pushes and wakes; it never blocks, so reentrant submission
//! from a completion listener running on either lane is safe. The affinity
//! lane has exactly one consumer thread, which is what makes its ordering
//! strict.
//!
//! ## Shutdown
//!
//! `shutdown` (also run on drop) flips the lane flags and wakes every
//! thread; workers drain their queue and exit. Jobs submitted after
//! shutdown are dropped with a warning.
//!
//! ## Panic isolation
//!
//! A panicking job is caught and logged; the lane thread survives. Task
//! bodies convert their own panics to failures before reaching the lane,
//! so this guard only trips for raw jobs handed directly to the executor.

use crate::executor::{Executor, Job, Lane};
use crossbeam_queue::SegQueue;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, trace, warn};

/// How long an idle worker sleeps between shutdown-flag checks.
const PARK_INTERVAL: Duration = Duration::from_millis(100);

/// Configuration for [`TwoLaneExecutor`].
#[derive(Debug, Clone)]
pub struct TwoLaneConfig {
    /// Number of background worker threads. Must be at least 1.
    pub background_threads: usize,
    /// Prefix for lane thread names: `"{prefix}-affinity"`,
    /// `"{prefix}-bg-{i}"`.
    pub thread_name_prefix: String,
}

impl Default for TwoLaneConfig {
    fn default() -> Self {
        Self {
            background_threads: std::thread::available_parallelism().map_or(2, usize::from),
            thread_name_prefix: "taskline".to_string(),
        }
    }
}

struct LaneState {
    name: &'static str,
    queue: SegQueue<Job>,
    shutdown: AtomicBool,
    mutex: Mutex<()>,
    condvar: Condvar,
}

impl LaneState {
    fn new(name: &'static str) -> Self {
        Self {
            name,
            queue: SegQueue::new(),
            shutdown: AtomicBool::new(false),
            mutex: Mutex::new(()),
            condvar: Condvar::new(),
        }
    }

    fn push(&self, job: Job) {
        if self.shutdown.load(Ordering::Acquire) {
            warn!(lane = self.name, "job submitted after shutdown, dropping");
            return;
        }
        self.queue.push(job);
        self.condvar.notify_one();
    }

    fn begin_shutdown(&self) {
        self.shutdown.store(true, Ordering::Release);
        let _guard = self.mutex.lock().unwrap_or_else(|e| e.into_inner());
        self.condvar.notify_all();
    }

    /// Worker loop: run jobs until shutdown is flagged and the queue is
    /// drained.
    fn run_worker(&self) {
        loop {
            if let Some(job) = self.queue.pop() {
                trace!(lane = self.name, "running job");
                if let Err(payload) = catch_unwind(AssertUnwindSafe(job)) {
                    let cause = crate::error::Error::panicked(payload.as_ref());
                    warn!(lane = self.name, %cause, "job panicked");
                }
                continue;
            }
            if self.shutdown.load(Ordering::Acquire) {
                break;
            }
            let guard = self.mutex.lock().unwrap_or_else(|e| e.into_inner());
            if !self.queue.is_empty() || self.shutdown.load(Ordering::Acquire) {
                continue;
            }
            // Bounded park: a wake can race ahead of the push, so never
            // sleep unbounded on the condvar alone.
            let _ = self
                .condvar
                .wait_timeout(guard, PARK_INTERVAL)
                .unwrap_or_else(|e| e.into_inner());
        }
        trace!(lane = self.name, "worker exiting");
    }
}

/// A two-lane executor: one affinity thread and `background_threads`
/// pool workers.
///
/// Dropping the executor shuts both lanes down and joins every thread;
/// already-queued jobs are drained first.
pub struct TwoLaneExecutor {
    affinity: Arc<LaneState>,
    background: Arc<LaneState>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Default for TwoLaneExecutor {
    fn default() -> Self {
        Self::new(TwoLaneConfig::default())
    }
}

impl TwoLaneExecutor {
    /// Spawns the lane threads and returns the executor.
    ///
    /// # Panics
    ///
    /// Panics if `config.background_threads` is 0 or a lane thread cannot
    /// be spawned.
    #[must_use]
    pub fn new(config: TwoLaneConfig) -> Self {
        assert!(
            config.background_threads > 0,
            "background_threads must be at least 1"
        );
        let affinity = Arc::new(LaneState::new("affinity"));
        let background = Arc::new(LaneState::new("background"));
        let mut handles = Vec::with_capacity(config.background_threads + 1);

        let lane = Arc::clone(&affinity);
        handles.push(
            std::thread::Builder::new()
                .name(format!("{}-affinity", config.thread_name_prefix))
                .spawn(move || lane.run_worker())
                .expect("spawn affinity thread"),
        );
        for i in 0..config.background_threads {
            let lane = Arc::clone(&background);
            handles.push(
                std::thread::Builder::new()
                    .name(format!("{}-bg-{i}", config.thread_name_prefix))
                    .spawn(move || lane.run_worker())
                    .expect("spawn background thread"),
            );
        }
        debug!(
            background_threads = config.background_threads,
            "two-lane executor started"
        );
        Self {
            affinity,
            background,
            handles: Mutex::new(handles),
        }
    }

    /// Shuts both lanes down and joins every lane thread.
    ///
    /// Queued jobs are drained before the threads exit. Idempotent.
    pub fn shutdown(&self) {
        self.affinity.begin_shutdown();
        self.background.begin_shutdown();
        let handles = {
            let mut guard = self.handles.lock().unwrap_or_else(|e| e.into_inner());
            std::mem::take(&mut *guard)
        };
        for handle in handles {
            if handle.join().is_err() {
                warn!("lane thread panicked during shutdown");
            }
        }
    }
}

impl Executor for TwoLaneExecutor {
    fn execute(&self, lane: Lane, job: Job) {
        match lane {
            Lane::Affinity => self.affinity.push(job),
            Lane::Background => self.background.push(job),
        }
    }
}

impl Drop for TwoLaneExecutor {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for TwoLaneExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwoLaneExecutor")
            .field("affinity_queued", &self.affinity.queue.len())
            .field("background_queued", &self.background.queue.len())
            .finish()
    }
}
