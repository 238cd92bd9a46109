//! Batch scheduler for the CPU phase.
//!
//! The work list is cut into fixed-size batches. Participants claim batches
//! through a shared atomic cursor until none are left: the pool's workers
//! plus the calling thread itself. The pool is built once and reused every
//! tick.
//!
//! Which participant runs which batch depends on timing, so the order in
//! which batches finish is not reproducible across runs. Anything a batch
//! appends to shared state (the reproduction queue in particular) inherits
//! that ordering.

use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Splits per-slot work into batches claimed by a fixed set of threads.
pub struct Scheduler {
    /// `None` when the caller is the only participant.
    pool: Option<ThreadPool>,
    thread_count: usize,
    batch_size: usize,
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("thread_count", &self.thread_count)
            .field("batch_size", &self.batch_size)
            .finish()
    }
}

impl Scheduler {
    /// `thread_count` counts the caller; a count of one runs everything
    /// inline.
    pub fn new(thread_count: usize, batch_size: usize) -> anyhow::Result<Self> {
        anyhow::ensure!(thread_count > 0, "Thread count must be at least 1");
        anyhow::ensure!(batch_size > 0, "Batch size must be positive");
        let pool = if thread_count > 1 {
            Some(
                ThreadPoolBuilder::new()
                    .num_threads(thread_count - 1)
                    .thread_name(|i| format!("symbiolab-worker-{i}"))
                    .build()?,
            )
        } else {
            None
        };
        tracing::debug!(thread_count, batch_size, "scheduler ready");
        Ok(Self {
            pool,
            thread_count,
            batch_size,
        })
    }

    /// Threads taking part in a run, the caller included.
    pub fn thread_count(&self) -> usize {
        self.thread_count
    }

    /// Items claimed per batch.
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    /// Calls `work` exactly once for every item and returns when all
    /// batches are done.
    pub fn run<T, F>(&self, items: &mut [T], work: F) -> usize
    where
        T: Send,
        F: Fn(&mut T) + Sync,
    {
        let batches: Vec<Mutex<Option<&mut [T]>>> = items
            .chunks_mut(self.batch_size)
            .map(|batch| Mutex::new(Some(batch)))
            .collect();
        let cursor = AtomicUsize::new(0);

        let claim_batches = || {
            loop {
                let next = cursor.fetch_add(1, Ordering::Relaxed);
                let Some(slot) = batches.get(next) else {
                    break;
                };
                let batch = slot.lock().unwrap_or_else(|e| e.into_inner()).take();
                if let Some(batch) = batch {
                    batch.iter_mut().for_each(&work);
                }
            }
        };

        match &self.pool {
            Some(pool) => pool.in_place_scope(|scope| {
                for _ in 0..pool.current_num_threads() {
                    scope.spawn(|_| claim_batches());
                }
                claim_batches();
            }),
            None => claim_batches(),
        }
        batches.len()
    }
}
