//! Metrics collection and structured logging.
//!
//! Worker threads write into [`TickCounters`] during the CPU phase; every
//! aggregate carries its own lock or atomic so no single lock serializes the
//! phase. After the tick the world folds the counters into a
//! [`SeriesRecorder`], which hands out [`Checkpoint`]s on request.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use symbiolab_data::{Checkpoint, OrgKind};
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

/// Running count/total/min/max of a stream of values.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Monitor {
    pub count: u64,
    pub total: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Monitor {
    pub fn add(&mut self, value: f64) {
        self.count += 1;
        self.total += value;
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.total / self.count as f64
        }
    }
}

/// A [`Monitor`] behind its own mutex.
#[derive(Debug, Default)]
pub struct SyncMonitor {
    inner: Mutex<Monitor>,
}

impl SyncMonitor {
    pub fn record(&self, value: f64) {
        self.inner
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .add(value);
    }

    pub fn snapshot(&self) -> Monitor {
        *self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns the current values and starts over.
    pub fn take(&self) -> Monitor {
        std::mem::take(&mut *self.inner.lock().unwrap_or_else(|e| e.into_inner()))
    }
}

/// Counters written from worker threads during one tick.
#[derive(Debug)]
pub struct TickCounters {
    host_tasks: Vec<AtomicU64>,
    symbiont_tasks: Vec<AtomicU64>,
    pub donated: SyncMonitor,
    pub stolen: SyncMonitor,
    pub symbiont_earned: SyncMonitor,
    pub vertical_attempts: AtomicU64,
    pub vertical_successes: AtomicU64,
    pub horizontal_attempts: AtomicU64,
    pub horizontal_successes: AtomicU64,
    pub births: AtomicU64,
    pub deaths: AtomicU64,
}

impl TickCounters {
    pub fn new(num_tasks: usize) -> Self {
        Self {
            host_tasks: (0..num_tasks).map(|_| AtomicU64::new(0)).collect(),
            symbiont_tasks: (0..num_tasks).map(|_| AtomicU64::new(0)).collect(),
            donated: SyncMonitor::default(),
            stolen: SyncMonitor::default(),
            symbiont_earned: SyncMonitor::default(),
            vertical_attempts: AtomicU64::new(0),
            vertical_successes: AtomicU64::new(0),
            horizontal_attempts: AtomicU64::new(0),
            horizontal_successes: AtomicU64::new(0),
            births: AtomicU64::new(0),
            deaths: AtomicU64::new(0),
        }
    }

    pub fn num_tasks(&self) -> usize {
        self.host_tasks.len()
    }

    pub fn record_task(&self, kind: OrgKind, task: usize) {
        let counters = match kind {
            OrgKind::Host => &self.host_tasks,
            OrgKind::Symbiont => &self.symbiont_tasks,
        };
        counters[task].fetch_add(1, Ordering::Relaxed);
    }

    pub fn task_successes(&self, kind: OrgKind, task: usize) -> u64 {
        match kind {
            OrgKind::Host => self.host_tasks[task].load(Ordering::Relaxed),
            OrgKind::Symbiont => self.symbiont_tasks[task].load(Ordering::Relaxed),
        }
    }

    pub fn reset(&self) {
        for counter in self.host_tasks.iter().chain(&self.symbiont_tasks) {
            counter.store(0, Ordering::Relaxed);
        }
        self.donated.take();
        self.stolen.take();
        self.symbiont_earned.take();
        for counter in [
            &self.vertical_attempts,
            &self.vertical_successes,
            &self.horizontal_attempts,
            &self.horizontal_successes,
            &self.births,
            &self.deaths,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

/// Append-only named series, drained by [`SeriesRecorder::checkpoint`].
#[derive(Debug, Default)]
pub struct SeriesRecorder {
    series: BTreeMap<String, Vec<f64>>,
    first_tick: Option<u64>,
    last_tick: u64,
}

impl SeriesRecorder {
    pub fn append(&mut self, tick: u64, name: &str, value: f64) {
        self.first_tick.get_or_insert(tick);
        self.last_tick = tick;
        match self.series.get_mut(name) {
            Some(values) => values.push(value),
            None => {
                self.series.insert(name.to_string(), vec![value]);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&[f64]> {
        self.series.get(name).map(Vec::as_slice)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.series.keys().map(String::as_str)
    }

    /// Hands out everything recorded since the previous checkpoint.
    pub fn checkpoint(&mut self) -> Checkpoint {
        let from_tick = self.first_tick.take().unwrap_or(self.last_tick);
        Checkpoint {
            from_tick,
            to_tick: self.last_tick,
            series: std::mem::take(&mut self.series),
        }
    }
}

/// Run-level metrics: ticks, population and named event counters.
pub struct Metrics {
    tick_count: AtomicU64,
    host_count: AtomicU64,
    symbiont_count: AtomicU64,
    pub counters: Mutex<HashMap<String, AtomicU64>>,
    log_interval: u64,
    start_time: Instant,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new(1000)
    }
}

impl Metrics {
    #[must_use]
    pub fn new(log_interval: u64) -> Self {
        Self {
            tick_count: AtomicU64::new(0),
            host_count: AtomicU64::new(0),
            symbiont_count: AtomicU64::new(0),
            counters: Mutex::new(HashMap::new()),
            log_interval: log_interval.max(1),
            start_time: Instant::now(),
        }
    }

    /// Records a completed tick with its duration.
    pub fn record_tick(&self, duration: Duration, hosts: usize, symbionts: usize) {
        let tick = self.tick_count.fetch_add(1, Ordering::Relaxed) + 1;
        self.host_count.store(hosts as u64, Ordering::Relaxed);
        self.symbiont_count.store(symbionts as u64, Ordering::Relaxed);

        tracing::debug!(tick, hosts, symbionts, "tick complete");
        if tick % self.log_interval == 0 {
            tracing::info!(
                tick = tick,
                hosts = hosts,
                symbionts = symbionts,
                duration_us = duration.as_micros() as u64,
                "Simulation tick"
            );
        }
    }

    /// Increments a named counter.
    pub fn increment_counter(&self, name: &str) {
        self.add_to_counter(name, 1);
    }

    pub fn add_to_counter(&self, name: &str, amount: u64) {
        let mut counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        counters
            .entry(name.to_string())
            .or_insert_with(|| AtomicU64::new(0))
            .fetch_add(amount, Ordering::Relaxed);
    }

    #[must_use]
    pub fn counter(&self, name: &str) -> u64 {
        let counters = self.counters.lock().unwrap_or_else(|e| e.into_inner());
        counters
            .get(name)
            .map_or(0, |c| c.load(Ordering::Relaxed))
    }

    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.tick_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn host_count(&self) -> u64 {
        self.host_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn symbiont_count(&self) -> u64 {
        self.symbiont_count.load(Ordering::Relaxed)
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }
}

/// Installs a fmt subscriber honouring `RUST_LOG`, defaulting to `info`.
/// Log lines go to stderr; stdout carries the checkpoint stream.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing::subscriber::set_global_default(log_subscriber(filter, std::io::stderr)).ok();
}

fn log_subscriber<W>(filter: EnvFilter, writer: W) -> impl tracing::Subscriber + Send + Sync
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(writer)
        .finish()
}
