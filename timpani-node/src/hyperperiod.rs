//! Hyperperiod supervisor (spec §4.8, component C8).
//!
//! One additional periodic timer, armed only when a hyperperiod is known,
//! that tracks completed cycles and per-cycle deadline misses and emits an
//! aggregate statistics record every `STATISTICS_LOG_INTERVAL` cycles —
//! confirmed against `original_source/src/hyperperiod.c`, which uses the
//! same N=100 interval and resets its cycle counter unconditionally on every
//! fire, independent of whether a miss occurred that cycle.

use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

use tokio::time::{Duration, Instant};
use tracing::info;

use timpani_config::ClockId;

/// Cycles between aggregate statistics log emissions
/// (`original_source/src/hyperperiod.c::STATISTICS_LOG_INTERVAL`).
pub const STATISTICS_LOG_INTERVAL: u64 = 100;

/// Tracks hyperperiod cycle completion and deadline-miss counts for one
/// workload. Shared (via `Arc`) between the timer handlers, which record
/// misses, and the supervisor's own periodic fire, which reports them.
pub struct HyperperiodSupervisor {
    start_instant_real_ns: i64,
    hyperperiod_us: u64,
    task_count: usize,
    clock: ClockId,
    completed_cycles: AtomicU64,
    cycle_deadline_misses: AtomicU64,
    total_deadline_misses: AtomicU64,
    last_real_ns: AtomicI64,
}

impl HyperperiodSupervisor {
    pub fn new(start_instant_real_ns: i64, hyperperiod_us: u64, task_count: usize, clock: ClockId) -> Self {
        HyperperiodSupervisor {
            start_instant_real_ns,
            hyperperiod_us,
            task_count,
            clock,
            completed_cycles: AtomicU64::new(0),
            cycle_deadline_misses: AtomicU64::new(0),
            total_deadline_misses: AtomicU64::new(0),
            last_real_ns: AtomicI64::new(start_instant_real_ns),
        }
    }

    /// Called by a timer handler on a deadline miss (spec §4.6 step 3).
    pub fn record_deadline_miss(&self) {
        self.cycle_deadline_misses.fetch_add(1, Ordering::Relaxed);
        self.total_deadline_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// "Position within hyperperiod" diagnostic helper (spec §4.8):
    /// `(now - start_instant) mod hyperperiod_us`, in microseconds.
    pub fn position_in_hyperperiod_us(&self, now_real_ns: i64) -> u64 {
        if self.hyperperiod_us == 0 {
            return 0;
        }
        let elapsed_us = ((now_real_ns - self.start_instant_real_ns) / 1_000).max(0) as u64;
        elapsed_us % self.hyperperiod_us
    }

    /// One hyperperiod fire: increments the cycle count, snapshots and
    /// unconditionally resets the per-cycle miss counter, and every
    /// [`STATISTICS_LOG_INTERVAL`] cycles emits the aggregate record.
    pub fn on_fire(&self, workload_id: &str, now_real_ns: i64) {
        self.last_real_ns.store(now_real_ns, Ordering::Relaxed);
        let cycles = self.completed_cycles.fetch_add(1, Ordering::Relaxed) + 1;
        let cycle_misses = self.cycle_deadline_misses.swap(0, Ordering::Relaxed);

        if cycles % STATISTICS_LOG_INTERVAL == 0 {
            let total_misses = self.total_deadline_misses.load(Ordering::Relaxed);
            let miss_rate = if self.task_count > 0 { cycle_misses as f64 / self.task_count as f64 } else { 0.0 };
            info!(
                workload_id,
                cycles,
                total_misses,
                cycle_misses,
                miss_rate,
                task_count = self.task_count,
                "hyperperiod aggregate statistics"
            );
        }
    }
}

/// Runs the supervisor's own periodic timer until `shutdown` fires. No-op
/// when `hyperperiod_us` is `0` (no hyperperiod could be computed).
pub async fn run(
    supervisor: std::sync::Arc<HyperperiodSupervisor>,
    workload_id: String,
    start: Instant,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) {
    if supervisor.hyperperiod_us == 0 {
        return;
    }

    let period = Duration::from_micros(supervisor.hyperperiod_us);
    let mut interval = tokio::time::interval_at(start, period);

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    return;
                }
            }
            _ = interval.tick() => {
                supervisor.on_fire(&workload_id, crate::clock::now_ns(supervisor.clock));
            }
        }
    }
}
