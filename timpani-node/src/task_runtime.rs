use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::Arc;

use timpani_types::TaskRecord;

use crate::process::ProcessHandle;

/// Per-task state the node maintains alongside its scheduled [`TaskRecord`]:
/// the resolved OS process and the two fields the observer writes and the
/// timer handler reads.
///
/// The two observer-written fields (spec §4.7/§9) are a plain `AtomicI64`
/// timestamp and `AtomicBool` polarity rather than anything lock-protected:
/// the write is a single aligned store, and the timer handler tolerates a
/// torn read because it only ever compares the new sample against the
/// *previous* sample it itself cached, never against a half-written value.
pub struct TaskRuntime {
    pub record: TaskRecord,
    pub handle: Option<Arc<ProcessHandle>>,
    /// Real-time instant (nanoseconds since the Unix epoch) of the last
    /// observed sigwait event for this task, or `0` before any event.
    last_event_real_ns: AtomicI64,
    /// Real-time instant of the *previous* sigwait event, used by the
    /// "stuck in kernel" check (spec §4.6).
    prev_event_real_ns: AtomicI64,
    /// `true` once the last observed event was kernel *entry* (blocking on
    /// the signal-wait call); `false` once it has exited again.
    entering: AtomicBool,
    /// `t_fire` of this task's previous timer fire, for diagnostics.
    prev_fire_real_ns: AtomicI64,
}

impl TaskRuntime {
    pub fn new(record: TaskRecord, handle: Option<Arc<ProcessHandle>>) -> Self {
        TaskRuntime {
            record,
            handle,
            last_event_real_ns: AtomicI64::new(0),
            prev_event_real_ns: AtomicI64::new(0),
            entering: AtomicBool::new(false),
            prev_fire_real_ns: AtomicI64::new(0),
        }
    }

    /// Called by the observer on each consumed sigwait record.
    pub fn record_event(&self, real_ns: i64, entering: bool) {
        let previous = self.last_event_real_ns.swap(real_ns, Ordering::Relaxed);
        self.prev_event_real_ns.store(previous, Ordering::Relaxed);
        self.entering.store(entering, Ordering::Relaxed);
    }

    /// Whether an event has ever been observed for this task.
    pub fn has_event(&self) -> bool {
        self.last_event_real_ns.load(Ordering::Relaxed) != 0
    }

    pub fn last_event_real_ns(&self) -> i64 {
        self.last_event_real_ns.load(Ordering::Relaxed)
    }

    pub fn prev_event_real_ns(&self) -> i64 {
        self.prev_event_real_ns.load(Ordering::Relaxed)
    }

    pub fn is_entering(&self) -> bool {
        self.entering.load(Ordering::Relaxed)
    }

    pub fn set_prev_fire(&self, real_ns: i64) {
        self.prev_fire_real_ns.store(real_ns, Ordering::Relaxed);
    }

    pub fn prev_fire_real_ns(&self) -> i64 {
        self.prev_fire_real_ns.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use timpani_types::{SchedPolicy, TaskRecord};

    fn record() -> TaskRecord {
        TaskRecord {
            name: "a".to_string(),
            priority: 50,
            policy: SchedPolicy::Fifo,
            period_us: 100_000,
            release_offset_us: 0,
            runtime_us: 10_000,
            deadline_us: 100_000,
            cpu_affinity: 1,
            max_allowed_deadline_misses: 0,
            assigned_node_id: "n1".to_string(),
        }
    }

    #[test]
    fn no_event_observed_initially() {
        let rt = TaskRuntime::new(record(), None);
        assert!(!rt.has_event());
    }

    #[test]
    fn record_event_shifts_previous_into_prev_slot() {
        let rt = TaskRuntime::new(record(), None);
        rt.record_event(100, true);
        rt.record_event(200, false);
        assert_eq!(rt.last_event_real_ns(), 200);
        assert_eq!(rt.prev_event_real_ns(), 100);
        assert!(!rt.is_entering());
        assert!(rt.has_event());
    }
}
