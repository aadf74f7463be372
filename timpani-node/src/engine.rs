//! Time-trigger engine (spec §4.6, component C6): start-instant negotiation,
//! per-task timer arming, and the timer handler's deadline classification.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use tokio::time::{Duration, Instant};
use tracing::{debug, warn};

use timpani_config::ClockId;
use timpani_rpc::RpcClient;

use crate::clock::real_now_ns;
use crate::hyperperiod::HyperperiodSupervisor;
use crate::task_runtime::TaskRuntime;

/// Interval the engine polls `Sync` at while waiting for the cross-node
/// start instant (spec §4.6).
const SYNC_POLL_INTERVAL: StdDuration = StdDuration::from_millis(100);

/// Fallback lead time when cross-node sync is disabled (spec §4.6: "now +
/// 5 ms on the configured clock").
const STANDALONE_START_LEAD: StdDuration = StdDuration::from_millis(5);

/// How this task's real-time signal is classified on a given fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineOutcome {
    OnTime,
    /// The task has not yet re-entered sigwait since the previous fire.
    StillRunning,
    /// The observed event happened after this fire, with the given lateness.
    LateReturn { lateness_ns: i64 },
    /// No progress observed between this fire and the previous one.
    StuckInKernel,
}

impl DeadlineOutcome {
    pub fn is_miss(self) -> bool {
        !matches!(self, DeadlineOutcome::OnTime)
    }
}

/// Negotiates the common start instant (spec §4.6). With sync enabled, polls
/// `Sync` every 100 ms until `ack=1` and uses the returned timestamp;
/// otherwise uses `now + 5 ms` on `clock`.
pub async fn negotiate_start_instant(
    rpc_addr: &str,
    node_id: &str,
    enable_sync: bool,
    clock: ClockId,
) -> timpani_rpc::RpcResult<i64> {
    if !enable_sync {
        let lead_ns = STANDALONE_START_LEAD.as_nanos() as i64;
        return Ok(crate::clock::now_ns(clock) + lead_ns);
    }

    loop {
        let mut client = RpcClient::connect_with_retry(rpc_addr).await?;
        let (ack, sec, nsec) = client.sync(node_id).await?;
        if ack == 1 {
            return Ok(sec * 1_000_000_000 + nsec as i64);
        }
        tokio::time::sleep(SYNC_POLL_INTERVAL).await;
    }
}

/// Converts a real-time (wall-clock) instant into a `tokio::time::Instant`
/// anchored to "now", clamping to "now" if the target has already passed.
pub fn real_ns_to_tokio_instant(target_real_ns: i64) -> Instant {
    let delta_ns = target_real_ns - real_now_ns();
    if delta_ns <= 0 {
        Instant::now()
    } else {
        Instant::now() + Duration::from_nanos(delta_ns as u64)
    }
}

/// Reports one `DMiss` over a fresh connection, logging (not propagating) a
/// failure — spec §4.6: "log failures but do not block the fire".
async fn report_deadline_miss(rpc_addr: &str, node_id: &str, task_name: &str) {
    match RpcClient::connect(rpc_addr).await {
        Ok(mut client) => {
            if let Err(e) = client.dmiss(node_id, task_name).await {
                warn!(node_id, task_name, error = %e, "DMiss report failed");
            }
        }
        Err(e) => warn!(node_id, task_name, error = %e, "could not connect to report DMiss"),
    }
}

/// Classifies the current fire against the task's last-observed sigwait
/// event (spec §4.6 step 3). Returns `OnTime` if no event has ever been
/// observed (nothing to compare against yet).
pub fn classify(task: &TaskRuntime, fire_real_ns: i64) -> DeadlineOutcome {
    if !task.has_event() {
        return DeadlineOutcome::OnTime;
    }

    let t_event = task.last_event_real_ns();
    let t_event_prev = task.prev_event_real_ns();

    if !task.is_entering() {
        DeadlineOutcome::StillRunning
    } else if t_event > fire_real_ns {
        DeadlineOutcome::LateReturn { lateness_ns: t_event - fire_real_ns }
    } else if t_event == t_event_prev {
        DeadlineOutcome::StuckInKernel
    } else {
        DeadlineOutcome::OnTime
    }
}

/// The agreed real-time signal used to wake tasks (`SIGRTMIN`, offset `0`).
fn agreed_signal() -> i32 {
    unsafe { libc::SIGRTMIN() }
}

fn outcome_label(outcome: DeadlineOutcome) -> &'static str {
    match outcome {
        DeadlineOutcome::OnTime => "on_time",
        DeadlineOutcome::StillRunning => "still_running",
        DeadlineOutcome::LateReturn { .. } => "late_return",
        DeadlineOutcome::StuckInKernel => "stuck_in_kernel",
    }
}

/// Runs one task's armed timer loop until `shutdown` fires (spec §4.6).
/// Each fire runs the full timer-handler sequence: record `t_fire`, sleep
/// the release offset, classify the deadline, report a miss if any, signal
/// the process, and record `prev_fire`.
pub async fn run_task_timer(
    task: Arc<TaskRuntime>,
    start: Instant,
    node_id: String,
    rpc_addr: String,
    supervisor: Arc<HyperperiodSupervisor>,
    plot: Option<Arc<tokio::sync::Mutex<crate::plot::PlotWriter>>>,
    mut shutdown: tokio::sync::watch::Receiver<bool>,
) {
    let period = Duration::from_micros(task.record.period_us as u64);
    let mut interval = tokio::time::interval_at(start, period);
    let release_offset = Duration::from_micros(task.record.release_offset_us as u64);

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    debug!(task = %task.record.name, "timer loop exiting on shutdown");
                    return;
                }
            }
            _ = interval.tick() => {
                let t_fire = real_now_ns();

                if !release_offset.is_zero() {
                    tokio::time::sleep(release_offset).await;
                }

                let outcome = classify(&task, t_fire);
                if outcome.is_miss() {
                    debug!(task = %task.record.name, ?outcome, "deadline miss");
                    supervisor.record_deadline_miss();
                    report_deadline_miss(&rpc_addr, &node_id, &task.record.name).await;
                }

                if let Some(writer) = &plot {
                    let lateness_ns = match outcome {
                        DeadlineOutcome::LateReturn { lateness_ns } => lateness_ns,
                        _ => 0,
                    };
                    if let Err(e) = writer.lock().await.write_row(t_fire, &task.record.name, lateness_ns, outcome_label(outcome)) {
                        warn!(task = %task.record.name, error = %e, "failed to write plot row");
                    }
                }

                if let Some(handle) = &task.handle {
                    if let Err(e) = handle.send_signal(agreed_signal()) {
                        warn!(task = %task.record.name, error = %e, "failed to signal task");
                    }
                }
                task.set_prev_fire(t_fire);
            }
        }
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
    fn no_event_yet_is_on_time() {
        let task = TaskRuntime::new(record(), None);
        assert_eq!(classify(&task, 1_000), DeadlineOutcome::OnTime);
    }

    #[test]
    fn still_running_when_not_re_entered() {
        let task = TaskRuntime::new(record(), None);
        task.record_event(500, false);
        assert_eq!(classify(&task, 1_000), DeadlineOutcome::StillRunning);
    }

    #[test]
    fn late_return_when_event_after_fire() {
        let task = TaskRuntime::new(record(), None);
        task.record_event(500, true);
        task.record_event(2_000, true);
        assert_eq!(classify(&task, 1_000), DeadlineOutcome::LateReturn { lateness_ns: 1_000 });
    }

    #[test]
    fn stuck_in_kernel_when_no_progress() {
        let task = TaskRuntime::new(record(), None);
        task.record_event(500, true);
        task.record_event(500, true);
        assert_eq!(classify(&task, 1_000), DeadlineOutcome::StuckInKernel);
    }

    #[test]
    fn on_time_when_event_before_fire_and_progressed() {
        let task = TaskRuntime::new(record(), None);
        task.record_event(100, true);
        task.record_event(500, true);
        assert_eq!(classify(&task, 1_000), DeadlineOutcome::OnTime);
    }

    #[tokio::test]
    async fn standalone_start_instant_is_a_few_ms_ahead() {
        let before = real_now_ns();
        let target = negotiate_start_instant("127.0.0.1:0", "n1", false, ClockId::Wall).await.unwrap();
        assert!(target - before >= 4_000_000);
    }
}
