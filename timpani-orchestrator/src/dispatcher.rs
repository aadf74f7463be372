use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

use timpani_codec::encode_sched_info;
use timpani_types::Plan;

use crate::fault_sink::{notify_fault_best_effort, FaultKind, FaultSink};

/// Holds the latest [`Plan`], the per-node `SchedInfo` payload cache, and
/// the `Sync` barrier map (spec §4.4).
///
/// Locking follows spec §5: the plan itself is a reader-writer lock
/// (`AddSchedInfo` writes, `SchedInfo`/`DMiss`/`Sync` read); the cache is a
/// plain mutex since it is replaced wholesale on every plan change; the
/// barrier map is its own mutex, mutated only from request handling.
pub struct Dispatcher {
    plan: RwLock<Plan>,
    sched_info_cache: Mutex<HashMap<String, Vec<u8>>>,
    barrier: Mutex<Option<HashMap<String, bool>>>,
    fault_sink: Arc<dyn FaultSink>,
}

impl Dispatcher {
    pub fn new(fault_sink: Arc<dyn FaultSink>) -> Self {
        Dispatcher {
            plan: RwLock::new(Plan::new()),
            sched_info_cache: Mutex::new(HashMap::new()),
            barrier: Mutex::new(None),
            fault_sink,
        }
    }

    /// Installs a freshly-computed plan, dropping the cached `SchedInfo`
    /// payloads (spec §4.4: "When a new plan is installed, the cached
    /// buffer is dropped"). The barrier map is untouched — it is keyed by
    /// node id, not by plan generation, and spec §4.4 never resets it.
    pub async fn install_plan(&self, plan: Plan) {
        *self.plan.write().await = plan;
        self.sched_info_cache.lock().await.clear();
        info!("installed new plan, cleared SchedInfo cache");
    }

    /// Acknowledges a node joining. Purely informational (spec §4.2).
    pub async fn register(&self, node_id: &str) {
        debug!(node_id, "node registered");
    }

    /// Returns the cached (or freshly serialized) `SchedInfo` payload for
    /// `node_id`'s slice of the plan's first workload. Empty when no plan
    /// is installed yet (spec §4.4, §8 boundary behavior).
    pub async fn sched_info(&self, node_id: &str) -> Vec<u8> {
        let mut cache = self.sched_info_cache.lock().await;
        if let Some(cached) = cache.get(node_id) {
            return cached.clone();
        }

        let plan = self.plan.read().await;
        let Some(workload) = plan.first_workload() else {
            return Vec::new();
        };

        let tasks: Vec<_> = workload.tasks_for_node(node_id).cloned().collect();
        let payload = encode_sched_info(&workload.workload_id, workload.hyperperiod_us, &tasks);
        cache.insert(node_id.to_string(), payload.clone());
        payload
    }

    /// Reports one deadline miss, forwarding it to the fault sink
    /// (spec §4.4).
    pub async fn dmiss(&self, node_id: &str, task_name: &str) {
        let plan = self.plan.read().await;
        let workload_id = plan
            .find_workload_for_task(node_id, task_name)
            .or_else(|| plan.first_workload())
            .map(|w| w.workload_id.clone());
        drop(plan);

        let Some(workload_id) = workload_id else {
            return;
        };
        notify_fault_best_effort(self.fault_sink.as_ref(), &workload_id, node_id, task_name, FaultKind::DeadlineMiss).await;
    }

    /// Polls the cross-node start-instant barrier (spec §4.4). Returns
    /// `(ack, sec, nsec)`.
    pub async fn sync(&self, node_id: &str) -> (i32, i64, i32) {
        let mut barrier = self.barrier.lock().await;

        if barrier.is_none() {
            let plan = self.plan.read().await;
            let nodes: HashMap<String, bool> = plan
                .first_workload()
                .map(|w| w.tasks.iter().map(|t| (t.assigned_node_id.clone(), false)).collect())
                .unwrap_or_default();
            *barrier = Some(nodes);
        }

        let map = barrier.as_mut().expect("just initialized above");
        let Some(ready) = map.get_mut(node_id) else {
            return (0, 0, 0);
        };
        *ready = true;

        if map.values().all(|&r| r) {
            let now = SystemTime::now() + Duration::from_secs(1);
            let since_epoch = now.duration_since(UNIX_EPOCH).unwrap_or_default();
            (1, since_epoch.as_secs() as i64, since_epoch.subsec_nanos() as i32)
        } else {
            (0, 0, 0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fault_sink::test_support::RecordingFaultSink;
    use timpani_types::{SchedPolicy, TaskRecord, Workload};

    fn task(name: &str, node: &str) -> TaskRecord {
        TaskRecord {
            name: name.to_string(),
            priority: 50,
            policy: SchedPolicy::Fifo,
            period_us: 100_000,
            release_offset_us: 0,
            runtime_us: 10_000,
            deadline_us: 100_000,
            cpu_affinity: 1,
            max_allowed_deadline_misses: 0,
            assigned_node_id: node.to_string(),
        }
    }

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(Arc::new(RecordingFaultSink::default()))
    }

    fn dispatcher_with_sink() -> (Dispatcher, Arc<RecordingFaultSink>) {
        let sink = Arc::new(RecordingFaultSink::default());
        (Dispatcher::new(sink.clone()), sink)
    }

    #[tokio::test]
    async fn sched_info_before_any_plan_is_empty() {
        let d = dispatcher();
        assert!(d.sched_info("n1").await.is_empty());
    }

    #[tokio::test]
    async fn sched_info_is_cached_byte_identical_across_calls() {
        let d = dispatcher();
        let mut plan = Plan::new();
        plan.insert_workload(Workload::new("w1", vec![task("a", "n1")], 100_000));
        d.install_plan(plan).await;

        let first = d.sched_info("n1").await;
        let second = d.sched_info("n1").await;
        assert_eq!(first, second);
        assert!(!first.is_empty());
    }

    #[tokio::test]
    async fn installing_a_new_plan_drops_the_cache() {
        let d = dispatcher();
        let mut plan = Plan::new();
        plan.insert_workload(Workload::new("w1", vec![task("a", "n1")], 100_000));
        d.install_plan(plan).await;
        let first = d.sched_info("n1").await;

        let mut plan2 = Plan::new();
        plan2.insert_workload(Workload::new("w1", vec![task("a", "n1"), task("b", "n1")], 200_000));
        d.install_plan(plan2).await;
        let second = d.sched_info("n1").await;

        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn sync_unlocks_only_once_every_node_has_called() {
        let d = dispatcher();
        let mut plan = Plan::new();
        plan.insert_workload(Workload::new("w1", vec![task("a", "n1"), task("b", "n2"), task("c", "n3")], 100_000));
        d.install_plan(plan).await;

        assert_eq!(d.sync("n1").await.0, 0);
        assert_eq!(d.sync("n2").await.0, 0);
        let (ack, sec, _nsec) = d.sync("n3").await;
        assert_eq!(ack, 1);
        assert!(sec > 0);
    }

    #[tokio::test]
    async fn sync_from_unknown_node_does_not_mutate_the_barrier() {
        let d = dispatcher();
        let mut plan = Plan::new();
        plan.insert_workload(Workload::new("w1", vec![task("a", "n1")], 100_000));
        d.install_plan(plan).await;

        assert_eq!(d.sync("ghost").await, (0, 0, 0));
        // n1 is still the only real node and has not been marked ready by
        // the unknown call, so it still needs its own Sync to unlock.
        assert_eq!(d.sync("n1").await.0, 1);
    }

    #[tokio::test]
    async fn sync_stays_open_and_gives_fresh_timestamps() {
        let d = dispatcher();
        let mut plan = Plan::new();
        plan.insert_workload(Workload::new("w1", vec![task("a", "n1")], 100_000));
        d.install_plan(plan).await;

        let (ack1, sec1, _) = d.sync("n1").await;
        assert_eq!(ack1, 1);
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let (ack2, sec2, _) = d.sync("n1").await;
        assert_eq!(ack2, 1);
        assert!(sec2 >= sec1);
    }

    #[tokio::test]
    async fn dmiss_falls_back_to_first_workload_on_miss() {
        let (d, sink) = dispatcher_with_sink();
        let mut plan = Plan::new();
        plan.insert_workload(Workload::new("w1", vec![task("a", "n1")], 100_000));
        d.install_plan(plan).await;

        d.dmiss("n1", "unknown-task").await;

        let calls = sink.calls.lock().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].workload_id, "w1");
        assert_eq!(calls[0].task_name, "unknown-task");
    }
}
