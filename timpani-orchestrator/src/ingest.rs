use timpani_config::NodeInventoryEntry;
use timpani_sched::{schedule, Algorithm, NodeInventory};
use timpani_types::{Plan, TaskSpec, Workload};

use crate::error::OrchResult;

/// Converts the orchestrator's on-disk node inventory (spec §6, ingested by
/// `timpani-config`) into the shape `timpani-sched` schedules against.
pub fn to_sched_inventory(entries: &[NodeInventoryEntry]) -> Vec<NodeInventory> {
    entries
        .iter()
        .map(|e| NodeInventory::new(e.node_id.clone(), e.cpu_ids.clone(), e.memory_mb))
        .collect()
}

/// Schedules `tasks` against `inventory` with `algorithm` and packages the
/// result as a single-workload [`Plan`].
///
/// Where the tasks themselves come from is the submitting collaborator's
/// concern, not this crate's (spec §1 lists task-definition ingress as
/// out of scope, contract-only) — callers hand this function an already
/// parsed `Vec<TaskSpec>`, whether that came from a test, an embedding
/// binary's own CLI subcommand, or a future gRPC front end.
pub fn build_plan(
    workload_id: &str,
    tasks: &[TaskSpec],
    inventory: &[NodeInventory],
    algorithm: Algorithm,
) -> OrchResult<Plan> {
    let outcome = schedule(tasks, inventory, algorithm)?;
    for name in &outcome.unscheduled {
        tracing::warn!(workload_id, task = %name, "task could not be scheduled; dropped from plan");
    }

    let hyperperiod_us = timpani_sched::compute_hyperperiod(&outcome.distinct_periods_us());
    let workload = Workload::new(workload_id, outcome.scheduled, hyperperiod_us);

    let mut plan = Plan::new();
    plan.insert_workload(workload);
    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use timpani_types::{CpuPreference, SchedPolicy};

    fn task(name: &str, node: &str) -> TaskSpec {
        TaskSpec {
            name: name.to_string(),
            target_node: node.to_string(),
            period_us: 100_000,
            runtime_us: 10_000,
            deadline_us: 100_000,
            release_offset_us: 0,
            priority: 50,
            policy: SchedPolicy::Fifo,
            cpu_preference: CpuPreference::Any,
            max_allowed_deadline_misses: 0,
            memory_mb: 0,
        }
    }

    #[test]
    fn to_sched_inventory_carries_cpu_ids_and_memory() {
        let entries = vec![NodeInventoryEntry { node_id: "n1".to_string(), cpu_ids: vec![0, 1], memory_mb: 2048 }];
        let inventory = to_sched_inventory(&entries);
        assert_eq!(inventory[0].node_id, "n1");
        assert_eq!(inventory[0].cpu_ids, vec![0, 1]);
        assert_eq!(inventory[0].memory_mb, 2048);
    }

    #[test]
    fn build_plan_packages_a_single_workload() {
        let inventory = vec![NodeInventory::new("n1", vec![0, 1, 2, 3], 0)];
        let plan = build_plan("w1", &[task("a", "n1"), task("b", "n1")], &inventory, Algorithm::TargetNodePriority).unwrap();

        let workload = plan.workload("w1").unwrap();
        assert_eq!(workload.task_count(), 2);
        assert_eq!(workload.hyperperiod_us, 100_000);
    }

    #[test]
    fn build_plan_drops_unschedulable_tasks_with_a_warning() {
        let inventory = vec![NodeInventory::new("n1", vec![0], 0)];
        let mut overloaded = task("a", "n1");
        overloaded.runtime_us = 95_000;
        let mut second = task("b", "n1");
        second.runtime_us = 95_000;

        let plan = build_plan("w1", &[overloaded, second], &inventory, Algorithm::TargetNodePriority).unwrap();
        let workload = plan.workload("w1").unwrap();
        assert_eq!(workload.task_count(), 1);
    }
}
