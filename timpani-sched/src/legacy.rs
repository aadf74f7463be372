use timpani_types::{CpuPreference, TaskRecord, TaskSpec};

use crate::inventory::NodeInventory;
use crate::outcome::ScheduleOutcome;

/// Legacy algorithms cap node utilization at 1.0, not the primary
/// algorithm's 0.90 per-CPU cap (spec §4.3).
const NODE_UTILIZATION_CAP: f64 = 1.0;

/// Per-node state shared by both legacy algorithms: the CPUs not yet handed
/// to a task (exclusive assignment, unlike the primary algorithm's
/// CPU-sharing) and the running utilization total used for node selection.
///
/// Kept as a `Vec` in inventory order (not a hash map) so that ties between
/// equally-loaded nodes resolve deterministically to the first one listed,
/// the same way the original's node iteration is stable.
struct Pool<'a> {
    inventory: &'a NodeInventory,
    free_cpus: Vec<u32>,
    utilization: f64,
}

fn build_pools(inventory: &[NodeInventory]) -> Vec<Pool<'_>> {
    inventory
        .iter()
        .map(|n| Pool { inventory: n, free_cpus: n.cpu_ids.clone(), utilization: 0.0 })
        .collect()
}

fn schedulable(pool: &Pool, task: &TaskSpec) -> bool {
    if pool.free_cpus.is_empty() {
        return false;
    }
    if pool.inventory.memory_mb != 0 && task.memory_mb > pool.inventory.memory_mb {
        return false;
    }
    if let CpuPreference::Specific(cpu) = task.cpu_preference {
        return pool.free_cpus.contains(&cpu);
    }
    true
}

/// Takes the task's preferred CPU if free and requested, otherwise the
/// lowest-indexed free CPU (`available_cpus_per_node_.front()` in the
/// original).
fn take_cpu(pool: &mut Pool, task: &TaskSpec) -> u32 {
    if let CpuPreference::Specific(cpu) = task.cpu_preference {
        if let Some(pos) = pool.free_cpus.iter().position(|&c| c == cpu) {
            return pool.free_cpus.remove(pos);
        }
    }
    pool.free_cpus.remove(0)
}

/// Picks, per task, the node (any node, ignoring `target_node`) with the
/// lowest current aggregate utilization among those with a free CPU
/// (spec §4.3; `original_source/src/global_scheduler.cpp::find_best_node_least_loaded`).
pub fn schedule_least_loaded(tasks: &[TaskSpec], inventory: &[NodeInventory]) -> ScheduleOutcome {
    let mut pools = build_pools(inventory);
    let mut outcome = ScheduleOutcome::default();

    for task in tasks {
        let best = pools
            .iter()
            .enumerate()
            .filter(|(_, p)| schedulable(p, task))
            .min_by(|(_, a), (_, b)| a.utilization.partial_cmp(&b.utilization).unwrap())
            .map(|(i, _)| i);

        match best {
            Some(idx) => {
                let pool = &mut pools[idx];
                let cpu = take_cpu(pool, task);
                pool.utilization += task.utilization();
                let node_id = pool.inventory.node_id.clone();
                outcome.scheduled.push(TaskRecord::from_spec(task, &node_id, cpu));
            }
            None => outcome.unscheduled.push(task.name.clone()),
        }
    }

    outcome
}

/// Sorts tasks by descending runtime, then for each tries its `target_node`
/// before falling back to whichever node's post-assignment utilization
/// would be highest while staying at or below 1.0 (spec §4.3;
/// `original_source/src/global_scheduler.cpp::schedule_with_best_fit_decreasing`).
pub fn schedule_best_fit_decreasing(tasks: &[TaskSpec], inventory: &[NodeInventory]) -> ScheduleOutcome {
    let mut sorted: Vec<&TaskSpec> = tasks.iter().collect();
    sorted.sort_by(|a, b| b.runtime_us.cmp(&a.runtime_us));

    let mut pools = build_pools(inventory);
    let mut outcome = ScheduleOutcome::default();

    for task in sorted {
        let target_idx = pools
            .iter()
            .position(|p| p.inventory.node_id == task.target_node)
            .filter(|&i| schedulable(&pools[i], task));

        let best = target_idx.or_else(|| {
            pools
                .iter()
                .enumerate()
                .filter(|(_, p)| schedulable(p, task))
                .filter(|(_, p)| p.utilization + task.utilization() <= NODE_UTILIZATION_CAP)
                .max_by(|(_, a), (_, b)| {
                    (a.utilization + task.utilization())
                        .partial_cmp(&(b.utilization + task.utilization()))
                        .unwrap()
                })
                .map(|(i, _)| i)
        });

        match best {
            Some(idx) => {
                let pool = &mut pools[idx];
                let cpu = take_cpu(pool, task);
                pool.utilization += task.utilization();
                let node_id = pool.inventory.node_id.clone();
                outcome.scheduled.push(TaskRecord::from_spec(task, &node_id, cpu));
            }
            None => outcome.unscheduled.push(task.name.clone()),
        }
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use timpani_types::{CpuPreference, SchedPolicy};

    fn spec(name: &str, node: &str, runtime_us: u64, period_us: u64) -> TaskSpec {
        TaskSpec {
            name: name.to_string(),
            target_node: node.to_string(),
            period_us,
            runtime_us,
            deadline_us: period_us,
            release_offset_us: 0,
            priority: 50,
            policy: SchedPolicy::Fifo,
            cpu_preference: CpuPreference::Any,
            max_allowed_deadline_misses: 0,
            memory_mb: 0,
        }
    }

    #[test]
    fn least_loaded_ignores_target_node() {
        let tasks = vec![spec("a", "nope", 10_000, 100_000)];
        let inventory = vec![NodeInventory::new("n1", vec![0], 0), NodeInventory::new("n2", vec![0], 0)];
        let outcome = schedule_least_loaded(&tasks, &inventory);
        assert_eq!(outcome.scheduled.len(), 1);
    }

    #[test]
    fn least_loaded_picks_the_emptier_node() {
        let tasks = vec![spec("a", "n1", 500_000, 1_000_000), spec("b", "n1", 100_000, 1_000_000)];
        let inventory = vec![NodeInventory::new("n1", vec![0], 0), NodeInventory::new("n2", vec![0], 0)];
        let outcome = schedule_least_loaded(&tasks, &inventory);
        assert_eq!(outcome.scheduled[0].assigned_node_id, "n1");
        assert_eq!(outcome.scheduled[1].assigned_node_id, "n2");
    }

    #[test]
    fn memory_ceiling_excludes_a_node() {
        let mut t = spec("a", "n1", 10_000, 100_000);
        t.memory_mb = 2048;
        let inventory = vec![NodeInventory::new("n1", vec![0], 1024)];
        let outcome = schedule_least_loaded(&[t], &inventory);
        assert!(outcome.scheduled.is_empty());
    }

    #[test]
    fn best_fit_decreasing_sorts_by_runtime_then_prefers_target_node() {
        let tasks = vec![spec("small", "n2", 10_000, 1_000_000), spec("big", "n1", 900_000, 1_000_000)];
        let inventory = vec![NodeInventory::new("n1", vec![0], 0), NodeInventory::new("n2", vec![0], 0)];
        let outcome = schedule_best_fit_decreasing(&tasks, &inventory);
        // "big" is processed first (descending runtime) and lands on its target node.
        assert_eq!(outcome.scheduled[0].name, "big");
        assert_eq!(outcome.scheduled[0].assigned_node_id, "n1");
    }

    #[test]
    fn best_fit_decreasing_never_exceeds_full_utilization() {
        // Each task alone fits a node (0.7), but two on one node would sum to
        // 1.4 > 1.0, so both must land on distinct nodes.
        let tasks = vec![
            spec("a", "nope", 700_000, 1_000_000),
            spec("b", "nope", 700_000, 1_000_000),
        ];
        let inventory = vec![NodeInventory::new("n1", vec![0], 0), NodeInventory::new("n2", vec![0], 0)];
        let outcome = schedule_best_fit_decreasing(&tasks, &inventory);
        assert_eq!(outcome.scheduled.len(), 2);
        let nodes: std::collections::HashSet<_> =
            outcome.scheduled.iter().map(|t| t.assigned_node_id.as_str()).collect();
        assert_eq!(nodes, ["n1", "n2"].into_iter().collect());
    }
}
