use std::collections::HashMap;

use timpani_types::{CpuPreference, TaskRecord, TaskSpec};

use crate::inventory::NodeInventory;
use crate::outcome::ScheduleOutcome;

/// Per-CPU utilization cap for the primary algorithm (spec §4.3).
pub const CPU_UTILIZATION_CAP: f64 = 0.90;

const EPS: f64 = 1e-9;

/// The primary scheduling algorithm: each task goes to its explicit
/// `target_node`, packed onto that node's CPUs in descending index order
/// with a per-CPU utilization cap, falling back to a caller-named affinity
/// CPU first when one was requested (spec §4.3).
pub fn schedule(tasks: &[TaskSpec], inventory: &[NodeInventory]) -> ScheduleOutcome {
    let nodes: HashMap<&str, &NodeInventory> =
        inventory.iter().map(|n| (n.node_id.as_str(), n)).collect();

    // (node_id, cpu) -> summed utilization of tasks placed there so far.
    let mut cpu_utilization: HashMap<(String, u32), f64> = HashMap::new();
    let mut outcome = ScheduleOutcome::default();

    for task in tasks {
        let Some(node) = nodes.get(task.target_node.as_str()) else {
            outcome.unscheduled.push(task.name.clone());
            continue;
        };
        if node.cpu_ids.is_empty() {
            outcome.unscheduled.push(task.name.clone());
            continue;
        }

        let task_util = task.utilization();
        let fits = |util: &HashMap<(String, u32), f64>, cpu: u32| -> bool {
            let current = util.get(&(node.node_id.clone(), cpu)).copied().unwrap_or(0.0);
            current + task_util <= CPU_UTILIZATION_CAP + EPS
        };

        let mut chosen_cpu = None;
        if let CpuPreference::Specific(cpu) = task.cpu_preference {
            if node.cpu_ids.contains(&cpu) && fits(&cpu_utilization, cpu) {
                chosen_cpu = Some(cpu);
            }
        }
        if chosen_cpu.is_none() {
            chosen_cpu = node.cpu_ids.iter().rev().copied().find(|&cpu| fits(&cpu_utilization, cpu));
        }

        match chosen_cpu {
            Some(cpu) => {
                *cpu_utilization.entry((node.node_id.clone(), cpu)).or_insert(0.0) += task_util;
                outcome.scheduled.push(TaskRecord::from_spec(task, &node.node_id, cpu));
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

    fn spec(name: &str, node: &str, runtime_us: u64, period_us: u64, cpu: CpuPreference) -> TaskSpec {
        TaskSpec {
            name: name.to_string(),
            target_node: node.to_string(),
            period_us,
            runtime_us,
            deadline_us: period_us,
            release_offset_us: 0,
            priority: 50,
            policy: SchedPolicy::Fifo,
            cpu_preference: cpu,
            max_allowed_deadline_misses: 0,
            memory_mb: 0,
        }
    }

    #[test]
    fn unknown_target_node_is_unscheduled() {
        let tasks = vec![spec("a", "ghost", 10_000, 100_000, CpuPreference::Any)];
        let inventory = vec![NodeInventory::new("n1", vec![0, 1], 0)];
        let outcome = schedule(&tasks, &inventory);
        assert!(outcome.scheduled.is_empty());
        assert_eq!(outcome.unscheduled, vec!["a".to_string()]);
    }

    #[test]
    fn packs_onto_highest_index_cpu_first() {
        let tasks = vec![spec("a", "n1", 10_000, 100_000, CpuPreference::Any)];
        let inventory = vec![NodeInventory::new("n1", vec![0, 1, 2], 0)];
        let outcome = schedule(&tasks, &inventory);
        assert_eq!(outcome.scheduled[0].cpu_affinity, 1u64 << 2);
    }

    #[test]
    fn respects_explicit_cpu_preference_when_it_fits() {
        let tasks = vec![spec("a", "n1", 10_000, 100_000, CpuPreference::Specific(0))];
        let inventory = vec![NodeInventory::new("n1", vec![0, 1, 2], 0)];
        let outcome = schedule(&tasks, &inventory);
        assert_eq!(outcome.scheduled[0].cpu_affinity, 1u64);
    }

    #[test]
    fn rejects_once_cpu_cap_would_be_exceeded() {
        // 0.90 us per task; two tasks would sum to 1.80 > 0.90 on one CPU.
        let tasks = vec![
            spec("a", "n1", 900_000, 1_000_000, CpuPreference::Specific(0)),
            spec("b", "n1", 900_000, 1_000_000, CpuPreference::Specific(0)),
        ];
        let inventory = vec![NodeInventory::new("n1", vec![0], 0)];
        let outcome = schedule(&tasks, &inventory);
        assert_eq!(outcome.scheduled.len(), 1);
        assert_eq!(outcome.unscheduled, vec!["b".to_string()]);
    }

    #[test]
    fn tasks_may_share_a_cpu_under_the_cap() {
        let tasks = vec![
            spec("a", "n1", 100_000, 1_000_000, CpuPreference::Specific(0)),
            spec("b", "n1", 100_000, 1_000_000, CpuPreference::Specific(0)),
        ];
        let inventory = vec![NodeInventory::new("n1", vec![0], 0)];
        let outcome = schedule(&tasks, &inventory);
        assert_eq!(outcome.scheduled.len(), 2);
        assert!(outcome.unscheduled.is_empty());
    }
}
