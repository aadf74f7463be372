use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::task::TaskRecord;

/// A named set of periodic tasks scheduled together, as held on the
/// orchestrator once `timpani-sched` has produced an assignment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workload {
    pub workload_id: String,
    pub tasks: Vec<TaskRecord>,
    pub hyperperiod_us: u64,
}

impl Workload {
    pub fn new(workload_id: impl Into<String>, tasks: Vec<TaskRecord>, hyperperiod_us: u64) -> Self {
        Workload {
            workload_id: workload_id.into(),
            tasks,
            hyperperiod_us,
        }
    }

    pub fn task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Tasks assigned to `node_id`, in their original scheduling order.
    pub fn tasks_for_node<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a TaskRecord> {
        self.tasks.iter().filter(move |t| t.assigned_node_id == node_id)
    }
}

/// The orchestrator's full scheduling output: workload id -> node id ->
/// that node's slice of scheduled tasks.
///
/// Exclusively owned by the dispatcher (spec §3); serialized byte buffers
/// derived from it are cached elsewhere (`timpani-orchestrator::dispatcher`)
/// and are not part of this type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Plan {
    workloads: HashMap<String, Workload>,
    /// Insertion order of `workloads`' keys: a `HashMap` has none of its
    /// own, but `first_workload` needs "the workload installed first", so
    /// that order is tracked here explicitly rather than left to iteration.
    insertion_order: Vec<String>,
}

impl Plan {
    pub fn new() -> Self {
        Plan::default()
    }

    pub fn insert_workload(&mut self, workload: Workload) {
        if !self.workloads.contains_key(&workload.workload_id) {
            self.insertion_order.push(workload.workload_id.clone());
        }
        self.workloads.insert(workload.workload_id.clone(), workload);
    }

    pub fn workload(&self, workload_id: &str) -> Option<&Workload> {
        self.workloads.get(workload_id)
    }

    pub fn workloads(&self) -> impl Iterator<Item = &Workload> {
        self.workloads.values()
    }

    pub fn is_empty(&self) -> bool {
        self.workloads.is_empty()
    }

    /// The workload that was installed first is used as the fallback when a
    /// `(node, task)` pair can't be matched to any workload (spec §4.4's
    /// `DMiss` handler), by insertion order tracked in `insertion_order`
    /// rather than `HashMap` iteration order.
    pub fn first_workload(&self) -> Option<&Workload> {
        self.insertion_order.first().and_then(|id| self.workloads.get(id))
    }

    /// Locates the workload owning `(node_id, task_name)` by linear search,
    /// matching spec §4.4's `DMiss` handler.
    pub fn find_workload_for_task(&self, node_id: &str, task_name: &str) -> Option<&Workload> {
        self.workloads.values().find(|w| {
            w.tasks
                .iter()
                .any(|t| t.assigned_node_id == node_id && t.name == task_name)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{SchedPolicy, TaskRecord};

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

    #[test]
    fn tasks_for_node_filters_by_assignment() {
        let w = Workload::new(
            "w1",
            vec![task("a", "n1"), task("b", "n2"), task("c", "n1")],
            100_000,
        );
        let names: Vec<_> = w.tasks_for_node("n1").map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn find_workload_for_task_falls_back_absent_on_miss() {
        let mut plan = Plan::new();
        plan.insert_workload(Workload::new("w1", vec![task("a", "n1")], 100_000));
        assert!(plan.find_workload_for_task("n1", "a").is_some());
        assert!(plan.find_workload_for_task("n1", "missing").is_none());
    }

    #[test]
    fn empty_plan_reports_empty() {
        assert!(Plan::new().is_empty());
    }

    #[test]
    fn first_workload_is_the_one_installed_first() {
        let mut plan = Plan::new();
        plan.insert_workload(Workload::new("w2", vec![task("a", "n1")], 100_000));
        plan.insert_workload(Workload::new("w1", vec![task("b", "n1")], 100_000));
        assert_eq!(plan.first_workload().unwrap().workload_id, "w2");
    }

    #[test]
    fn reinserting_the_same_workload_id_keeps_its_original_position() {
        let mut plan = Plan::new();
        plan.insert_workload(Workload::new("w1", vec![task("a", "n1")], 100_000));
        plan.insert_workload(Workload::new("w2", vec![task("b", "n1")], 100_000));
        plan.insert_workload(Workload::new("w1", vec![task("a", "n1"), task("c", "n1")], 100_000));
        assert_eq!(plan.first_workload().unwrap().workload_id, "w1");
        assert_eq!(plan.first_workload().unwrap().task_count(), 2);
    }
}
