use serde::{Deserialize, Serialize};

use crate::error::{TypesError, TypesResult};
use crate::{truncate_to, MAX_NODE_ID_LEN, MAX_TASK_NAME_LEN};

/// Index of a task within a [`Workload`](crate::Workload)'s task list.
///
/// Replaces the intrusive doubly-linked list the original implementation
/// embeds in each task record: tasks live in one owned `Vec`, and anything
/// that used to hold a pointer into that list holds a `TaskId` instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId(pub usize);

/// Linux scheduling policy for a task, as understood by `sched_setattr(2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(i32)]
pub enum SchedPolicy {
    Other = 0,
    Fifo = 1,
    RoundRobin = 2,
}

impl SchedPolicy {
    pub fn from_wire(value: i32) -> TypesResult<Self> {
        match value {
            0 => Ok(SchedPolicy::Other),
            1 => Ok(SchedPolicy::Fifo),
            2 => Ok(SchedPolicy::RoundRobin),
            _ => Err(TypesError::PriorityOutOfRange { priority: value as u32 }),
        }
    }

    pub fn to_wire(self) -> i32 {
        self as i32
    }

    fn requires_rt_priority(self) -> bool {
        !matches!(self, SchedPolicy::Other)
    }
}

/// CPU affinity a task asks for when it is first ingested, before the
/// scheduler (`timpani-sched`) has assigned it to a concrete CPU.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CpuPreference {
    /// No preference; the scheduler picks a CPU on the target node.
    Any,
    /// Pin to one specific CPU index on the target node, if available.
    Specific(u32),
}

/// A single periodic task as ingested from a workload definition, prior to
/// scheduling. Carried end-to-end by `timpani-sched`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub name: String,
    pub target_node: String,
    pub period_us: u64,
    pub runtime_us: u64,
    pub deadline_us: u64,
    pub release_offset_us: u64,
    pub priority: u32,
    pub policy: SchedPolicy,
    pub cpu_preference: CpuPreference,
    pub max_allowed_deadline_misses: u32,
    /// Memory footprint, used only by the legacy scheduling algorithms
    /// (`least_loaded`, `best_fit_decreasing`) to reject nodes whose
    /// inventory ceiling would be exceeded. Zero means "unconstrained".
    #[serde(default)]
    pub memory_mb: u32,
}

impl TaskSpec {
    /// Validates invariant I1 (`spec.md` §8): `period_us > 0`,
    /// `runtime_us <= deadline_us <= period_us`, and `priority` in `0..=99`
    /// whenever the policy requires a real-time priority.
    pub fn validate(&self) -> TypesResult<()> {
        if self.name.is_empty() {
            return Err(TypesError::EmptyName);
        }
        if self.period_us == 0 {
            return Err(TypesError::ZeroPeriod);
        }
        if self.runtime_us > self.deadline_us {
            return Err(TypesError::RuntimeExceedsDeadline {
                runtime_us: self.runtime_us,
                deadline_us: self.deadline_us,
            });
        }
        if self.deadline_us > self.period_us {
            return Err(TypesError::DeadlineExceedsPeriod {
                deadline_us: self.deadline_us,
                period_us: self.period_us,
            });
        }
        if self.policy.requires_rt_priority() && self.priority > 99 {
            return Err(TypesError::PriorityOutOfRange { priority: self.priority });
        }
        Ok(())
    }

    /// Per-task CPU utilization, `runtime_us / period_us`.
    pub fn utilization(&self) -> f64 {
        self.runtime_us as f64 / self.period_us as f64
    }
}

/// A task after scheduling: assigned to exactly one (node, CPU) pair. This
/// is the record that round-trips through `timpani-codec` as part of a
/// `SchedInfo` reply (spec §6).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskRecord {
    pub name: String,
    pub priority: u32,
    pub policy: SchedPolicy,
    pub period_us: u32,
    pub release_offset_us: u32,
    pub runtime_us: u32,
    pub deadline_us: u32,
    /// Single bit set at the assigned CPU index; kept as a 64-bit mask on
    /// the wire to leave room for future multi-CPU assignment.
    pub cpu_affinity: u64,
    pub max_allowed_deadline_misses: u32,
    pub assigned_node_id: String,
}

impl TaskRecord {
    /// Builds the scheduled record for `spec` once the packing algorithm has
    /// chosen `assigned_cpu` on `assigned_node_id`. Truncates `name` and
    /// `assigned_node_id` to the wire's length caps (§6), matching the
    /// original's `substr(0, N - 1)` truncation at serialization time.
    pub fn from_spec(spec: &TaskSpec, assigned_node_id: &str, assigned_cpu: u32) -> Self {
        TaskRecord {
            name: truncate_to(&spec.name, MAX_TASK_NAME_LEN),
            priority: spec.priority,
            policy: spec.policy,
            period_us: spec.period_us as u32,
            release_offset_us: spec.release_offset_us as u32,
            runtime_us: spec.runtime_us as u32,
            deadline_us: spec.deadline_us as u32,
            cpu_affinity: 1u64 << assigned_cpu,
            max_allowed_deadline_misses: spec.max_allowed_deadline_misses,
            assigned_node_id: truncate_to(assigned_node_id, MAX_NODE_ID_LEN),
        }
    }

    /// Per-task CPU utilization, `runtime_us / period_us`.
    pub fn utilization(&self) -> f64 {
        self.runtime_us as f64 / self.period_us as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_spec() -> TaskSpec {
        TaskSpec {
            name: "hello".to_string(),
            target_node: "n1".to_string(),
            period_us: 100_000,
            runtime_us: 10_000,
            deadline_us: 100_000,
            release_offset_us: 0,
            priority: 50,
            policy: SchedPolicy::Fifo,
            cpu_preference: CpuPreference::Specific(0),
            max_allowed_deadline_misses: 0,
            memory_mb: 0,
        }
    }

    #[test]
    fn validate_accepts_well_formed_task() {
        assert!(base_spec().validate().is_ok());
    }

    #[test]
    fn validate_rejects_zero_period() {
        let mut s = base_spec();
        s.period_us = 0;
        assert_eq!(s.validate(), Err(TypesError::ZeroPeriod));
    }

    #[test]
    fn validate_rejects_runtime_over_deadline() {
        let mut s = base_spec();
        s.runtime_us = 200_000;
        assert!(matches!(
            s.validate(),
            Err(TypesError::RuntimeExceedsDeadline { .. })
        ));
    }

    #[test]
    fn validate_rejects_deadline_over_period() {
        let mut s = base_spec();
        s.deadline_us = 200_000;
        assert!(matches!(
            s.validate(),
            Err(TypesError::DeadlineExceedsPeriod { .. })
        ));
    }

    #[test]
    fn validate_rejects_bad_priority_for_rt_policy() {
        let mut s = base_spec();
        s.priority = 100;
        assert!(matches!(
            s.validate(),
            Err(TypesError::PriorityOutOfRange { .. })
        ));
    }

    #[test]
    fn other_policy_ignores_priority_range() {
        let mut s = base_spec();
        s.policy = SchedPolicy::Other;
        s.priority = 100;
        assert!(s.validate().is_ok());
    }

    #[test]
    fn from_spec_sets_single_bit_affinity() {
        let record = TaskRecord::from_spec(&base_spec(), "n1", 3);
        assert_eq!(record.cpu_affinity, 0b1000);
    }

    #[test]
    fn from_spec_truncates_long_name() {
        let mut s = base_spec();
        s.name = "a".repeat(40);
        let record = TaskRecord::from_spec(&s, "n1", 0);
        assert_eq!(record.name.len(), MAX_TASK_NAME_LEN);
    }
}
