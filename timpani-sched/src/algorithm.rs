use crate::error::{SchedError, SchedResult};
use crate::inventory::NodeInventory;
use crate::outcome::ScheduleOutcome;
use crate::{legacy, target_node_priority};
use timpani_types::TaskSpec;

/// Selects which scheduling algorithm a workload is packed with. The
/// primary algorithm is `TargetNodePriority`; the other two are retained
/// only for compatibility with existing workload configs (spec §4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Algorithm {
    TargetNodePriority,
    LeastLoaded,
    BestFitDecreasing,
}

impl Algorithm {
    /// Parses the algorithm name as it appears in orchestrator
    /// configuration (`"target_node_priority"`, `"least_loaded"`,
    /// `"best_fit_decreasing"`).
    pub fn parse(name: &str) -> SchedResult<Self> {
        match name {
            "target_node_priority" => Ok(Algorithm::TargetNodePriority),
            "least_loaded" => Ok(Algorithm::LeastLoaded),
            "best_fit_decreasing" => Ok(Algorithm::BestFitDecreasing),
            other => Err(SchedError::UnknownAlgorithm(other.to_string())),
        }
    }
}

/// Runs `algorithm` over `tasks` against `inventory`, producing the node
/// assignment described in spec §4.3.
pub fn schedule(tasks: &[TaskSpec], inventory: &[NodeInventory], algorithm: Algorithm) -> SchedResult<ScheduleOutcome> {
    if tasks.is_empty() {
        return Err(SchedError::NoTasks);
    }
    for task in tasks {
        task.validate().map_err(|source| SchedError::InvalidTask { name: task.name.clone(), source })?;
    }

    Ok(match algorithm {
        Algorithm::TargetNodePriority => target_node_priority::schedule(tasks, inventory),
        Algorithm::LeastLoaded => legacy::schedule_least_loaded(tasks, inventory),
        Algorithm::BestFitDecreasing => legacy::schedule_best_fit_decreasing(tasks, inventory),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_algorithm_name_is_rejected() {
        assert!(Algorithm::parse("round_robin").is_err());
    }

    #[test]
    fn empty_task_list_is_rejected() {
        let err = schedule(&[], &[], Algorithm::TargetNodePriority).unwrap_err();
        assert_eq!(err, SchedError::NoTasks);
    }
}
