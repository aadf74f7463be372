use timpani_types::TaskRecord;

/// Everything one scheduling pass produces: the tasks it could place, and
/// the names of the ones it couldn't (spec §4.3: "the task is reported
/// unscheduled and skipped").
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScheduleOutcome {
    pub scheduled: Vec<TaskRecord>,
    pub unscheduled: Vec<String>,
}

impl ScheduleOutcome {
    pub fn distinct_periods_us(&self) -> Vec<u64> {
        self.scheduled.iter().map(|t| t.period_us as u64).collect()
    }
}
