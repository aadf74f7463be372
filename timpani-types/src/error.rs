use thiserror::Error;

/// Result alias used throughout `timpani-types`.
pub type TypesResult<T> = Result<T, TypesError>;

/// Errors raised while constructing or validating a data-model record.
///
/// Variants correspond to the `Config` error kind of the system-wide error
/// taxonomy (spec §7); `timpani-types` has no network, timer, or I/O
/// surface of its own.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypesError {
    #[error("period_us must be greater than zero")]
    ZeroPeriod,

    #[error("runtime_us ({runtime_us}) must be <= deadline_us ({deadline_us})")]
    RuntimeExceedsDeadline { runtime_us: u64, deadline_us: u64 },

    #[error("deadline_us ({deadline_us}) must be <= period_us ({period_us})")]
    DeadlineExceedsPeriod { deadline_us: u64, period_us: u64 },

    #[error("priority {priority} out of range [0..99] for policy requiring real-time priority")]
    PriorityOutOfRange { priority: u32 },

    #[error("task name must not be empty")]
    EmptyName,
}
