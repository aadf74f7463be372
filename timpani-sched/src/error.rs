use thiserror::Error;

/// Result alias used throughout `timpani-sched`.
pub type SchedResult<T> = Result<T, SchedError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchedError {
    #[error("unknown scheduling algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("no tasks to schedule")]
    NoTasks,

    #[error("task {name:?} failed validation: {source}")]
    InvalidTask { name: String, #[source] source: timpani_types::TypesError },
}
