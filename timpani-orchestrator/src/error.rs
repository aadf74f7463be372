use thiserror::Error;

pub type OrchResult<T> = Result<T, OrchError>;

/// Errors raised by the dispatcher and the orchestrator binary. Maps onto
/// the system-wide taxonomy (spec §7): `Config` for inventory/workload
/// ingest failures, `Network` for the RPC server and fault sink, `Protocol`
/// for wire decode failures the dispatcher itself observes.
#[derive(Debug, Error)]
pub enum OrchError {
    #[error("configuration error: {0}")]
    Config(#[from] timpani_config::ConfigError),

    #[error("scheduling error: {0}")]
    Sched(#[from] timpani_sched::SchedError),

    #[error("RPC error: {0}")]
    Rpc(#[from] timpani_rpc::RpcError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
