use thiserror::Error;

pub type NodeResult<T> = Result<T, NodeError>;

/// Errors raised by the node agent. Maps onto the system-wide taxonomy
/// (spec §7): `Config` for CLI/inventory problems, `Network`/`Protocol` for
/// the orchestrator bus, `Timer`/`Permission`/`Tracing` for the Linux
/// process/eBPF facilities the engine and observer depend on.
#[derive(Debug, Error)]
pub enum NodeError {
    #[error("configuration error: {0}")]
    Config(#[from] timpani_config::ConfigError),

    #[error("RPC error: {0}")]
    Rpc(#[from] timpani_rpc::RpcError),

    #[error("protocol error: {0}")]
    Protocol(#[from] timpani_codec::CodecError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("timer error: {0}")]
    Timer(String),

    #[error("permission denied: {0}")]
    Permission(String),

    #[error("tracing facility error: {0}")]
    Tracing(String),

    #[error("fetched an empty plan for node {node_id}")]
    EmptyPlan { node_id: String },
}
