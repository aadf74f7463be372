use thiserror::Error;

/// Result alias used throughout `timpani-rpc`.
pub type RpcResult<T> = Result<T, RpcError>;

/// Errors raised by the framed TCP transport.
///
/// Maps onto the `Network`/`Protocol`/`Unavailable` kinds of the system-wide
/// taxonomy (spec §7): anything below the transport (codec decode failures)
/// is folded in as `Protocol`, anything above it (connect/read/write
/// failure, peer hangup) as `Network`.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("network I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed RPC frame: {0}")]
    Protocol(#[from] timpani_codec::CodecError),

    #[error("peer closed the connection")]
    ConnectionClosed,

    #[error("frame of {len} bytes exceeds the {max} byte limit")]
    FrameTooLarge { len: usize, max: usize },

    #[error("unrecognized RPC method id: {0}")]
    UnknownMethod(u8),

    #[error("exhausted {attempts} connection attempt(s): {source}")]
    ConnectRetriesExhausted { attempts: u32, #[source] source: Box<RpcError> },
}
