//! Framed TCP RPC transport for the Timpani node/orchestrator bus (spec
//! §4.2).
//!
//! Exposes the four methods of the object path `/com/lge/Timpani`
//! (`Register`, `SchedInfo`, `Sync`, `DMiss`) over a plain length-delimited
//! TCP stream — the object path and interface name are kept in
//! `timpani-config` purely for wire-schema compatibility with the original
//! D-Bus-based service description, not because this transport speaks D-Bus.

mod client;
mod error;
mod framing;
mod message;
mod method;
mod server;
mod socket;

pub use client::{RpcClient, CONNECT_RETRY_INTERVAL, MAX_CONNECT_RETRIES};
pub use error::{RpcError, RpcResult};
pub use message::{Request, Response};
pub use method::Method;
pub use server::{listen_and_serve, serve, RpcHandler};
