//! Socket option tuning shared by the client and server halves (spec §4.2:
//! "Socket options on accepted connections: no-delay enabled, keep-alive
//! enabled with probe timings (idle=60s, interval=10s, count=3)").
//!
//! Confirmed against `original_source/src/peer_dbus.c`, which sets
//! `SO_KEEPALIVE`/`TCP_KEEPIDLE=60`/`TCP_KEEPINTVL=10`/`TCP_KEEPCNT=3` on
//! every accepted peer connection; `tokio::net::TcpStream` has no keepalive
//! setter of its own, so `socket2::SockRef` borrows the raw fd to apply it.

use std::time::Duration;

use socket2::{SockRef, TcpKeepalive};
use tokio::net::TcpStream;

use crate::error::RpcResult;

const KEEPALIVE_IDLE: Duration = Duration::from_secs(60);
const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(10);
const KEEPALIVE_RETRIES: u32 = 3;

/// Applies no-delay and keep-alive (idle=60s, interval=10s, count=3) to
/// `stream`, matching the original's peer socket setup exactly.
pub fn tune(stream: &TcpStream) -> RpcResult<()> {
    stream.set_nodelay(true)?;

    let keepalive =
        TcpKeepalive::new().with_time(KEEPALIVE_IDLE).with_interval(KEEPALIVE_INTERVAL).with_retries(KEEPALIVE_RETRIES);
    SockRef::from(stream).set_tcp_keepalive(&keepalive)?;
    Ok(())
}
