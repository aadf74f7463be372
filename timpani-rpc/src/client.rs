use std::time::Duration;

use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::error::{RpcError, RpcResult};
use crate::framing::{read_reply, write_request};
use crate::message::{Request, Response};
use crate::method::Method;

/// Connect retries spec §4.5 allows before a node gives up on the
/// orchestrator for one attempt: 300 tries at 1 second apart, a five minute
/// window.
pub const MAX_CONNECT_RETRIES: u32 = 300;
pub const CONNECT_RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// One persistent connection to an RPC server, speaking the four methods of
/// spec §4.2. A fresh [`RpcClient`] is cheap; callers that need to survive
/// disconnects hold on to the address and call [`RpcClient::connect_with_retry`]
/// again.
pub struct RpcClient {
    stream: TcpStream,
}

impl RpcClient {
    /// Connects once, with no retry. Callers on the node startup path should
    /// prefer [`RpcClient::connect_with_retry`].
    pub async fn connect(addr: &str) -> RpcResult<Self> {
        let stream = TcpStream::connect(addr).await?;
        crate::socket::tune(&stream)?;
        Ok(RpcClient { stream })
    }

    /// Connects, retrying up to `MAX_CONNECT_RETRIES` times at
    /// `CONNECT_RETRY_INTERVAL` apart (spec §4.5's "up to 300 retries at
    /// 1-second intervals").
    pub async fn connect_with_retry(addr: &str) -> RpcResult<Self> {
        let mut last_err = None;
        for attempt in 0..=MAX_CONNECT_RETRIES {
            match Self::connect(addr).await {
                Ok(client) => return Ok(client),
                Err(e) => {
                    warn!(attempt, %addr, error = %e, "orchestrator connect attempt failed");
                    last_err = Some(e);
                    if attempt < MAX_CONNECT_RETRIES {
                        tokio::time::sleep(CONNECT_RETRY_INTERVAL).await;
                    }
                }
            }
        }
        Err(RpcError::ConnectRetriesExhausted {
            attempts: MAX_CONNECT_RETRIES + 1,
            source: Box::new(last_err.expect("loop always assigns an error before exiting")),
        })
    }

    async fn call(&mut self, request: Request) -> RpcResult<Response> {
        let method = request.method();
        let payload = request.encode_payload();
        write_request(&mut self.stream, method, &payload).await?;
        let reply = read_reply(&mut self.stream).await?;
        match reply {
            Ok(bytes) => Response::decode_payload(method, &bytes),
            Err(message) => {
                debug!(?method, %message, "server returned an RPC failure");
                Err(RpcError::Io(std::io::Error::new(std::io::ErrorKind::Other, message)))
            }
        }
    }

    pub async fn register(&mut self, node_id: &str) -> RpcResult<()> {
        self.call(Request::Register { node_id: node_id.to_string() }).await?;
        Ok(())
    }

    /// Returns the node's plan slice, or an empty vec when no plan is
    /// installed yet (spec §4.2).
    pub async fn sched_info(&mut self, node_id: &str) -> RpcResult<Vec<u8>> {
        match self.call(Request::SchedInfo { node_id: node_id.to_string() }).await? {
            Response::SchedInfo { payload } => Ok(payload),
            other => unreachable!("SchedInfo always decodes to Response::SchedInfo, got {other:?}"),
        }
    }

    /// Polls the cross-node start-instant barrier (spec §4.4). Returns
    /// `(ack, sec, nsec)`.
    pub async fn sync(&mut self, node_id: &str) -> RpcResult<(i32, i64, i32)> {
        match self.call(Request::Sync { node_id: node_id.to_string() }).await? {
            Response::Sync { ack, sec, nsec } => Ok((ack, sec, nsec)),
            other => unreachable!("Sync always decodes to Response::Sync, got {other:?}"),
        }
    }

    /// Reports one deadline miss. Best-effort: callers log and drop
    /// failures rather than blocking a timer fire on them (spec §4.6).
    pub async fn dmiss(&mut self, node_id: &str, task_name: &str) -> RpcResult<()> {
        self.call(Request::DMiss { node_id: node_id.to_string(), task_name: task_name.to_string() }).await?;
        Ok(())
    }
}
