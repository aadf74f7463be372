use std::sync::Arc;

use async_trait::async_trait;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

use crate::error::RpcResult;
use crate::framing::{read_request, write_reply};
use crate::message::{Request, Response};

/// Implemented by whatever holds the orchestrator's plan cache and barrier
/// state; one call per accepted request, matching spec §4.4's handler
/// descriptions. Implementors decide their own locking (spec §5: plan cache
/// behind a mutex, plan map behind a `RwLock`, barrier map touched only from
/// request handling).
#[async_trait]
pub trait RpcHandler: Send + Sync {
    async fn handle(&self, request: Request) -> RpcResult<Response>;
}

/// Runs `handler` behind a plain framed TCP accept loop: one spawned task per
/// connection, each request served sequentially on its own connection
/// (spec §5's "one `tokio::net::TcpListener::accept` loop spawning one task
/// per connection").
pub async fn serve(listener: TcpListener, handler: Arc<dyn RpcHandler>) -> RpcResult<()> {
    loop {
        let (stream, peer) = listener.accept().await?;
        crate::socket::tune(&stream)?;
        let handler = Arc::clone(&handler);
        tokio::spawn(async move {
            debug!(%peer, "accepted RPC connection");
            if let Err(e) = serve_connection(stream, handler).await {
                warn!(%peer, error = %e, "RPC connection ended");
            }
        });
    }
}

async fn serve_connection(mut stream: TcpStream, handler: Arc<dyn RpcHandler>) -> RpcResult<()> {
    loop {
        let (method, payload) = match read_request(&mut stream).await {
            Ok(frame) => frame,
            Err(crate::error::RpcError::ConnectionClosed) => return Ok(()),
            Err(e) => return Err(e),
        };

        let request = match Request::decode_payload(method, &payload) {
            Ok(r) => r,
            Err(e) => {
                write_reply(&mut stream, Err(&e.to_string())).await?;
                continue;
            }
        };

        match handler.handle(request).await {
            Ok(response) => {
                let body = response.encode_payload();
                write_reply(&mut stream, Ok(&body)).await?;
            }
            Err(e) => {
                error!(?method, error = %e, "RPC handler failed");
                write_reply(&mut stream, Err(&e.to_string())).await?;
            }
        }
    }
}

/// Binds `addr` and runs [`serve`] until the process is torn down. Kept as a
/// thin convenience for binaries that don't need the listener handle for
/// anything else.
pub async fn listen_and_serve(addr: &str, handler: Arc<dyn RpcHandler>) -> RpcResult<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "RPC server listening");
    serve(listener, handler).await
}
