use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{RpcError, RpcResult};
use crate::method::Method;

/// Frames larger than this are rejected outright rather than trusted to
/// drive an allocation; no legitimate `SchedInfo` reply approaches this.
const MAX_FRAME_BYTES: usize = 16 * 1024 * 1024;

const STATUS_OK: u8 = 0;
const STATUS_ERR: u8 = 1;

/// Writes one request frame: `[u32 len][u8 method][payload]`, where `len`
/// counts the method byte plus the payload.
pub async fn write_request<W: AsyncWrite + Unpin>(
    writer: &mut W,
    method: Method,
    payload: &[u8],
) -> RpcResult<()> {
    let len = 1 + payload.len();
    writer.write_u32(len as u32).await?;
    writer.write_u8(method.to_wire()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads one request frame written by [`write_request`].
pub async fn read_request<R: AsyncRead + Unpin>(reader: &mut R) -> RpcResult<(Method, Vec<u8>)> {
    let len = reader.read_u32().await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            RpcError::ConnectionClosed
        } else {
            RpcError::Io(e)
        }
    })? as usize;
    if len == 0 {
        return Err(RpcError::Protocol(timpani_codec::CodecError::Truncated { needed: 1, remaining: 0 }));
    }
    if len > MAX_FRAME_BYTES {
        return Err(RpcError::FrameTooLarge { len, max: MAX_FRAME_BYTES });
    }
    let method = Method::from_wire(reader.read_u8().await?)?;
    let mut payload = vec![0u8; len - 1];
    reader.read_exact(&mut payload).await?;
    Ok((method, payload))
}

/// Writes one reply frame: `[u32 len][u8 status][payload]`. `status` is
/// `0` for a successful reply carrying the method's encoded response, `1`
/// for a handler failure carrying the error's display string as UTF-8.
pub async fn write_reply<W: AsyncWrite + Unpin>(
    writer: &mut W,
    result: Result<&[u8], &str>,
) -> RpcResult<()> {
    let (status, body): (u8, &[u8]) = match result {
        Ok(payload) => (STATUS_OK, payload),
        Err(message) => (STATUS_ERR, message.as_bytes()),
    };
    let len = 1 + body.len();
    writer.write_u32(len as u32).await?;
    writer.write_u8(status).await?;
    writer.write_all(body).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads one reply frame written by [`write_reply`]. Returns `Ok(payload)`
/// on a successful reply, `Err(message)` when the server reported a failure.
pub async fn read_reply<R: AsyncRead + Unpin>(reader: &mut R) -> RpcResult<Result<Vec<u8>, String>> {
    let len = reader.read_u32().await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::UnexpectedEof {
            RpcError::ConnectionClosed
        } else {
            RpcError::Io(e)
        }
    })? as usize;
    if len == 0 {
        return Err(RpcError::Protocol(timpani_codec::CodecError::Truncated { needed: 1, remaining: 0 }));
    }
    if len > MAX_FRAME_BYTES {
        return Err(RpcError::FrameTooLarge { len, max: MAX_FRAME_BYTES });
    }
    let status = reader.read_u8().await?;
    let mut body = vec![0u8; len - 1];
    reader.read_exact(&mut body).await?;
    Ok(if status == STATUS_OK {
        Ok(body)
    } else {
        Err(String::from_utf8_lossy(&body).into_owned())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::duplex;

    #[tokio::test]
    async fn request_round_trips_over_a_pipe() {
        let (mut a, mut b) = duplex(4096);
        write_request(&mut a, Method::DMiss, b"payload").await.unwrap();
        let (method, payload) = read_request(&mut b).await.unwrap();
        assert_eq!(method, Method::DMiss);
        assert_eq!(payload, b"payload");
    }

    #[tokio::test]
    async fn reply_round_trips_ok_and_err() {
        let (mut a, mut b) = duplex(4096);
        write_reply(&mut a, Ok(b"hi")).await.unwrap();
        assert_eq!(read_reply(&mut b).await.unwrap(), Ok(b"hi".to_vec()));

        write_reply(&mut a, Err("boom")).await.unwrap();
        assert_eq!(read_reply(&mut b).await.unwrap(), Err("boom".to_string()));
    }

    #[tokio::test]
    async fn oversized_frame_is_rejected() {
        let (mut a, mut b) = duplex(4096);
        a.write_u32((MAX_FRAME_BYTES + 1) as u32).await.unwrap();
        assert!(matches!(read_request(&mut b).await, Err(RpcError::FrameTooLarge { .. })));
    }
}
