use timpani_codec::{Decoder, Encoder};

use crate::error::RpcResult;
use crate::method::Method;

/// One in-flight RPC request, carrying the arguments spec §4.2 lists for its
/// method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Register { node_id: String },
    SchedInfo { node_id: String },
    Sync { node_id: String },
    DMiss { node_id: String, task_name: String },
}

impl Request {
    pub fn method(&self) -> Method {
        match self {
            Request::Register { .. } => Method::Register,
            Request::SchedInfo { .. } => Method::SchedInfo,
            Request::Sync { .. } => Method::Sync,
            Request::DMiss { .. } => Method::DMiss,
        }
    }

    pub fn encode_payload(&self) -> Vec<u8> {
        let mut enc = Encoder::new();
        match self {
            Request::Register { node_id }
            | Request::SchedInfo { node_id }
            | Request::Sync { node_id } => {
                enc.put_str(node_id);
            }
            Request::DMiss { node_id, task_name } => {
                enc.put_str(node_id);
                enc.put_str(task_name);
            }
        }
        enc.into_bytes()
    }

    pub fn decode_payload(method: Method, bytes: &[u8]) -> RpcResult<Request> {
        let mut dec = Decoder::new(bytes);
        Ok(match method {
            Method::Register => Request::Register { node_id: dec.get_str()? },
            Method::SchedInfo => Request::SchedInfo { node_id: dec.get_str()? },
            Method::Sync => Request::Sync { node_id: dec.get_str()? },
            Method::DMiss => {
                // Encoded node_id then task_name; the decoder unwinds last-in-first-out.
                let task_name = dec.get_str()?;
                let node_id = dec.get_str()?;
                Request::DMiss { node_id, task_name }
            }
        })
    }
}

/// The reply to a [`Request`], carrying the results spec §4.2 lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Register,
    SchedInfo { payload: Vec<u8> },
    Sync { ack: i32, sec: i64, nsec: i32 },
    DMiss,
}

impl Response {
    pub fn encode_payload(&self) -> Vec<u8> {
        let mut enc = Encoder::new();
        match self {
            Response::Register | Response::DMiss => {}
            Response::SchedInfo { payload } => enc.put_blob(payload),
            Response::Sync { ack, sec, nsec } => {
                enc.put_i32(*ack);
                enc.put_i64(*sec);
                enc.put_i32(*nsec);
            }
        }
        enc.into_bytes()
    }

    pub fn decode_payload(method: Method, bytes: &[u8]) -> RpcResult<Response> {
        let mut dec = Decoder::new(bytes);
        Ok(match method {
            Method::Register => Response::Register,
            Method::DMiss => Response::DMiss,
            Method::SchedInfo => Response::SchedInfo { payload: dec.get_blob()? },
            Method::Sync => {
                let nsec = dec.get_i32()?;
                let sec = dec.get_i64()?;
                let ack = dec.get_i32()?;
                Response::Sync { ack, sec, nsec }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dmiss_request_round_trips() {
        let req = Request::DMiss { node_id: "n1".into(), task_name: "hello".into() };
        let bytes = req.encode_payload();
        let decoded = Request::decode_payload(Method::DMiss, &bytes).unwrap();
        assert_eq!(decoded, req);
    }

    #[test]
    fn sync_response_round_trips() {
        let resp = Response::Sync { ack: 1, sec: 1_700_000_000, nsec: 250 };
        let bytes = resp.encode_payload();
        let decoded = Response::decode_payload(Method::Sync, &bytes).unwrap();
        assert_eq!(decoded, resp);
    }

    #[test]
    fn sched_info_response_preserves_empty_payload() {
        let resp = Response::SchedInfo { payload: vec![] };
        let bytes = resp.encode_payload();
        let decoded = Response::decode_payload(Method::SchedInfo, &bytes).unwrap();
        assert_eq!(decoded, resp);
    }
}
