use crate::error::RpcError;

/// The four methods exposed on the orchestrator's object path
/// (`/com/lge/Timpani`, interface `com.lge.Timpani.Orchestrator`, spec §4.2).
///
/// The path/interface strings are carried as configuration only (see
/// `timpani-config`); the transport itself is a plain framed TCP stream, not
/// D-Bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Method {
    Register = 0,
    SchedInfo = 1,
    Sync = 2,
    DMiss = 3,
}

impl Method {
    pub fn to_wire(self) -> u8 {
        self as u8
    }

    pub fn from_wire(value: u8) -> Result<Self, RpcError> {
        match value {
            0 => Ok(Method::Register),
            1 => Ok(Method::SchedInfo),
            2 => Ok(Method::Sync),
            3 => Ok(Method::DMiss),
            other => Err(RpcError::UnknownMethod(other)),
        }
    }
}
