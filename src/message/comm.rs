//! Comm-group payload layouts: session init, close, echo.

use bytes::{Buf, BufMut, BytesMut};

use crate::error::WireError;

/// Action codes for the comm group.
pub mod action {
    pub const INIT_REQUEST: u16 = 0x0001;
    pub const INIT_RESPONSE: u16 = 0x0002;
    pub const CLOSE_REQUEST: u16 = 0x0003;
    pub const CLOSE_RESPONSE: u16 = 0x0004;
    pub const ECHO_REQUEST: u16 = 0x0005;
    pub const ECHO_RESPONSE: u16 = 0x0006;
}

/// Opens the session: the client announces its id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitRequest {
    pub client_id: u32,
}

impl InitRequest {
    pub const WIRE_LEN: usize = 4;

    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u32_le(self.client_id);
    }

    pub fn decode(mut payload: &[u8]) -> Result<Self, WireError> {
        if payload.len() != Self::WIRE_LEN {
            return Err(WireError::Malformed {
                what: "comm init request",
                expected: Self::WIRE_LEN,
                actual: payload.len(),
            });
        }
        Ok(Self {
            client_id: payload.get_u32_le(),
        })
    }
}

/// The server echoes the client id and reports its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitResponse {
    pub client_id: u32,
    pub server_id: u32,
}

impl InitResponse {
    pub const WIRE_LEN: usize = 8;

    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u32_le(self.client_id);
        buf.put_u32_le(self.server_id);
    }

    pub fn decode(mut payload: &[u8]) -> Result<Self, WireError> {
        if payload.len() != Self::WIRE_LEN {
            return Err(WireError::Malformed {
                what: "comm init response",
                expected: Self::WIRE_LEN,
                actual: payload.len(),
            });
        }
        Ok(Self {
            client_id: payload.get_u32_le(),
            server_id: payload.get_u32_le(),
        })
    }
}

// Close carries no payload in either direction; echo round-trips opaque
// bytes and needs no layout of its own.
