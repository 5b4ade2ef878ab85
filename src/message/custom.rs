//! Custom-callback payload layouts.
//!
//! The invoke envelope is a passthrough: the engine never interprets the
//! payload's internal structure.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::{ServerRc, DATA_LEN};
use crate::error::WireError;

/// Action codes for the custom-callback group.
pub mod action {
    pub const CHECK_REGISTERED_REQUEST: u16 = 0x0001;
    pub const CHECK_REGISTERED_RESPONSE: u16 = 0x0002;
    pub const INVOKE_REQUEST: u16 = 0x0003;
    pub const INVOKE_RESPONSE: u16 = 0x0004;
}

/// Asks whether a user-defined callback is registered for this id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckRegisteredRequest {
    pub callback_id: u16,
}

impl CheckRegisteredRequest {
    pub const WIRE_LEN: usize = 2;

    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u16_le(self.callback_id);
    }

    pub fn decode(mut payload: &[u8]) -> Result<Self, WireError> {
        if payload.len() != Self::WIRE_LEN {
            return Err(WireError::Malformed {
                what: "custom check-registered request",
                expected: Self::WIRE_LEN,
                actual: payload.len(),
            });
        }
        Ok(Self {
            callback_id: payload.get_u16_le(),
        })
    }
}

/// Check-registered response. `rc` is `OK` when a handler exists and
/// `NO_HANDLER` when none is registered; the latter is a normal outcome,
/// not a transport failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckRegisteredResponse {
    pub callback_id: u16,
    pub rc: ServerRc,
}

impl CheckRegisteredResponse {
    pub const WIRE_LEN: usize = 6;

    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u16_le(self.callback_id);
        buf.put_i32_le(self.rc.0);
    }

    pub fn decode(mut payload: &[u8]) -> Result<Self, WireError> {
        if payload.len() != Self::WIRE_LEN {
            return Err(WireError::Malformed {
                what: "custom check-registered response",
                expected: Self::WIRE_LEN,
                actual: payload.len(),
            });
        }
        Ok(Self {
            callback_id: payload.get_u16_le(),
            rc: ServerRc(payload.get_i32_le()),
        })
    }
}

/// Invoke a registered callback with an opaque payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeRequest {
    pub callback_id: u16,
    pub payload: Bytes,
}

impl InvokeRequest {
    pub const FIXED_LEN: usize = 2;

    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), WireError> {
        let total = Self::FIXED_LEN + self.payload.len();
        if total > DATA_LEN {
            return Err(WireError::PayloadTooLarge {
                size: total,
                max: DATA_LEN,
            });
        }
        buf.reserve(total);
        buf.put_u16_le(self.callback_id);
        buf.extend_from_slice(&self.payload);
        Ok(())
    }

    pub fn decode(payload: &[u8]) -> Result<Self, WireError> {
        let mut cursor = payload;
        if cursor.len() < Self::FIXED_LEN {
            return Err(WireError::Malformed {
                what: "custom invoke request",
                expected: Self::FIXED_LEN,
                actual: payload.len(),
            });
        }
        let callback_id = cursor.get_u16_le();
        Ok(Self {
            callback_id,
            payload: Bytes::copy_from_slice(cursor),
        })
    }
}

/// Result of invoking a callback: the handler's error code and an opaque
/// response payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokeResponse {
    pub callback_id: u16,
    pub err: ServerRc,
    pub payload: Bytes,
}

impl InvokeResponse {
    pub const FIXED_LEN: usize = 6;

    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), WireError> {
        let total = Self::FIXED_LEN + self.payload.len();
        if total > DATA_LEN {
            return Err(WireError::PayloadTooLarge {
                size: total,
                max: DATA_LEN,
            });
        }
        buf.reserve(total);
        buf.put_u16_le(self.callback_id);
        buf.put_i32_le(self.err.0);
        buf.extend_from_slice(&self.payload);
        Ok(())
    }

    pub fn decode(payload: &[u8]) -> Result<Self, WireError> {
        let mut cursor = payload;
        if cursor.len() < Self::FIXED_LEN {
            return Err(WireError::Malformed {
                what: "custom invoke response",
                expected: Self::FIXED_LEN,
                actual: payload.len(),
            });
        }
        let callback_id = cursor.get_u16_le();
        let err = ServerRc(cursor.get_i32_le());
        Ok(Self {
            callback_id,
            err,
            payload: Bytes::copy_from_slice(cursor),
        })
    }
}
