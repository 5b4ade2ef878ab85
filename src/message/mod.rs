pub mod codec;
pub mod comm;
pub mod custom;
pub mod key;
pub mod nvm;

use std::fmt;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::WireError;

/// Fixed envelope header size in bytes.
pub const HEADER_SIZE: usize = 8;

/// Maximum inline payload capacity. Transfers larger than this must use a
/// DMA variant of the operation.
pub const DATA_LEN: usize = 1280;

/// Maximum label length for NVM objects and cached keys.
pub const LABEL_LEN: usize = 24;

/// Protocol families. Each group owns its own action namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum Group {
    Comm = 0x0001,
    Nvm = 0x0002,
    Key = 0x0003,
    Custom = 0x0004,
}

impl Group {
    pub fn from_u16(v: u16) -> Result<Self, WireError> {
        match v {
            0x0001 => Ok(Self::Comm),
            0x0002 => Ok(Self::Nvm),
            0x0003 => Ok(Self::Key),
            0x0004 => Ok(Self::Custom),
            other => Err(WireError::UnknownGroup(other)),
        }
    }
}

/// Request action codes are odd; the paired response is `request + 1`.
pub const fn response_action(request: u16) -> u16 {
    request + 1
}

/// Result code reported by the server inside a response payload.
///
/// Server-side failures are normal, frequent outcomes (object not found,
/// access denied) and are always surfaced as data, never as an `Err`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerRc(pub i32);

impl ServerRc {
    pub const OK: Self = Self(0);
    pub const BAD_ARGS: Self = Self(-2);
    pub const NOT_READY: Self = Self(-3);
    pub const ABORTED: Self = Self(-4);
    pub const NOT_FOUND: Self = Self(-5);
    pub const NO_HANDLER: Self = Self(-6);
    pub const NO_SPACE: Self = Self(-7);
    pub const ACCESS: Self = Self(-8);

    pub const fn is_ok(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for ServerRc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::OK => write!(f, "ok"),
            Self::BAD_ARGS => write!(f, "bad arguments"),
            Self::NOT_READY => write!(f, "not ready"),
            Self::ABORTED => write!(f, "aborted"),
            Self::NOT_FOUND => write!(f, "not found"),
            Self::NO_HANDLER => write!(f, "no handler"),
            Self::NO_SPACE => write!(f, "no space"),
            Self::ACCESS => write!(f, "access denied"),
            Self(other) => write!(f, "server error {other}"),
        }
    }
}

/// A parsed envelope header.
///
/// All multi-byte fields on the wire are little-endian. This is a fixed
/// protocol constant, uniform across every field of every message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub seq: u16,
    pub group: Group,
    pub action: u16,
    pub size: u16,
}

impl Header {
    /// Encode the header into bytes.
    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u16_le(self.seq);
        buf.put_u16_le(self.group as u16);
        buf.put_u16_le(self.action);
        buf.put_u16_le(self.size);
    }

    /// Decode a header from a buffer. Returns `None` if not enough bytes.
    pub fn decode(buf: &mut BytesMut) -> Result<Option<Self>, WireError> {
        if buf.len() < HEADER_SIZE {
            return Ok(None);
        }

        let seq = u16::from_le_bytes([buf[0], buf[1]]);
        let group = Group::from_u16(u16::from_le_bytes([buf[2], buf[3]]))?;
        let action = u16::from_le_bytes([buf[4], buf[5]]);
        let size = u16::from_le_bytes([buf[6], buf[7]]);

        if size as usize > DATA_LEN {
            return Err(WireError::PayloadTooLarge {
                size: size as usize,
                max: DATA_LEN,
            });
        }

        buf.advance(HEADER_SIZE);

        Ok(Some(Self {
            seq,
            group,
            action,
            size,
        }))
    }
}

/// A complete message: envelope header + payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub header: Header,
    pub payload: Bytes,
}

impl Message {
    /// Build a message from its parts. The payload must fit the inline
    /// capacity; oversized data belongs in a DMA variant.
    pub fn new(seq: u16, group: Group, action: u16, payload: Bytes) -> Result<Self, WireError> {
        if payload.len() > DATA_LEN {
            return Err(WireError::PayloadTooLarge {
                size: payload.len(),
                max: DATA_LEN,
            });
        }
        Ok(Self {
            header: Header {
                seq,
                group,
                action,
                size: payload.len() as u16,
            },
            payload,
        })
    }
}

/// Encode a result-code-only response payload.
pub fn encode_rc(rc: ServerRc, buf: &mut BytesMut) {
    buf.put_i32_le(rc.0);
}

/// Decode a result-code-only response payload.
pub fn decode_rc(what: &'static str, payload: &[u8]) -> Result<ServerRc, WireError> {
    if payload.len() != 4 {
        return Err(WireError::Malformed {
            what,
            expected: 4,
            actual: payload.len(),
        });
    }
    Ok(ServerRc(i32::from_le_bytes([
        payload[0], payload[1], payload[2], payload[3],
    ])))
}

/// Reject a non-empty payload on an operation that carries none.
pub fn decode_empty(what: &'static str, payload: &[u8]) -> Result<(), WireError> {
    if !payload.is_empty() {
        return Err(WireError::Malformed {
            what,
            expected: 0,
            actual: payload.len(),
        });
    }
    Ok(())
}

/// Check that a label fits the fixed capacity. Oversized labels are
/// rejected at encode time, never truncated.
pub(crate) fn check_label(label: &[u8]) -> Result<(), WireError> {
    if label.len() > LABEL_LEN {
        return Err(WireError::LabelTooLong {
            len: label.len(),
            max: LABEL_LEN,
        });
    }
    Ok(())
}
