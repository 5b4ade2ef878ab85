//! Key-group payload layouts: cache, evict, commit, erase, export.
//!
//! Raw key material passing through the engine lives in [`Zeroizing`]
//! buffers so it is wiped when dropped.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use zeroize::Zeroizing;

use super::{check_label, ServerRc, DATA_LEN, LABEL_LEN};
use crate::error::WireError;

/// Opaque server-assigned identifier for cached or committed key material.
pub type KeyId = u16;

/// Requests the server pick the key id itself.
pub const KEY_ID_AUTO: KeyId = 0;

/// Maximum key bytes a cache request can carry with an empty label.
pub const KEY_MAX: usize = DATA_LEN - CacheRequest::FIXED_LEN;

/// Action codes for the key group.
pub mod action {
    pub const CACHE_REQUEST: u16 = 0x0001;
    pub const CACHE_RESPONSE: u16 = 0x0002;
    pub const EVICT_REQUEST: u16 = 0x0003;
    pub const EVICT_RESPONSE: u16 = 0x0004;
    pub const COMMIT_REQUEST: u16 = 0x0005;
    pub const COMMIT_RESPONSE: u16 = 0x0006;
    pub const ERASE_REQUEST: u16 = 0x0007;
    pub const ERASE_RESPONSE: u16 = 0x0008;
    pub const EXPORT_REQUEST: u16 = 0x0009;
    pub const EXPORT_RESPONSE: u16 = 0x000A;
}

/// Cache request: flags, an optional explicit id, a label, and the raw
/// key bytes. Flags are opaque bit values forwarded to the server.
#[derive(Debug, Clone)]
pub struct CacheRequest {
    pub flags: u32,
    pub key_id: KeyId,
    pub label: Bytes,
    pub key: Zeroizing<Vec<u8>>,
}

impl CacheRequest {
    pub const FIXED_LEN: usize = 10;

    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), WireError> {
        check_label(&self.label)?;
        let total = Self::FIXED_LEN + self.label.len() + self.key.len();
        if total > DATA_LEN {
            return Err(WireError::PayloadTooLarge {
                size: total,
                max: DATA_LEN,
            });
        }
        buf.reserve(total);
        buf.put_u32_le(self.flags);
        buf.put_u16_le(self.key_id);
        buf.put_u16_le(self.label.len() as u16);
        buf.put_u16_le(self.key.len() as u16);
        buf.extend_from_slice(&self.label);
        buf.extend_from_slice(&self.key);
        Ok(())
    }

    pub fn decode(payload: &[u8]) -> Result<Self, WireError> {
        let mut cursor = payload;
        if cursor.len() < Self::FIXED_LEN {
            return Err(WireError::Malformed {
                what: "key cache request",
                expected: Self::FIXED_LEN,
                actual: payload.len(),
            });
        }
        let flags = cursor.get_u32_le();
        let key_id = cursor.get_u16_le();
        let label_len = cursor.get_u16_le() as usize;
        let data_len = cursor.get_u16_le() as usize;
        if label_len > LABEL_LEN {
            return Err(WireError::LabelTooLong {
                len: label_len,
                max: LABEL_LEN,
            });
        }
        if cursor.len() != label_len + data_len {
            return Err(WireError::Malformed {
                what: "key cache request",
                expected: Self::FIXED_LEN + label_len + data_len,
                actual: payload.len(),
            });
        }
        let label = Bytes::copy_from_slice(&cursor[..label_len]);
        let key = Zeroizing::new(cursor[label_len..].to_vec());
        Ok(Self {
            flags,
            key_id,
            label,
            key,
        })
    }
}

/// Cache response: the id now referencing the cached material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheResponse {
    pub rc: ServerRc,
    pub key_id: KeyId,
}

impl CacheResponse {
    pub const WIRE_LEN: usize = 6;

    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_i32_le(self.rc.0);
        buf.put_u16_le(self.key_id);
    }

    pub fn decode(mut payload: &[u8]) -> Result<Self, WireError> {
        if payload.len() != Self::WIRE_LEN {
            return Err(WireError::Malformed {
                what: "key cache response",
                expected: Self::WIRE_LEN,
                actual: payload.len(),
            });
        }
        Ok(Self {
            rc: ServerRc(payload.get_i32_le()),
            key_id: payload.get_u16_le(),
        })
    }
}

/// Evict, commit, erase, and export requests all carry a bare key id.
pub fn encode_key_id(key_id: KeyId, buf: &mut BytesMut) {
    buf.put_u16_le(key_id);
}

pub fn decode_key_id(what: &'static str, mut payload: &[u8]) -> Result<KeyId, WireError> {
    if payload.len() != 2 {
        return Err(WireError::Malformed {
            what,
            expected: 2,
            actual: payload.len(),
        });
    }
    Ok(payload.get_u16_le())
}

/// Export response: the label and raw key bytes for a cached or committed
/// key. Export does not change the key's state.
#[derive(Debug, Clone)]
pub struct ExportResponse {
    pub rc: ServerRc,
    pub label: Bytes,
    pub key: Zeroizing<Vec<u8>>,
}

impl ExportResponse {
    pub const FIXED_LEN: usize = 8;

    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), WireError> {
        check_label(&self.label)?;
        let total = Self::FIXED_LEN + self.label.len() + self.key.len();
        if total > DATA_LEN {
            return Err(WireError::PayloadTooLarge {
                size: total,
                max: DATA_LEN,
            });
        }
        buf.reserve(total);
        buf.put_i32_le(self.rc.0);
        buf.put_u16_le(self.label.len() as u16);
        buf.put_u16_le(self.key.len() as u16);
        buf.extend_from_slice(&self.label);
        buf.extend_from_slice(&self.key);
        Ok(())
    }

    pub fn decode(payload: &[u8]) -> Result<Self, WireError> {
        let mut cursor = payload;
        if cursor.len() < Self::FIXED_LEN {
            return Err(WireError::Malformed {
                what: "key export response",
                expected: Self::FIXED_LEN,
                actual: payload.len(),
            });
        }
        let rc = ServerRc(cursor.get_i32_le());
        let label_len = cursor.get_u16_le() as usize;
        let data_len = cursor.get_u16_le() as usize;
        if label_len > LABEL_LEN {
            return Err(WireError::LabelTooLong {
                len: label_len,
                max: LABEL_LEN,
            });
        }
        if cursor.len() != label_len + data_len {
            return Err(WireError::Malformed {
                what: "key export response",
                expected: Self::FIXED_LEN + label_len + data_len,
                actual: payload.len(),
            });
        }
        let label = Bytes::copy_from_slice(&cursor[..label_len]);
        let key = Zeroizing::new(cursor[label_len..].to_vec());
        Ok(Self { rc, label, key })
    }
}
