//! NVM-group payload layouts: object store operations and their DMA
//! variants.
//!
//! Every response payload opens with the server result code `rc` (i32 LE).
//! Inline data paths are bounded by [`DATA_LEN`]; larger transfers pass a
//! host address instead and use the DMA actions.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::{check_label, ServerRc, DATA_LEN, LABEL_LEN};
use crate::error::WireError;

/// Identifier of a stored object, unique among live objects.
pub type NvmId = u16;
/// Access-rights bit field, forwarded opaquely to the server.
pub type NvmAccess = u16;
/// Object flag bits, forwarded opaquely to the server.
pub type NvmFlags = u16;
/// Byte-length field used throughout the object protocol.
pub type NvmSize = u16;

pub const ACCESS_NONE: NvmAccess = 0x0000;
pub const ACCESS_READ: NvmAccess = 0x0001;
pub const ACCESS_WRITE: NvmAccess = 0x0002;

/// Maximum ids accepted by one destroy request.
pub const DESTROY_MAX_IDS: usize = (DATA_LEN - 2) / 2;

/// Maximum data bytes an inline read response can carry.
pub const READ_MAX: usize = DATA_LEN - ReadResponse::FIXED_LEN;

/// Maximum data bytes an inline add request can carry with an empty label.
pub const ADD_MAX: usize = DATA_LEN - AddObjectRequest::FIXED_LEN;

/// Action codes for the NVM group.
pub mod action {
    pub const INIT_REQUEST: u16 = 0x0001;
    pub const INIT_RESPONSE: u16 = 0x0002;
    pub const CLEANUP_REQUEST: u16 = 0x0003;
    pub const CLEANUP_RESPONSE: u16 = 0x0004;
    pub const GET_AVAILABLE_REQUEST: u16 = 0x0005;
    pub const GET_AVAILABLE_RESPONSE: u16 = 0x0006;
    pub const ADD_OBJECT_REQUEST: u16 = 0x0007;
    pub const ADD_OBJECT_RESPONSE: u16 = 0x0008;
    pub const LIST_REQUEST: u16 = 0x0009;
    pub const LIST_RESPONSE: u16 = 0x000A;
    pub const GET_METADATA_REQUEST: u16 = 0x000B;
    pub const GET_METADATA_RESPONSE: u16 = 0x000C;
    pub const DESTROY_OBJECTS_REQUEST: u16 = 0x000D;
    pub const DESTROY_OBJECTS_RESPONSE: u16 = 0x000E;
    pub const READ_REQUEST: u16 = 0x000F;
    pub const READ_RESPONSE: u16 = 0x0010;
    pub const ADD_OBJECT_DMA32_REQUEST: u16 = 0x0011;
    pub const ADD_OBJECT_DMA32_RESPONSE: u16 = 0x0012;
    pub const ADD_OBJECT_DMA64_REQUEST: u16 = 0x0013;
    pub const ADD_OBJECT_DMA64_RESPONSE: u16 = 0x0014;
    pub const READ_DMA32_REQUEST: u16 = 0x0015;
    pub const READ_DMA32_RESPONSE: u16 = 0x0016;
    pub const READ_DMA64_REQUEST: u16 = 0x0017;
    pub const READ_DMA64_RESPONSE: u16 = 0x0018;
}

/// A host memory address in one of the two supported pointer widths.
///
/// Client and server may run on heterogeneous architectures; the variant
/// selects which DMA action code the request travels under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmaAddr {
    Addr32(u32),
    Addr64(u64),
}

impl DmaAddr {
    /// Reference the start of a slice at the native pointer width.
    pub fn of_slice(data: &[u8]) -> Self {
        Self::of_addr(data.as_ptr() as usize)
    }

    /// Wrap a raw host address at the native pointer width.
    pub fn of_addr(addr: usize) -> Self {
        if cfg!(target_pointer_width = "64") {
            Self::Addr64(addr as u64)
        } else {
            Self::Addr32(addr as u32)
        }
    }

    fn is_32(self) -> bool {
        matches!(self, Self::Addr32(_))
    }

    fn put(self, buf: &mut BytesMut) {
        match self {
            Self::Addr32(a) => buf.put_u32_le(a),
            Self::Addr64(a) => buf.put_u64_le(a),
        }
    }
}

/// A (host address, length) pair standing in for an inline payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DmaBuffer {
    pub addr: DmaAddr,
    pub len: NvmSize,
}

impl DmaBuffer {
    /// Reference an existing slice at the native pointer width.
    pub fn of_slice(data: &[u8]) -> Self {
        Self {
            addr: DmaAddr::of_slice(data),
            len: data.len() as NvmSize,
        }
    }
}

/// Object metadata as the server stores it.
///
/// The layout is part of the wire contract: the metadata-structure DMA
/// variant transfers this struct by host address, so the field order and
/// the fixed-capacity label array must not change.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NvmMetadata {
    pub id: NvmId,
    pub access: NvmAccess,
    pub flags: NvmFlags,
    pub len: NvmSize,
    pub label: [u8; LABEL_LEN],
}

impl NvmMetadata {
    /// Build metadata with a zero-padded label. Oversized labels are
    /// rejected, not truncated.
    pub fn new(
        id: NvmId,
        access: NvmAccess,
        flags: NvmFlags,
        len: NvmSize,
        label: &[u8],
    ) -> Result<Self, WireError> {
        check_label(label)?;
        let mut fixed = [0u8; LABEL_LEN];
        fixed[..label.len()].copy_from_slice(label);
        Ok(Self {
            id,
            access,
            flags,
            len,
            label: fixed,
        })
    }
}

/// Response to the parameterless NVM init request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitResponse {
    pub rc: ServerRc,
    pub client_nvm_id: u32,
    pub server_nvm_id: u32,
}

impl InitResponse {
    pub const WIRE_LEN: usize = 12;

    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_i32_le(self.rc.0);
        buf.put_u32_le(self.client_nvm_id);
        buf.put_u32_le(self.server_nvm_id);
    }

    pub fn decode(mut payload: &[u8]) -> Result<Self, WireError> {
        if payload.len() != Self::WIRE_LEN {
            return Err(WireError::Malformed {
                what: "nvm init response",
                expected: Self::WIRE_LEN,
                actual: payload.len(),
            });
        }
        Ok(Self {
            rc: ServerRc(payload.get_i32_le()),
            client_nvm_id: payload.get_u32_le(),
            server_nvm_id: payload.get_u32_le(),
        })
    }
}

/// Response to the get-available request: free and reclaimable space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GetAvailableResponse {
    pub rc: ServerRc,
    pub avail_size: u32,
    pub avail_objects: NvmId,
    pub reclaim_size: u32,
    pub reclaim_objects: NvmId,
}

impl GetAvailableResponse {
    pub const WIRE_LEN: usize = 16;

    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_i32_le(self.rc.0);
        buf.put_u32_le(self.avail_size);
        buf.put_u16_le(self.avail_objects);
        buf.put_u32_le(self.reclaim_size);
        buf.put_u16_le(self.reclaim_objects);
    }

    pub fn decode(mut payload: &[u8]) -> Result<Self, WireError> {
        if payload.len() != Self::WIRE_LEN {
            return Err(WireError::Malformed {
                what: "nvm get-available response",
                expected: Self::WIRE_LEN,
                actual: payload.len(),
            });
        }
        Ok(Self {
            rc: ServerRc(payload.get_i32_le()),
            avail_size: payload.get_u32_le(),
            avail_objects: payload.get_u16_le(),
            reclaim_size: payload.get_u32_le(),
            reclaim_objects: payload.get_u16_le(),
        })
    }
}

/// Inline add: metadata and object data travel in the request payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddObjectRequest {
    pub id: NvmId,
    pub access: NvmAccess,
    pub flags: NvmFlags,
    pub label: Bytes,
    pub data: Bytes,
}

impl AddObjectRequest {
    pub const FIXED_LEN: usize = 10;

    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), WireError> {
        check_label(&self.label)?;
        let total = Self::FIXED_LEN + self.label.len() + self.data.len();
        if total > DATA_LEN {
            return Err(WireError::PayloadTooLarge {
                size: total,
                max: DATA_LEN,
            });
        }
        buf.reserve(total);
        buf.put_u16_le(self.id);
        buf.put_u16_le(self.access);
        buf.put_u16_le(self.flags);
        buf.put_u16_le(self.label.len() as u16);
        buf.put_u16_le(self.data.len() as u16);
        buf.extend_from_slice(&self.label);
        buf.extend_from_slice(&self.data);
        Ok(())
    }

    pub fn decode(payload: &[u8]) -> Result<Self, WireError> {
        let mut cursor = payload;
        if cursor.len() < Self::FIXED_LEN {
            return Err(WireError::Malformed {
                what: "nvm add request",
                expected: Self::FIXED_LEN,
                actual: payload.len(),
            });
        }
        let id = cursor.get_u16_le();
        let access = cursor.get_u16_le();
        let flags = cursor.get_u16_le();
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
                what: "nvm add request",
                expected: Self::FIXED_LEN + label_len + data_len,
                actual: payload.len(),
            });
        }
        let label = Bytes::copy_from_slice(&cursor[..label_len]);
        let data = Bytes::copy_from_slice(&cursor[label_len..]);
        Ok(Self {
            id,
            access,
            flags,
            label,
            data,
        })
    }
}

/// List request: filter plus a starting id for pagination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListRequest {
    pub access: NvmAccess,
    pub flags: NvmFlags,
    pub start_id: NvmId,
}

impl ListRequest {
    pub const WIRE_LEN: usize = 6;

    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u16_le(self.access);
        buf.put_u16_le(self.flags);
        buf.put_u16_le(self.start_id);
    }

    pub fn decode(mut payload: &[u8]) -> Result<Self, WireError> {
        if payload.len() != Self::WIRE_LEN {
            return Err(WireError::Malformed {
                what: "nvm list request",
                expected: Self::WIRE_LEN,
                actual: payload.len(),
            });
        }
        Ok(Self {
            access: payload.get_u16_le(),
            flags: payload.get_u16_le(),
            start_id: payload.get_u16_le(),
        })
    }
}

/// List response: how many objects match, and the next id after the start.
///
/// Enumerating the whole store is the caller's job: repeat the request with
/// the returned id as the new start until `count` reaches zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListResponse {
    pub rc: ServerRc,
    pub count: NvmId,
    pub id: NvmId,
}

impl ListResponse {
    pub const WIRE_LEN: usize = 8;

    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_i32_le(self.rc.0);
        buf.put_u16_le(self.count);
        buf.put_u16_le(self.id);
    }

    pub fn decode(mut payload: &[u8]) -> Result<Self, WireError> {
        if payload.len() != Self::WIRE_LEN {
            return Err(WireError::Malformed {
                what: "nvm list response",
                expected: Self::WIRE_LEN,
                actual: payload.len(),
            });
        }
        Ok(Self {
            rc: ServerRc(payload.get_i32_le()),
            count: payload.get_u16_le(),
            id: payload.get_u16_le(),
        })
    }
}

/// Get-metadata requests carry a bare object id.
pub fn encode_object_id(id: NvmId, buf: &mut BytesMut) {
    buf.put_u16_le(id);
}

pub fn decode_object_id(what: &'static str, mut payload: &[u8]) -> Result<NvmId, WireError> {
    if payload.len() != 2 {
        return Err(WireError::Malformed {
            what,
            expected: 2,
            actual: payload.len(),
        });
    }
    Ok(payload.get_u16_le())
}

/// Metadata response: everything about one object except its data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetMetadataResponse {
    pub rc: ServerRc,
    pub id: NvmId,
    pub access: NvmAccess,
    pub flags: NvmFlags,
    pub len: NvmSize,
    pub label: Bytes,
}

impl GetMetadataResponse {
    pub const FIXED_LEN: usize = 14;

    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), WireError> {
        check_label(&self.label)?;
        buf.put_i32_le(self.rc.0);
        buf.put_u16_le(self.id);
        buf.put_u16_le(self.access);
        buf.put_u16_le(self.flags);
        buf.put_u16_le(self.len);
        buf.put_u16_le(self.label.len() as u16);
        buf.extend_from_slice(&self.label);
        Ok(())
    }

    pub fn decode(payload: &[u8]) -> Result<Self, WireError> {
        let mut cursor = payload;
        if cursor.len() < Self::FIXED_LEN {
            return Err(WireError::Malformed {
                what: "nvm get-metadata response",
                expected: Self::FIXED_LEN,
                actual: payload.len(),
            });
        }
        let rc = ServerRc(cursor.get_i32_le());
        let id = cursor.get_u16_le();
        let access = cursor.get_u16_le();
        let flags = cursor.get_u16_le();
        let len = cursor.get_u16_le();
        let label_len = cursor.get_u16_le() as usize;
        if label_len > LABEL_LEN {
            return Err(WireError::LabelTooLong {
                len: label_len,
                max: LABEL_LEN,
            });
        }
        if cursor.len() != label_len {
            return Err(WireError::Malformed {
                what: "nvm get-metadata response",
                expected: Self::FIXED_LEN + label_len,
                actual: payload.len(),
            });
        }
        Ok(Self {
            rc,
            id,
            access,
            flags,
            len,
            label: Bytes::copy_from_slice(cursor),
        })
    }
}

/// Bulk removal of objects by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestroyObjectsRequest {
    pub ids: Vec<NvmId>,
}

impl DestroyObjectsRequest {
    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), WireError> {
        if self.ids.len() > DESTROY_MAX_IDS {
            return Err(WireError::TooManyIds {
                count: self.ids.len(),
                max: DESTROY_MAX_IDS,
            });
        }
        buf.reserve(2 + self.ids.len() * 2);
        buf.put_u16_le(self.ids.len() as u16);
        for &id in &self.ids {
            buf.put_u16_le(id);
        }
        Ok(())
    }

    pub fn decode(payload: &[u8]) -> Result<Self, WireError> {
        let mut cursor = payload;
        if cursor.len() < 2 {
            return Err(WireError::Malformed {
                what: "nvm destroy request",
                expected: 2,
                actual: payload.len(),
            });
        }
        let count = cursor.get_u16_le() as usize;
        if count > DESTROY_MAX_IDS {
            return Err(WireError::TooManyIds {
                count,
                max: DESTROY_MAX_IDS,
            });
        }
        if cursor.len() != count * 2 {
            return Err(WireError::Malformed {
                what: "nvm destroy request",
                expected: 2 + count * 2,
                actual: payload.len(),
            });
        }
        let mut ids = Vec::with_capacity(count);
        for _ in 0..count {
            ids.push(cursor.get_u16_le());
        }
        Ok(Self { ids })
    }
}

/// Inline read request: bytes come back in the response payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadRequest {
    pub id: NvmId,
    pub offset: NvmSize,
    pub data_len: NvmSize,
}

impl ReadRequest {
    pub const WIRE_LEN: usize = 6;

    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), WireError> {
        if self.data_len as usize > READ_MAX {
            return Err(WireError::PayloadTooLarge {
                size: self.data_len as usize,
                max: READ_MAX,
            });
        }
        buf.put_u16_le(self.id);
        buf.put_u16_le(self.offset);
        buf.put_u16_le(self.data_len);
        Ok(())
    }

    pub fn decode(mut payload: &[u8]) -> Result<Self, WireError> {
        if payload.len() != Self::WIRE_LEN {
            return Err(WireError::Malformed {
                what: "nvm read request",
                expected: Self::WIRE_LEN,
                actual: payload.len(),
            });
        }
        Ok(Self {
            id: payload.get_u16_le(),
            offset: payload.get_u16_le(),
            data_len: payload.get_u16_le(),
        })
    }
}

/// Inline read response: result code plus the bytes read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadResponse {
    pub rc: ServerRc,
    pub data: Bytes,
}

impl ReadResponse {
    pub const FIXED_LEN: usize = 6;

    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), WireError> {
        if self.data.len() > READ_MAX {
            return Err(WireError::PayloadTooLarge {
                size: self.data.len(),
                max: READ_MAX,
            });
        }
        buf.put_i32_le(self.rc.0);
        buf.put_u16_le(self.data.len() as u16);
        buf.extend_from_slice(&self.data);
        Ok(())
    }

    pub fn decode(payload: &[u8]) -> Result<Self, WireError> {
        let mut cursor = payload;
        if cursor.len() < Self::FIXED_LEN {
            return Err(WireError::Malformed {
                what: "nvm read response",
                expected: Self::FIXED_LEN,
                actual: payload.len(),
            });
        }
        let rc = ServerRc(cursor.get_i32_le());
        let len = cursor.get_u16_le() as usize;
        if cursor.len() != len {
            return Err(WireError::Malformed {
                what: "nvm read response",
                expected: Self::FIXED_LEN + len,
                actual: payload.len(),
            });
        }
        Ok(Self {
            rc,
            data: Bytes::copy_from_slice(cursor),
        })
    }
}

/// DMA add: metadata and data are passed by host address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddObjectDmaRequest {
    pub metadata: DmaAddr,
    pub data: DmaBuffer,
}

impl AddObjectDmaRequest {
    /// Pick the request action for this address width. Both references
    /// must use the same width.
    pub fn action(&self) -> Result<u16, WireError> {
        match (self.metadata.is_32(), self.data.addr.is_32()) {
            (true, true) => Ok(action::ADD_OBJECT_DMA32_REQUEST),
            (false, false) => Ok(action::ADD_OBJECT_DMA64_REQUEST),
            _ => Err(WireError::DmaWidthMismatch),
        }
    }

    pub fn encode(&self, buf: &mut BytesMut) -> Result<(), WireError> {
        self.action()?;
        self.metadata.put(buf);
        buf.put_u16_le(self.data.len);
        self.data.addr.put(buf);
        Ok(())
    }

    pub fn decode32(mut payload: &[u8]) -> Result<Self, WireError> {
        if payload.len() != 10 {
            return Err(WireError::Malformed {
                what: "nvm add-dma32 request",
                expected: 10,
                actual: payload.len(),
            });
        }
        let metadata = DmaAddr::Addr32(payload.get_u32_le());
        let len = payload.get_u16_le();
        let addr = DmaAddr::Addr32(payload.get_u32_le());
        Ok(Self {
            metadata,
            data: DmaBuffer { addr, len },
        })
    }

    pub fn decode64(mut payload: &[u8]) -> Result<Self, WireError> {
        if payload.len() != 18 {
            return Err(WireError::Malformed {
                what: "nvm add-dma64 request",
                expected: 18,
                actual: payload.len(),
            });
        }
        let metadata = DmaAddr::Addr64(payload.get_u64_le());
        let len = payload.get_u16_le();
        let addr = DmaAddr::Addr64(payload.get_u64_le());
        Ok(Self {
            metadata,
            data: DmaBuffer { addr, len },
        })
    }
}

/// DMA read: the server writes directly into the caller's buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadDmaRequest {
    pub id: NvmId,
    pub offset: NvmSize,
    pub data: DmaBuffer,
}

impl ReadDmaRequest {
    pub fn action(&self) -> u16 {
        if self.data.addr.is_32() {
            action::READ_DMA32_REQUEST
        } else {
            action::READ_DMA64_REQUEST
        }
    }

    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_u16_le(self.id);
        buf.put_u16_le(self.offset);
        buf.put_u16_le(self.data.len);
        self.data.addr.put(buf);
    }

    pub fn decode32(mut payload: &[u8]) -> Result<Self, WireError> {
        if payload.len() != 10 {
            return Err(WireError::Malformed {
                what: "nvm read-dma32 request",
                expected: 10,
                actual: payload.len(),
            });
        }
        let id = payload.get_u16_le();
        let offset = payload.get_u16_le();
        let len = payload.get_u16_le();
        let addr = DmaAddr::Addr32(payload.get_u32_le());
        Ok(Self {
            id,
            offset,
            data: DmaBuffer { addr, len },
        })
    }

    pub fn decode64(mut payload: &[u8]) -> Result<Self, WireError> {
        if payload.len() != 14 {
            return Err(WireError::Malformed {
                what: "nvm read-dma64 request",
                expected: 14,
                actual: payload.len(),
            });
        }
        let id = payload.get_u16_le();
        let offset = payload.get_u16_le();
        let len = payload.get_u16_le();
        let addr = DmaAddr::Addr64(payload.get_u64_le());
        Ok(Self {
            id,
            offset,
            data: DmaBuffer { addr, len },
        })
    }
}

/// DMA read response: result code and the number of bytes the server
/// wrote into the caller's buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadDmaResponse {
    pub rc: ServerRc,
    pub len: NvmSize,
}

impl ReadDmaResponse {
    pub const WIRE_LEN: usize = 6;

    pub fn encode(&self, buf: &mut BytesMut) {
        buf.put_i32_le(self.rc.0);
        buf.put_u16_le(self.len);
    }

    pub fn decode(mut payload: &[u8]) -> Result<Self, WireError> {
        if payload.len() != Self::WIRE_LEN {
            return Err(WireError::Malformed {
                what: "nvm read-dma response",
                expected: Self::WIRE_LEN,
                actual: payload.len(),
            });
        }
        Ok(Self {
            rc: ServerRc(payload.get_i32_le()),
            len: payload.get_u16_le(),
        })
    }
}
