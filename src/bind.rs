//! Binding server-resident keys into local crypto structures.
//!
//! Crypto-primitive structures (elliptic-curve, RSA, symmetric) live in an
//! external library; the engine only writes the offload key id into them
//! and never reads or computes with key material. A structure carrying a
//! bound id routes its later crypto calls to the secure module instead of
//! computing locally.

use crate::message::key::KeyId;

/// A crypto structure exposing a settable offload-key-id field.
///
/// Implement this for the external library's key types. The engine treats
/// the structure as an opaque capability; nothing beyond this one field is
/// touched.
pub trait OffloadKeySlot {
    fn set_offload_key_id(&mut self, key_id: KeyId);
}

/// Store `key_id` in the structure's offload slot.
///
/// Purely local: no wire traffic and no failure mode.
pub fn bind_offload_key<K: OffloadKeySlot + ?Sized>(structure: &mut K, key_id: KeyId) {
    structure.set_offload_key_id(key_id);
}
