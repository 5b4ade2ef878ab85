//! Key lifecycle operations on [`ClientContext`].
//!
//! A key enters the volatile cache via `key_cache`, then is either
//! persisted (`key_commit`), dropped from the cache (`key_evict`), or
//! destroyed outright (`key_erase`). Export retrieves label and material
//! without changing state.

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncWrite};
use zeroize::Zeroizing;

use crate::error::Result;
use crate::message::key::{
    self, CacheRequest, CacheResponse, ExportResponse, KeyId, KEY_ID_AUTO,
};
use crate::message::{decode_rc, Group, ServerRc};

use super::ClientContext;

impl<T: AsyncRead + AsyncWrite + Unpin> ClientContext<T> {
    /// Cache raw key material on the server, letting it assign the id.
    /// Flags are opaque bit values forwarded without interpretation.
    pub async fn key_cache(
        &mut self,
        flags: u32,
        label: &[u8],
        key: &[u8],
    ) -> Result<CacheResponse> {
        self.key_cache_at(flags, KEY_ID_AUTO, label, key).await
    }

    /// Cache raw key material under an explicit id.
    pub async fn key_cache_at(
        &mut self,
        flags: u32,
        key_id: KeyId,
        label: &[u8],
        key: &[u8],
    ) -> Result<CacheResponse> {
        let req = CacheRequest {
            flags,
            key_id,
            label: Bytes::copy_from_slice(label),
            key: Zeroizing::new(key.to_vec()),
        };
        let mut buf = BytesMut::new();
        req.encode(&mut buf)?;
        let payload = self
            .session()
            .transact(Group::Key, key::action::CACHE_REQUEST, buf.freeze())
            .await?;
        Ok(CacheResponse::decode(&payload)?)
    }

    /// Remove a key from the volatile cache without persisting it.
    pub async fn key_evict(&mut self, key_id: KeyId) -> Result<ServerRc> {
        let mut buf = BytesMut::new();
        key::encode_key_id(key_id, &mut buf);
        let payload = self
            .session()
            .transact(Group::Key, key::action::EVICT_REQUEST, buf.freeze())
            .await?;
        Ok(decode_rc("key evict response", &payload)?)
    }

    /// Persist a previously cached key. Committing an already-committed
    /// key succeeds again.
    pub async fn key_commit(&mut self, key_id: KeyId) -> Result<ServerRc> {
        let mut buf = BytesMut::new();
        key::encode_key_id(key_id, &mut buf);
        let payload = self
            .session()
            .transact(Group::Key, key::action::COMMIT_REQUEST, buf.freeze())
            .await?;
        Ok(decode_rc("key commit response", &payload)?)
    }

    /// Permanently destroy a key from any state. Later export, commit, or
    /// evict on the same id reports a not-found-class result code.
    pub async fn key_erase(&mut self, key_id: KeyId) -> Result<ServerRc> {
        let mut buf = BytesMut::new();
        key::encode_key_id(key_id, &mut buf);
        let payload = self
            .session()
            .transact(Group::Key, key::action::ERASE_REQUEST, buf.freeze())
            .await?;
        Ok(decode_rc("key erase response", &payload)?)
    }

    /// Retrieve the label and raw key bytes for a cached or committed key.
    pub async fn key_export(&mut self, key_id: KeyId) -> Result<ExportResponse> {
        let mut buf = BytesMut::new();
        key::encode_key_id(key_id, &mut buf);
        let payload = self
            .session()
            .transact(Group::Key, key::action::EXPORT_REQUEST, buf.freeze())
            .await?;
        Ok(ExportResponse::decode(&payload)?)
    }
}
