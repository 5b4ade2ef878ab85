//! NVM object operations on [`ClientContext`].

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::Result;
use crate::message::nvm::{
    self, AddObjectDmaRequest, AddObjectRequest, DestroyObjectsRequest, DmaAddr, DmaBuffer,
    GetAvailableResponse, GetMetadataResponse, InitResponse, ListRequest, ListResponse,
    NvmAccess, NvmFlags, NvmId, NvmMetadata, NvmSize, ReadDmaRequest, ReadDmaResponse,
    ReadRequest, ReadResponse,
};
use crate::message::{decode_rc, response_action, Group, ServerRc};

use super::ClientContext;

impl<T: AsyncRead + AsyncWrite + Unpin> ClientContext<T> {
    /// Initialize the server's object store for this client.
    pub async fn nvm_init(&mut self) -> Result<InitResponse> {
        let payload = self
            .session()
            .transact(Group::Nvm, nvm::action::INIT_REQUEST, Bytes::new())
            .await?;
        Ok(InitResponse::decode(&payload)?)
    }

    /// Release the server-side object store association.
    pub async fn nvm_cleanup(&mut self) -> Result<ServerRc> {
        let payload = self
            .session()
            .transact(Group::Nvm, nvm::action::CLEANUP_REQUEST, Bytes::new())
            .await?;
        Ok(decode_rc("nvm cleanup response", &payload)?)
    }

    /// Query free and reclaimable space in the object store.
    pub async fn nvm_get_available(&mut self) -> Result<GetAvailableResponse> {
        let payload = self
            .session()
            .transact(Group::Nvm, nvm::action::GET_AVAILABLE_REQUEST, Bytes::new())
            .await?;
        Ok(GetAvailableResponse::decode(&payload)?)
    }

    /// Create an object with inline data. A non-`OK` result code means the
    /// object was not created; partial writes are not a client-visible
    /// state.
    pub async fn nvm_add_object(
        &mut self,
        id: NvmId,
        access: NvmAccess,
        flags: NvmFlags,
        label: &[u8],
        data: &[u8],
    ) -> Result<ServerRc> {
        let req = AddObjectRequest {
            id,
            access,
            flags,
            label: Bytes::copy_from_slice(label),
            data: Bytes::copy_from_slice(data),
        };
        let mut buf = BytesMut::new();
        req.encode(&mut buf)?;
        let payload = self
            .session()
            .transact(Group::Nvm, nvm::action::ADD_OBJECT_REQUEST, buf.freeze())
            .await?;
        Ok(decode_rc("nvm add response", &payload)?)
    }

    /// List matching objects starting after `start_id`.
    ///
    /// One call returns the count of matches and a single next id; repeat
    /// with the returned id as the new start to enumerate the store, until
    /// the count reaches zero.
    pub async fn nvm_list(
        &mut self,
        access: NvmAccess,
        flags: NvmFlags,
        start_id: NvmId,
    ) -> Result<ListResponse> {
        let mut buf = BytesMut::new();
        ListRequest {
            access,
            flags,
            start_id,
        }
        .encode(&mut buf);
        let payload = self
            .session()
            .transact(Group::Nvm, nvm::action::LIST_REQUEST, buf.freeze())
            .await?;
        Ok(ListResponse::decode(&payload)?)
    }

    /// Fetch one object's metadata without transferring its data.
    pub async fn nvm_get_metadata(&mut self, id: NvmId) -> Result<GetMetadataResponse> {
        let mut buf = BytesMut::new();
        nvm::encode_object_id(id, &mut buf);
        let payload = self
            .session()
            .transact(Group::Nvm, nvm::action::GET_METADATA_REQUEST, buf.freeze())
            .await?;
        Ok(GetMetadataResponse::decode(&payload)?)
    }

    /// Remove the listed objects in one request.
    ///
    /// Whether removal is all-or-nothing or best-effort on failure is the
    /// server's contract; the result code is the only indication, and no
    /// partial-success detail is available beyond it.
    pub async fn nvm_destroy_objects(&mut self, ids: &[NvmId]) -> Result<ServerRc> {
        let req = DestroyObjectsRequest { ids: ids.to_vec() };
        let mut buf = BytesMut::new();
        req.encode(&mut buf)?;
        let payload = self
            .session()
            .transact(Group::Nvm, nvm::action::DESTROY_OBJECTS_REQUEST, buf.freeze())
            .await?;
        Ok(decode_rc("nvm destroy response", &payload)?)
    }

    /// Read `data_len` bytes of an object starting at `offset`, inline.
    pub async fn nvm_read(
        &mut self,
        id: NvmId,
        offset: NvmSize,
        data_len: NvmSize,
    ) -> Result<ReadResponse> {
        let req = ReadRequest {
            id,
            offset,
            data_len,
        };
        let mut buf = BytesMut::new();
        req.encode(&mut buf)?;
        let payload = self
            .session()
            .transact(Group::Nvm, nvm::action::READ_REQUEST, buf.freeze())
            .await?;
        Ok(ReadResponse::decode(&payload)?)
    }

    /// Create an object whose metadata and data the server fetches
    /// directly from host memory. Both references must use the same
    /// address width.
    pub async fn nvm_add_object_dma(
        &mut self,
        metadata: DmaAddr,
        data: DmaBuffer,
    ) -> Result<ServerRc> {
        let req = AddObjectDmaRequest { metadata, data };
        let action = req.action()?;
        let mut buf = BytesMut::new();
        req.encode(&mut buf)?;
        let payload = self
            .session()
            .transact(Group::Nvm, action, buf.freeze())
            .await?;
        let what = if action == nvm::action::ADD_OBJECT_DMA32_REQUEST {
            "nvm add-dma32 response"
        } else {
            "nvm add-dma64 response"
        };
        Ok(decode_rc(what, &payload)?)
    }

    /// DMA add referencing local structures at the native pointer width.
    pub async fn nvm_add_object_dma_local(
        &mut self,
        metadata: &NvmMetadata,
        data: &[u8],
    ) -> Result<ServerRc> {
        let metadata_addr = DmaAddr::of_addr(metadata as *const NvmMetadata as usize);
        self.nvm_add_object_dma(metadata_addr, DmaBuffer::of_slice(data))
            .await
    }

    /// Read an object directly into host memory. The response carries the
    /// result code and the number of bytes the server wrote.
    pub async fn nvm_read_dma(
        &mut self,
        id: NvmId,
        offset: NvmSize,
        data: DmaBuffer,
    ) -> Result<ReadDmaResponse> {
        let req = ReadDmaRequest { id, offset, data };
        let action = req.action();
        let mut buf = BytesMut::new();
        req.encode(&mut buf);
        let payload = self
            .session()
            .transact(Group::Nvm, action, buf.freeze())
            .await?;
        Ok(ReadDmaResponse::decode(&payload)?)
    }

    /// DMA read into a local buffer referenced at the native pointer
    /// width.
    pub async fn nvm_read_dma_local(
        &mut self,
        id: NvmId,
        offset: NvmSize,
        buf: &mut [u8],
    ) -> Result<ReadDmaResponse> {
        let dma = DmaBuffer::of_slice(buf);
        self.nvm_read_dma(id, offset, dma).await
    }
}

// Response actions are always request + 1.
const _: () = {
    assert!(response_action(nvm::action::READ_REQUEST) == nvm::action::READ_RESPONSE);
    assert!(
        response_action(nvm::action::ADD_OBJECT_DMA64_REQUEST)
            == nvm::action::ADD_OBJECT_DMA64_RESPONSE
    );
};
