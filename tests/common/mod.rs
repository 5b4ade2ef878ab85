//! In-process mock secure module for integration tests.
//!
//! Serves the wire protocol over one end of a `tokio::io::duplex` pair,
//! backed by in-memory object and key stores. Tests can inspect and seed
//! the shared state through the handle.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, DuplexStream};
use tokio_util::codec::{Decoder, Encoder};

use secmod_client::message::codec::MessageCodec;
use secmod_client::message::key::{CacheRequest, CacheResponse, ExportResponse, KeyId};
use secmod_client::message::nvm::{
    AddObjectDmaRequest, AddObjectRequest, DestroyObjectsRequest, GetAvailableResponse,
    GetMetadataResponse, ListRequest, ListResponse, NvmAccess, NvmFlags, NvmId, ReadDmaRequest,
    ReadDmaResponse, ReadRequest, ReadResponse,
};
use secmod_client::message::{comm, custom, key, nvm};
use secmod_client::message::{encode_rc, Group, Header, Message, ServerRc};
use secmod_client::{ClientConfig, ClientContext};

pub const SERVER_ID: u32 = 0x5EED_0001;
pub const NVM_CAPACITY: u32 = 16384;
pub const MAX_OBJECTS: usize = 32;

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub access: NvmAccess,
    pub flags: NvmFlags,
    pub label: Vec<u8>,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct StoredKey {
    pub flags: u32,
    pub label: Vec<u8>,
    pub data: Vec<u8>,
    pub cached: bool,
    pub committed: bool,
}

#[derive(Debug, Default)]
pub struct HsmState {
    pub objects: BTreeMap<NvmId, StoredObject>,
    pub keys: BTreeMap<KeyId, StoredKey>,
    pub next_key_id: KeyId,
    pub callbacks: Vec<u16>,
    pub dma_adds: Vec<AddObjectDmaRequest>,
    pub dma_reads: Vec<ReadDmaRequest>,
}

pub struct MockHsm {
    pub state: Arc<Mutex<HsmState>>,
    pub handle: tokio::task::JoinHandle<()>,
}

impl MockHsm {
    pub fn spawn<T>(transport: T) -> Self
    where
        T: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let state = Arc::new(Mutex::new(HsmState {
            next_key_id: 7,
            ..HsmState::default()
        }));
        let served = Arc::clone(&state);
        let handle = tokio::spawn(async move {
            let mut transport = transport;
            if let Err(e) = serve(&mut transport, &served).await {
                panic!("mock hsm failed: {e}");
            }
        });
        Self { state, handle }
    }

    pub fn register_callback(&self, callback_id: u16) {
        self.state.lock().unwrap().callbacks.push(callback_id);
    }
}

/// Duplex pair + mock server + connected client, the setup every
/// integration test starts from.
pub async fn connect_client() -> (ClientContext<DuplexStream>, MockHsm) {
    let (client_io, server_io) = tokio::io::duplex(16384);
    let hsm = MockHsm::spawn(server_io);
    let client = ClientContext::connect(client_io, ClientConfig::default())
        .await
        .expect("client connect failed");
    (client, hsm)
}

async fn serve<T>(
    transport: &mut T,
    state: &Arc<Mutex<HsmState>>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    let mut codec = MessageCodec::new();
    let mut read_buf = BytesMut::new();

    loop {
        let msg = loop {
            if let Some(msg) = codec.decode(&mut read_buf)? {
                break msg;
            }
            let n = transport.read_buf(&mut read_buf).await?;
            if n == 0 {
                return Ok(());
            }
        };

        let closing =
            msg.header.group == Group::Comm && msg.header.action == comm::action::CLOSE_REQUEST;

        let payload = handle(state, &msg)?;
        let reply = Message::new(
            msg.header.seq,
            msg.header.group,
            msg.header.action + 1,
            payload.freeze(),
        )?;

        let mut out = BytesMut::new();
        codec.encode(reply, &mut out)?;
        transport.write_all(&out).await?;
        transport.flush().await?;

        if closing {
            return Ok(());
        }
    }
}

fn handle(
    state: &Arc<Mutex<HsmState>>,
    msg: &Message,
) -> Result<BytesMut, Box<dyn std::error::Error + Send + Sync>> {
    let Header { group, action, .. } = msg.header;
    let payload = &msg.payload[..];
    let mut state = state.lock().unwrap();
    let mut buf = BytesMut::new();

    match (group, action) {
        (Group::Comm, comm::action::INIT_REQUEST) => {
            let req = comm::InitRequest::decode(payload)?;
            comm::InitResponse {
                client_id: req.client_id,
                server_id: SERVER_ID,
            }
            .encode(&mut buf);
        }
        (Group::Comm, comm::action::CLOSE_REQUEST) => {}
        (Group::Comm, comm::action::ECHO_REQUEST) => {
            buf.extend_from_slice(payload);
        }

        (Group::Nvm, nvm::action::INIT_REQUEST) => {
            nvm::InitResponse {
                rc: ServerRc::OK,
                client_nvm_id: 1,
                server_nvm_id: 1,
            }
            .encode(&mut buf);
        }
        (Group::Nvm, nvm::action::CLEANUP_REQUEST) => {
            encode_rc(ServerRc::OK, &mut buf);
        }
        (Group::Nvm, nvm::action::GET_AVAILABLE_REQUEST) => {
            let used: u32 = state.objects.values().map(|o| o.data.len() as u32).sum();
            GetAvailableResponse {
                rc: ServerRc::OK,
                avail_size: NVM_CAPACITY.saturating_sub(used),
                avail_objects: (MAX_OBJECTS - state.objects.len()) as u16,
                reclaim_size: 0,
                reclaim_objects: 0,
            }
            .encode(&mut buf);
        }
        (Group::Nvm, nvm::action::ADD_OBJECT_REQUEST) => {
            let req = AddObjectRequest::decode(payload)?;
            let rc = if state.objects.len() >= MAX_OBJECTS {
                ServerRc::NO_SPACE
            } else {
                state.objects.insert(
                    req.id,
                    StoredObject {
                        access: req.access,
                        flags: req.flags,
                        label: req.label.to_vec(),
                        data: req.data.to_vec(),
                    },
                );
                ServerRc::OK
            };
            encode_rc(rc, &mut buf);
        }
        (Group::Nvm, nvm::action::LIST_REQUEST) => {
            let req = ListRequest::decode(payload)?;
            let matches: Vec<NvmId> = state
                .objects
                .iter()
                .filter(|(&id, obj)| {
                    id > req.start_id
                        && (req.access == 0 || obj.access & req.access != 0)
                        && (req.flags == 0 || obj.flags & req.flags != 0)
                })
                .map(|(&id, _)| id)
                .collect();
            ListResponse {
                rc: ServerRc::OK,
                count: matches.len() as u16,
                id: matches.first().copied().unwrap_or(0),
            }
            .encode(&mut buf);
        }
        (Group::Nvm, nvm::action::GET_METADATA_REQUEST) => {
            let id = nvm::decode_object_id("nvm get-metadata request", payload)?;
            let resp = match state.objects.get(&id) {
                Some(obj) => GetMetadataResponse {
                    rc: ServerRc::OK,
                    id,
                    access: obj.access,
                    flags: obj.flags,
                    len: obj.data.len() as u16,
                    label: bytes::Bytes::copy_from_slice(&obj.label),
                },
                None => GetMetadataResponse {
                    rc: ServerRc::NOT_FOUND,
                    id: 0,
                    access: 0,
                    flags: 0,
                    len: 0,
                    label: bytes::Bytes::new(),
                },
            };
            resp.encode(&mut buf)?;
        }
        (Group::Nvm, nvm::action::DESTROY_OBJECTS_REQUEST) => {
            let req = DestroyObjectsRequest::decode(payload)?;
            let mut rc = ServerRc::OK;
            for id in &req.ids {
                if state.objects.remove(id).is_none() {
                    rc = ServerRc::NOT_FOUND;
                }
            }
            encode_rc(rc, &mut buf);
        }
        (Group::Nvm, nvm::action::READ_REQUEST) => {
            let req = ReadRequest::decode(payload)?;
            let resp = match state.objects.get(&req.id) {
                Some(obj) => {
                    let start = req.offset as usize;
                    let end = start + req.data_len as usize;
                    if end > obj.data.len() {
                        ReadResponse {
                            rc: ServerRc::BAD_ARGS,
                            data: bytes::Bytes::new(),
                        }
                    } else {
                        ReadResponse {
                            rc: ServerRc::OK,
                            data: bytes::Bytes::copy_from_slice(&obj.data[start..end]),
                        }
                    }
                }
                None => ReadResponse {
                    rc: ServerRc::NOT_FOUND,
                    data: bytes::Bytes::new(),
                },
            };
            resp.encode(&mut buf)?;
        }
        (Group::Nvm, nvm::action::ADD_OBJECT_DMA32_REQUEST) => {
            let req = AddObjectDmaRequest::decode32(payload)?;
            state.dma_adds.push(req);
            encode_rc(ServerRc::OK, &mut buf);
        }
        (Group::Nvm, nvm::action::ADD_OBJECT_DMA64_REQUEST) => {
            let req = AddObjectDmaRequest::decode64(payload)?;
            state.dma_adds.push(req);
            encode_rc(ServerRc::OK, &mut buf);
        }
        (Group::Nvm, nvm::action::READ_DMA32_REQUEST) => {
            let req = ReadDmaRequest::decode32(payload)?;
            let len = req.data.len;
            state.dma_reads.push(req);
            ReadDmaResponse {
                rc: ServerRc::OK,
                len,
            }
            .encode(&mut buf);
        }
        (Group::Nvm, nvm::action::READ_DMA64_REQUEST) => {
            let req = ReadDmaRequest::decode64(payload)?;
            let len = req.data.len;
            state.dma_reads.push(req);
            ReadDmaResponse {
                rc: ServerRc::OK,
                len,
            }
            .encode(&mut buf);
        }

        (Group::Key, key::action::CACHE_REQUEST) => {
            let req = CacheRequest::decode(payload)?;
            let key_id = if req.key_id == key::KEY_ID_AUTO {
                let id = state.next_key_id;
                state.next_key_id += 1;
                id
            } else {
                req.key_id
            };
            state.keys.insert(
                key_id,
                StoredKey {
                    flags: req.flags,
                    label: req.label.to_vec(),
                    data: req.key.to_vec(),
                    cached: true,
                    committed: false,
                },
            );
            CacheResponse {
                rc: ServerRc::OK,
                key_id,
            }
            .encode(&mut buf);
        }
        (Group::Key, key::action::EVICT_REQUEST) => {
            let key_id = key::decode_key_id("key evict request", payload)?;
            let rc = match state.keys.get_mut(&key_id) {
                Some(k) if k.cached => {
                    k.cached = false;
                    ServerRc::OK
                }
                _ => ServerRc::NOT_FOUND,
            };
            // An evicted key with no committed copy is gone entirely.
            let prune = state
                .keys
                .get(&key_id)
                .is_some_and(|k| !k.cached && !k.committed);
            if prune {
                state.keys.remove(&key_id);
            }
            encode_rc(rc, &mut buf);
        }
        (Group::Key, key::action::COMMIT_REQUEST) => {
            let key_id = key::decode_key_id("key commit request", payload)?;
            let rc = match state.keys.get_mut(&key_id) {
                Some(k) => {
                    k.committed = true;
                    ServerRc::OK
                }
                None => ServerRc::NOT_FOUND,
            };
            encode_rc(rc, &mut buf);
        }
        (Group::Key, key::action::ERASE_REQUEST) => {
            let key_id = key::decode_key_id("key erase request", payload)?;
            let rc = match state.keys.remove(&key_id) {
                Some(_) => ServerRc::OK,
                None => ServerRc::NOT_FOUND,
            };
            encode_rc(rc, &mut buf);
        }
        (Group::Key, key::action::EXPORT_REQUEST) => {
            let key_id = key::decode_key_id("key export request", payload)?;
            let resp = match state.keys.get(&key_id) {
                Some(k) => ExportResponse {
                    rc: ServerRc::OK,
                    label: bytes::Bytes::copy_from_slice(&k.label),
                    key: zeroize::Zeroizing::new(k.data.clone()),
                },
                None => ExportResponse {
                    rc: ServerRc::NOT_FOUND,
                    label: bytes::Bytes::new(),
                    key: zeroize::Zeroizing::new(Vec::new()),
                },
            };
            resp.encode(&mut buf)?;
        }

        (Group::Custom, custom::action::CHECK_REGISTERED_REQUEST) => {
            let req = custom::CheckRegisteredRequest::decode(payload)?;
            let rc = if state.callbacks.contains(&req.callback_id) {
                ServerRc::OK
            } else {
                ServerRc::NO_HANDLER
            };
            custom::CheckRegisteredResponse {
                callback_id: req.callback_id,
                rc,
            }
            .encode(&mut buf);
        }
        (Group::Custom, custom::action::INVOKE_REQUEST) => {
            let req = custom::InvokeRequest::decode(payload)?;
            let resp = if state.callbacks.contains(&req.callback_id) {
                custom::InvokeResponse {
                    callback_id: req.callback_id,
                    err: ServerRc::OK,
                    payload: req.payload.clone(),
                }
            } else {
                custom::InvokeResponse {
                    callback_id: req.callback_id,
                    err: ServerRc::NO_HANDLER,
                    payload: bytes::Bytes::new(),
                }
            };
            resp.encode(&mut buf)?;
        }

        (group, action) => {
            return Err(format!("mock hsm: unhandled request ({group:?}, 0x{action:04X})").into());
        }
    }

    Ok(buf)
}
