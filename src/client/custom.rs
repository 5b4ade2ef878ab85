//! Custom-callback operations on [`ClientContext`].

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::Result;
use crate::message::custom::{
    self, CheckRegisteredRequest, CheckRegisteredResponse, InvokeRequest, InvokeResponse,
};
use crate::message::{Group, ServerRc};

use super::ClientContext;

/// Whether the server has a handler for a callback id.
///
/// `NotRegistered` is a valid response, not a transport failure; the
/// carried result code is normally `NO_HANDLER`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Registered,
    NotRegistered(ServerRc),
}

impl Registration {
    pub fn is_registered(self) -> bool {
        matches!(self, Self::Registered)
    }
}

impl<T: AsyncRead + AsyncWrite + Unpin> ClientContext<T> {
    /// Ask whether a user-defined callback is registered for `callback_id`.
    pub async fn custom_check_registered(&mut self, callback_id: u16) -> Result<Registration> {
        let mut buf = BytesMut::new();
        CheckRegisteredRequest { callback_id }.encode(&mut buf);
        let payload = self
            .session()
            .transact(
                Group::Custom,
                custom::action::CHECK_REGISTERED_REQUEST,
                buf.freeze(),
            )
            .await?;
        let resp = CheckRegisteredResponse::decode(&payload)?;
        if resp.rc.is_ok() {
            Ok(Registration::Registered)
        } else {
            Ok(Registration::NotRegistered(resp.rc))
        }
    }

    /// Invoke a registered callback with an opaque payload. The engine
    /// forwards the bytes without interpreting them.
    pub async fn custom_invoke(
        &mut self,
        callback_id: u16,
        payload: &[u8],
    ) -> Result<InvokeResponse> {
        let req = InvokeRequest {
            callback_id,
            payload: Bytes::copy_from_slice(payload),
        };
        let mut buf = BytesMut::new();
        req.encode(&mut buf)?;
        let payload = self
            .session()
            .transact(Group::Custom, custom::action::INVOKE_REQUEST, buf.freeze())
            .await?;
        Ok(InvokeResponse::decode(&payload)?)
    }
}
