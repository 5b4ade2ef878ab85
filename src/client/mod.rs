mod custom;
mod key;
mod nvm;

pub use custom::Registration;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::error::Result;
use crate::message::{comm, decode_empty, Group};
use crate::session::comm::CommSession;
use crate::session::ClientConfig;

/// One connection to the secure module.
///
/// Every operation is strictly encode, send, block for the response,
/// validate correlation, decode. The `&mut self` receiver enforces the
/// one-outstanding-request invariant at compile time; a context shared
/// across threads must be serialized externally.
#[derive(Debug)]
pub struct ClientContext<T> {
    session: CommSession<T>,
    client_id: u32,
    server_id: u32,
}

impl<T: AsyncRead + AsyncWrite + Unpin> ClientContext<T> {
    /// Open a context over the given transport and perform the comm-init
    /// exchange.
    pub async fn connect(transport: T, config: ClientConfig) -> Result<Self> {
        let mut session = CommSession::new(transport, &config);

        let mut buf = BytesMut::new();
        comm::InitRequest {
            client_id: config.client_id,
        }
        .encode(&mut buf);
        let payload = session
            .transact(Group::Comm, comm::action::INIT_REQUEST, buf.freeze())
            .await?;
        let resp = comm::InitResponse::decode(&payload)?;

        tracing::debug!(
            client_id = resp.client_id,
            server_id = resp.server_id,
            "comm session established"
        );

        Ok(Self {
            session,
            client_id: resp.client_id,
            server_id: resp.server_id,
        })
    }

    /// Client id confirmed by the server at init.
    pub fn client_id(&self) -> u32 {
        self.client_id
    }

    /// Server id reported at init.
    pub fn server_id(&self) -> u32 {
        self.server_id
    }

    /// Round-trip opaque bytes through the server.
    pub async fn echo(&mut self, data: &[u8]) -> Result<Bytes> {
        let payload = self
            .session
            .transact(
                Group::Comm,
                comm::action::ECHO_REQUEST,
                Bytes::copy_from_slice(data),
            )
            .await?;
        Ok(payload)
    }

    /// Drop the outstanding request without waiting for its response.
    pub fn abandon_request(&mut self) {
        self.session.abandon_request();
    }

    /// Send the comm-close request and release the transport.
    pub async fn close(mut self) -> Result<()> {
        let payload = self
            .session
            .transact(Group::Comm, comm::action::CLOSE_REQUEST, Bytes::new())
            .await?;
        decode_empty("comm close response", &payload)?;
        self.session.shutdown().await?;
        tracing::debug!("comm session closed");
        Ok(())
    }

    pub(crate) fn session(&mut self) -> &mut CommSession<T> {
        &mut self.session
    }
}
