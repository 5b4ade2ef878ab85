use std::time::Duration;

use bytes::{Bytes, BytesMut};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::{CommError, Error, Result};
use crate::message::codec::MessageCodec;
use crate::message::{response_action, Group, Message};

use super::ClientConfig;

/// The request the correlator is waiting on: sequence id plus the kind
/// (group, action) it was sent under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Outstanding {
    seq: u16,
    group: Group,
    action: u16,
}

/// Request/response session over any `AsyncRead + AsyncWrite` transport.
///
/// Owns the transport handle, the wrapping 16-bit sequence counter, and
/// the correlator state. The protocol carries no multiplexing: exactly one
/// request may be in flight, and the next inbound message must answer it.
#[derive(Debug)]
pub struct CommSession<T> {
    transport: T,
    codec: MessageCodec,
    read_buf: BytesMut,
    send_seq: u16,
    outstanding: Option<Outstanding>,
    recv_timeout: Option<Duration>,
}

impl<T: AsyncRead + AsyncWrite + Unpin> CommSession<T> {
    pub fn new(transport: T, config: &ClientConfig) -> Self {
        Self {
            transport,
            codec: MessageCodec::new(),
            read_buf: BytesMut::new(),
            send_seq: 0,
            outstanding: None,
            recv_timeout: config.recv_timeout,
        }
    }

    /// Encode and send one request, recording it as outstanding.
    ///
    /// Fails with [`CommError::RequestOutstanding`] if the previous request
    /// has not been answered or abandoned.
    pub async fn send_request(&mut self, group: Group, action: u16, payload: Bytes) -> Result<()> {
        if self.outstanding.is_some() {
            return Err(CommError::RequestOutstanding.into());
        }

        let seq = self.next_seq();
        let msg = Message::new(seq, group, action, payload)?;

        let mut buf = BytesMut::new();
        self.codec.encode(msg, &mut buf)?;
        self.transport.write_all(&buf).await.map_err(Error::Io)?;
        self.transport.flush().await.map_err(Error::Io)?;

        tracing::debug!(seq, ?group, action, size = buf.len(), "request sent");
        self.outstanding = Some(Outstanding { seq, group, action });
        Ok(())
    }

    /// Block until the response to the outstanding request arrives.
    ///
    /// Any message whose sequence id or kind does not match the outstanding
    /// request means the channel is desynchronized and yields
    /// [`CommError::UnexpectedResponse`]; a stale or foreign response is
    /// never silently accepted.
    pub async fn recv_response(&mut self) -> Result<Message> {
        let want = self
            .outstanding
            .ok_or(CommError::NoOutstandingRequest)?;

        let msg = match self.recv_timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.recv_message())
                .await
                .map_err(|_| {
                    Error::Io(std::io::Error::new(
                        std::io::ErrorKind::TimedOut,
                        "timed out waiting for response",
                    ))
                })??,
            None => self.recv_message().await?,
        };

        let header = msg.header;
        if header.seq != want.seq
            || header.group != want.group
            || header.action != response_action(want.action)
        {
            tracing::warn!(
                got_seq = header.seq,
                got_group = ?header.group,
                got_action = header.action,
                want_seq = want.seq,
                want_group = ?want.group,
                want_action = response_action(want.action),
                "response does not match outstanding request"
            );
            return Err(CommError::UnexpectedResponse {
                want_seq: want.seq,
                want_group: want.group as u16,
                want_action: response_action(want.action),
                got_seq: header.seq,
                got_group: header.group as u16,
                got_action: header.action,
            }
            .into());
        }

        tracing::debug!(seq = header.seq, ?header.group, header.action, "response accepted");
        self.outstanding = None;
        Ok(msg)
    }

    /// Send a request and block for its response payload.
    pub async fn transact(&mut self, group: Group, action: u16, payload: Bytes) -> Result<Bytes> {
        self.send_request(group, action, payload).await?;
        let msg = self.recv_response().await?;
        Ok(msg.payload)
    }

    /// Drop the outstanding request without waiting for its response.
    ///
    /// The next inbound message may then be the abandoned response; the
    /// correlator will reject it, so the channel should only be reused
    /// after a point where the server is known to be idle.
    pub fn abandon_request(&mut self) {
        if let Some(prev) = self.outstanding.take() {
            tracing::debug!(seq = prev.seq, ?prev.group, prev.action, "request abandoned");
        }
    }

    /// Shut down the write half of the transport.
    pub async fn shutdown(&mut self) -> Result<()> {
        self.transport.shutdown().await.map_err(Error::Io)
    }

    fn next_seq(&mut self) -> u16 {
        let seq = self.send_seq;
        self.send_seq = self.send_seq.wrapping_add(1);
        seq
    }

    async fn recv_message(&mut self) -> Result<Message> {
        loop {
            if let Some(msg) = self.codec.decode(&mut self.read_buf).map_err(Error::Wire)? {
                return Ok(msg);
            }
            let n = self
                .transport
                .read_buf(&mut self.read_buf)
                .await
                .map_err(Error::Io)?;
            if n == 0 {
                return Err(CommError::Closed.into());
            }
        }
    }
}
