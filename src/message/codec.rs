use bytes::BytesMut;
use tokio_util::codec::{Decoder, Encoder};

use super::{Header, Message, HEADER_SIZE};
use crate::error::WireError;

/// Stream codec for framing envelope messages over a byte transport.
#[derive(Debug, Default)]
pub struct MessageCodec {
    /// Cached header from a partial decode.
    current_header: Option<Header>,
}

impl MessageCodec {
    pub fn new() -> Self {
        Self {
            current_header: None,
        }
    }
}

impl Decoder for MessageCodec {
    type Item = Message;
    type Error = WireError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // Parse header if we don't have one cached.
        let header = match self.current_header.take() {
            Some(h) => h,
            None => match Header::decode(src)? {
                Some(h) => h,
                None => return Ok(None),
            },
        };

        // Wait for the full payload.
        let size = header.size as usize;
        if src.len() < size {
            src.reserve(size - src.len());
            self.current_header = Some(header);
            return Ok(None);
        }

        let payload = src.split_to(size).freeze();

        Ok(Some(Message { header, payload }))
    }
}

impl Encoder<Message> for MessageCodec {
    type Error = WireError;

    fn encode(&mut self, msg: Message, dst: &mut BytesMut) -> Result<(), Self::Error> {
        dst.reserve(HEADER_SIZE + msg.payload.len());
        msg.header.encode(dst);
        dst.extend_from_slice(&msg.payload);
        Ok(())
    }
}
