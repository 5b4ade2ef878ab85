use std::io;

/// Errors from message encoding and decoding.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("unknown protocol group: 0x{0:04X}")]
    UnknownGroup(u16),

    #[error("malformed {what} payload: expected {expected} bytes, got {actual}")]
    Malformed {
        what: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("label too long: {len} bytes (max {max})")]
    LabelTooLong { len: usize, max: usize },

    #[error("payload too large for inline transfer: {size} bytes (max {max}); use a DMA variant")]
    PayloadTooLarge { size: usize, max: usize },

    #[error("too many object ids in one request: {count} (max {max})")]
    TooManyIds { count: usize, max: usize },

    #[error("DMA address width mismatch between buffer references")]
    DmaWidthMismatch,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Errors from the comm session and request/response correlation.
#[derive(Debug, thiserror::Error)]
pub enum CommError {
    #[error(
        "unexpected response: got seq {got_seq} kind (0x{got_group:04X}, 0x{got_action:04X}), \
         outstanding request seq {want_seq} kind (0x{want_group:04X}, 0x{want_action:04X})"
    )]
    UnexpectedResponse {
        want_seq: u16,
        want_group: u16,
        want_action: u16,
        got_seq: u16,
        got_group: u16,
        got_action: u16,
    },

    #[error("a request is already outstanding on this context")]
    RequestOutstanding,

    #[error("no request outstanding")]
    NoOutstandingRequest,

    #[error("transport closed by peer")]
    Closed,
}

/// Top-level error type for the crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Wire(#[from] WireError),

    #[error(transparent)]
    Comm(#[from] CommError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),

    #[error("transport error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
