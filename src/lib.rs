pub mod bind;
pub mod client;
pub mod error;
pub mod message;
pub mod session;
pub mod transport;

// Re-export key types at crate root for convenience.
pub use bind::{bind_offload_key, OffloadKeySlot};
pub use client::{ClientContext, Registration};
pub use error::{CommError, Error, Result, WireError};
pub use message::key::{KeyId, KEY_ID_AUTO};
pub use message::nvm::{DmaAddr, DmaBuffer, NvmAccess, NvmFlags, NvmId, NvmMetadata, NvmSize};
pub use message::{Group, Message, ServerRc, DATA_LEN, LABEL_LEN};
pub use session::ClientConfig;
