/// TCP transport helpers (connect, listen, accept).
#[cfg(feature = "tcp")]
pub mod tcp;

/// Unix-domain-socket transport for same-host trusted domains.
#[cfg(all(feature = "uds", unix))]
pub mod uds;
