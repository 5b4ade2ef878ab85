pub mod comm;

use std::time::Duration;

use crate::error::Error;

/// Configuration for a client connection to the secure module.
#[non_exhaustive]
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Identifier this client announces during comm init.
    pub client_id: u32,

    /// Optional bound on how long to wait for any single response.
    /// Elapsing surfaces as a transport error; the engine never retries.
    pub recv_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            client_id: 1,
            recv_timeout: None,
        }
    }
}

impl ClientConfig {
    /// Create a builder for constructing a `ClientConfig`.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Builder for [`ClientConfig`].
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    client_id: u32,
    recv_timeout: Option<Duration>,
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        let defaults = ClientConfig::default();
        Self {
            client_id: defaults.client_id,
            recv_timeout: defaults.recv_timeout,
        }
    }
}

impl ClientConfigBuilder {
    pub fn client_id(mut self, client_id: u32) -> Self {
        self.client_id = client_id;
        self
    }

    pub fn recv_timeout(mut self, timeout: Duration) -> Self {
        self.recv_timeout = Some(timeout);
        self
    }

    /// Build the `ClientConfig`, validating that all values are sensible.
    pub fn build(self) -> Result<ClientConfig, Error> {
        if self.client_id == 0 {
            return Err(Error::InvalidConfig("client_id must be nonzero"));
        }
        if let Some(t) = self.recv_timeout {
            if t.is_zero() {
                return Err(Error::InvalidConfig("recv_timeout must be nonzero"));
            }
        }
        Ok(ClientConfig {
            client_id: self.client_id,
            recv_timeout: self.recv_timeout,
        })
    }
}
