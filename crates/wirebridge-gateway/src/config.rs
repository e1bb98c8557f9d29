use wirebridge_frame::DEFAULT_MAX_PAYLOAD;

/// Default TCP port the gateway listens on.
pub const DEFAULT_PORT: u16 = 12345;

/// Default bind address. The gateway is a process-local bridge, so it binds
/// loopback unless told otherwise.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Startup configuration for a [`Gateway`](crate::Gateway).
///
/// Resolved by the composition root; the core never reads raw config text.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Address to bind the listening socket on.
    pub host: String,
    /// TCP port to listen on. Port 0 requests an ephemeral port.
    pub port: u16,
    /// Maximum inbound/outbound frame payload size in bytes.
    pub max_payload_size: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            max_payload_size: DEFAULT_MAX_PAYLOAD,
        }
    }
}

impl GatewayConfig {
    /// Default configuration (loopback, port 12345, 16 MiB frames).
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the bind address.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Override the listening port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Override the maximum frame payload size.
    pub fn with_max_payload_size(mut self, max_payload_size: usize) -> Self {
        self.max_payload_size = max_payload_size;
        self
    }
}
