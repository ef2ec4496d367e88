//! Server configuration.

use std::net::SocketAddr;

/// Default max body size for query requests (64 KB).
pub const DEFAULT_MAX_BODY_SIZE: usize = 64 * 1024;

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server to.
    pub bind_address: SocketAddr,

    /// Maximum request body size in bytes. Larger bodies get 413.
    pub max_body_size: usize,

    /// CORS allowed origins (empty = no CORS, `"*"` = any origin).
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 8080)),
            max_body_size: DEFAULT_MAX_BODY_SIZE,
            cors_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the bind address.
    pub fn with_bind_address(mut self, addr: SocketAddr) -> Self {
        self.bind_address = addr;
        self
    }

    /// Set the maximum request body size.
    pub fn with_max_body_size(mut self, size: usize) -> Self {
        self.max_body_size = size;
        self
    }

    /// Set CORS allowed origins.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = origins;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_builder() {
        let config = ServerConfig::new()
            .with_bind_address("0.0.0.0:9000".parse().unwrap())
            .with_max_body_size(1024)
            .with_cors_origins(vec!["http://localhost:3000".to_string()]);

        assert_eq!(config.bind_address.port(), 9000);
        assert_eq!(config.max_body_size, 1024);
        assert_eq!(config.cors_origins.len(), 1);
    }
}
