//! Server tuning knobs.

use serde::{Deserialize, Serialize};
use std::time::Duration;

fn default_max_header_bytes() -> usize {
    8 * 1024
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}

fn default_read_timeout_ms() -> u64 {
    30_000
}

fn default_keep_alive_timeout_ms() -> u64 {
    60_000
}

fn default_write_timeout_ms() -> u64 {
    30_000
}

/// Per-server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port to listen on; 0 picks an ephemeral port.
    pub port: u16,
    /// Cap on the request line plus headers. Oversize requests are
    /// answered with 413 and closed.
    #[serde(default = "default_max_header_bytes")]
    pub max_header_bytes: usize,
    /// Cap on a request body (declared or chunked).
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Idle deadline while reading a started request.
    #[serde(default = "default_read_timeout_ms")]
    pub read_timeout_ms: u64,
    /// Idle deadline while waiting for the next request on a kept-alive
    /// connection.
    #[serde(default = "default_keep_alive_timeout_ms")]
    pub keep_alive_timeout_ms: u64,
    /// Deadline for flushing a response.
    #[serde(default = "default_write_timeout_ms")]
    pub write_timeout_ms: u64,
}

impl ServerConfig {
    /// Configuration for a port with default limits.
    #[must_use]
    pub fn for_port(port: u16) -> Self {
        Self {
            port,
            max_header_bytes: default_max_header_bytes(),
            max_body_bytes: default_max_body_bytes(),
            read_timeout_ms: default_read_timeout_ms(),
            keep_alive_timeout_ms: default_keep_alive_timeout_ms(),
            write_timeout_ms: default_write_timeout_ms(),
        }
    }

    pub(crate) fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub(crate) fn keep_alive_timeout(&self) -> Duration {
        Duration::from_millis(self.keep_alive_timeout_ms)
    }

    pub(crate) fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_in() {
        let config: ServerConfig = serde_json::from_str(r#"{"port": 8080}"#).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.max_header_bytes, 8 * 1024);
        assert_eq!(config.max_body_bytes, 1024 * 1024);
    }
}
