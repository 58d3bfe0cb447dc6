//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::time::Duration;

/// Top-level application configuration.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// External address discovery settings.
    #[serde(default)]
    pub discovery: DiscoveryConfig,
    /// Request log settings.
    #[serde(default)]
    pub log: LogConfig,
}

/// Server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Read size used when streaming file bodies, in bytes.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Operator-facing base address used when printing links.
    /// A trailing '/' suppresses the port number.
    #[serde(default)]
    pub public_address: Option<String>,
}

fn default_bind() -> String {
    "0.0.0.0:8000".to_string()
}

fn default_chunk_size() -> usize {
    crate::STREAM_CHUNK_SIZE
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            chunk_size: default_chunk_size(),
            public_address: None,
        }
    }
}

impl ServerConfig {
    /// Parse the bind address.
    pub fn bind_addr(&self) -> crate::Result<SocketAddr> {
        self.bind.parse().map_err(|e| {
            crate::Error::InvalidConfig(format!("invalid bind address {:?}: {e}", self.bind))
        })
    }

    /// Replace the port of the bind address, keeping the host.
    pub fn set_port(&mut self, port: u16) -> crate::Result<()> {
        let mut addr = self.bind_addr()?;
        addr.set_port(port);
        self.bind = addr.to_string();
        Ok(())
    }
}

/// External address discovery configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// STUN server queried by the `stun` command ("host:port").
    #[serde(default = "default_stun_server")]
    pub stun_server: String,
    /// How long to wait for a STUN response, in seconds.
    #[serde(default = "default_discovery_timeout_secs")]
    pub timeout_secs: u64,
    /// Run discovery once before the shell starts.
    #[serde(default)]
    pub on_startup: bool,
}

fn default_stun_server() -> String {
    "stun.l.google.com:19302".to_string()
}

fn default_discovery_timeout_secs() -> u64 {
    3
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            stun_server: default_stun_server(),
            timeout_secs: default_discovery_timeout_secs(),
            on_startup: false,
        }
    }
}

impl DiscoveryConfig {
    /// Get the discovery timeout as a Duration.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Request log configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogConfig {
    /// Number of request log lines retained (oldest evicted first).
    #[serde(default = "default_log_capacity")]
    pub capacity: usize,
}

fn default_log_capacity() -> usize {
    crate::DEFAULT_LOG_CAPACITY
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            capacity: default_log_capacity(),
        }
    }
}

impl AppConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> crate::Result<()> {
        self.server.bind_addr()?;
        if self.server.chunk_size == 0 {
            return Err(crate::Error::InvalidConfig(
                "server.chunk_size must be greater than 0".to_string(),
            ));
        }
        if self.log.capacity == 0 {
            return Err(crate::Error::InvalidConfig(
                "log.capacity must be greater than 0".to_string(),
            ));
        }
        if self.discovery.stun_server.trim().is_empty() {
            return Err(crate::Error::InvalidConfig(
                "discovery.stun_server must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Configuration suitable for tests: loopback bind on an ephemeral port.
    pub fn for_testing() -> Self {
        Self {
            server: ServerConfig {
                bind: "127.0.0.1:0".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.bind, "0.0.0.0:8000");
        assert_eq!(config.server.chunk_size, 16 * 1024);
        assert_eq!(config.log.capacity, 100);
    }

    #[test]
    fn zero_chunk_size_is_rejected() {
        let mut config = AppConfig::default();
        config.server.chunk_size = 0;
        assert!(matches!(
            config.validate(),
            Err(crate::Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn zero_log_capacity_is_rejected() {
        let mut config = AppConfig::default();
        config.log.capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn bad_bind_is_rejected() {
        let mut config = AppConfig::default();
        config.server.bind = "not-an-address".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn set_port_keeps_host() {
        let mut server = ServerConfig {
            bind: "127.0.0.1:8000".to_string(),
            ..Default::default()
        };
        server.set_port(9090).unwrap();
        assert_eq!(server.bind, "127.0.0.1:9090");
    }
}
