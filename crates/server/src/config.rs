use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use frederick_http::protocol::Limits;
use serde::Deserialize;

use crate::server::ServerError;

/// Listener and per-connection settings.
///
/// Every field has a default, so a configuration file only needs to name what it changes:
///
/// ```
/// use frederick_server::ServerConfig;
///
/// let config = ServerConfig::from_json(r#"{ "port": 9000, "idle_timeout_secs": 5 }"#).unwrap();
/// assert_eq!(config.port, 9000);
/// assert_eq!(config.address, "127.0.0.1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// IP address to bind, IPv4 or IPv6 literal.
    pub address: String,
    pub port: u16,
    /// Pending connections the kernel queues before `accept`.
    pub backlog: u32,
    /// Seconds a connection may stay silent, between requests and while a request is read.
    pub idle_timeout_secs: u64,
    pub max_line_size: usize,
    pub max_headers: usize,
    pub max_body_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_owned(),
            port: 8080,
            backlog: 1024,
            idle_timeout_secs: 30,
            max_line_size: Limits::DEFAULT_MAX_LINE_SIZE,
            max_headers: Limits::DEFAULT_MAX_HEADERS,
            max_body_size: Limits::DEFAULT_MAX_BODY_SIZE,
        }
    }
}

impl ServerConfig {
    pub fn from_json(json: &str) -> Result<Self, ServerError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ServerError> {
        let ip = self
            .address
            .parse::<IpAddr>()
            .map_err(|_e| ServerError::InvalidAddress { address: self.address.clone() })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Parser limits for every connection; reading a request may take as long as the idle timeout.
    pub fn limits(&self) -> Limits {
        Limits {
            max_line_size: self.max_line_size,
            max_headers: self.max_headers,
            max_body_size: self.max_body_size,
            read_timeout: self.idle_timeout(),
        }
    }
}
