//! Operator-facing base address used to print share links.

use crate::index::encode_name;
use crate::secret::Secret;
use std::net::IpAddr;

const LOCALHOST: &str = "http://localhost";

/// Base address and port printed in links handed to clients.
///
/// The address never affects request handling; it only formats URLs for the
/// operator. A base ending in `/` is used verbatim (for reverse proxies) and
/// suppresses the port.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OperatorAddress {
    base: String,
    port: u16,
}

impl OperatorAddress {
    /// Localhost address for the given listening port.
    pub fn localhost(port: u16) -> Self {
        Self {
            base: LOCALHOST.to_string(),
            port,
        }
    }

    /// Current base, e.g. `http://203.0.113.7`.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Listening port appended to the base.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Replace the base with an operator-supplied value.
    pub fn set(&mut self, base: impl Into<String>) {
        self.base = base.into();
    }

    /// Apply a discovery result; `None` falls back to localhost.
    pub fn set_discovered(&mut self, ip: Option<IpAddr>) {
        self.base = match ip {
            Some(IpAddr::V6(ip)) => format!("http://[{ip}]"),
            Some(IpAddr::V4(ip)) => format!("http://{ip}"),
            None => LOCALHOST.to_string(),
        };
    }

    /// URL of the share root (the directory index).
    pub fn share_root(&self, secret: &Secret) -> String {
        if self.base.ends_with('/') {
            format!("{}{}/", self.base, secret)
        } else {
            format!("{}:{}/{}/", self.base, self.port, secret)
        }
    }

    /// Direct link to a shared file.
    pub fn link(&self, secret: &Secret, name: &str) -> String {
        format!("{}{}", self.share_root(secret), encode_name(name))
    }
}
