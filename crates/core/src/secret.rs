//! The capability token embedded as the first URL path segment.

use base64::Engine;
use rand::RngCore;
use std::fmt;

/// Random bytes behind a generated secret (8 URL-safe characters).
const SECRET_BYTES: usize = 6;

/// Process-lifetime URL secret. Every authorized path starts with `/{secret}/`.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Generate a new random URL-safe secret.
    pub fn generate() -> Self {
        let mut bytes = [0u8; SECRET_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        Self(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    /// Use a fixed secret value (tests, scripted setups).
    pub fn from_string(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The raw token.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path of the share root: `/{secret}/`.
    pub fn root_path(&self) -> String {
        format!("/{}/", self.0)
    }

    /// Strip the `/{secret}/` prefix from a request path.
    ///
    /// Returns the remainder (possibly empty) when the path is authorized.
    pub fn strip_prefix<'a>(&self, path: &'a str) -> Option<&'a str> {
        path.strip_prefix('/')?
            .strip_prefix(self.0.as_str())?
            .strip_prefix('/')
    }
}

// Keep the token out of logs that print state with {:?}.
impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Secret(..)")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
