//! Application state shared across handlers.

use hshare_core::{AppConfig, RequestLog, Secret, ShareRegistry};
use std::sync::Arc;

/// Shared application state.
///
/// One instance exists per process, built before the server starts and
/// cloned into every handler. The operator shell holds a clone too and
/// mutates the registry through it.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// URL secret guarding every share path.
    pub secret: Arc<Secret>,
    /// Shared files, keyed by public name.
    pub registry: ShareRegistry,
    /// Recent request log.
    pub log: RequestLog,
}

impl AppState {
    /// Create a new application state with an empty registry.
    pub fn new(config: AppConfig, secret: Secret) -> Self {
        let log = RequestLog::new(config.log.capacity);
        Self {
            config: Arc::new(config),
            secret: Arc::new(secret),
            registry: ShareRegistry::new(),
            log,
        }
    }

    /// Read size for streamed bodies.
    pub fn chunk_size(&self) -> usize {
        self.config.server.chunk_size.max(1)
    }
}
