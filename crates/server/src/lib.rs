//! HTTP serving layer for hshare.
//!
//! This crate provides:
//! - Secret-prefix authorization
//! - The directory index and file downloads
//! - Conditional GET and byte-range responses
//! - The request log middleware and the server loop

pub mod access_log;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod serve;
pub mod state;

pub use access_log::ClientAddr;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use serve::{bind, serve, spawn};
pub use state::AppState;
