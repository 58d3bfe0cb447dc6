//! Core domain types for hshare, the ad hoc secret-URL file server.
//!
//! This crate holds everything that does not touch the network:
//! - The concurrent share registry
//! - `Range` and `If-Modified-Since` evaluation
//! - Natural ordering and the HTML directory index
//! - The URL secret, the bounded request log and operator link formatting
//! - Configuration types

pub mod address;
pub mod config;
pub mod error;
pub mod freshness;
pub mod index;
pub mod natsort;
pub mod range;
pub mod registry;
pub mod request_log;
pub mod secret;

pub use address::OperatorAddress;
pub use config::AppConfig;
pub use error::{Error, Result};
pub use freshness::{http_date, is_not_modified};
pub use index::{decode_name, encode_name, render_index};
pub use natsort::{natural_cmp, natural_sort};
pub use range::{ByteRange, Unsatisfiable, parse_range, validate_range};
pub use registry::ShareRegistry;
pub use request_log::RequestLog;
pub use secret::Secret;

/// Read size for streamed file bodies: 16 KiB.
pub const STREAM_CHUNK_SIZE: usize = 16 * 1024;

/// Request log lines retained by default.
pub const DEFAULT_LOG_CAPACITY: usize = 100;

/// Body served for `/robots.txt`.
pub const ROBOTS_TXT: &str = "User-agent: *\r\nDisallow: /\r\n";
