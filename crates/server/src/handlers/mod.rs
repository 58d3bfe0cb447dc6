//! HTTP request handlers.

pub mod robots;
pub mod shares;

pub use robots::*;
pub use shares::*;
