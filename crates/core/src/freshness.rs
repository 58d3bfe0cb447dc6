//! Conditional GET (`If-Modified-Since`) evaluation.

use std::time::{SystemTime, UNIX_EPOCH};

/// HTTP dates cannot express times before 1970; such mtimes are reported as
/// the epoch itself.
fn clamp_to_epoch(mtime: SystemTime) -> SystemTime {
    mtime.max(UNIX_EPOCH)
}

/// Format a modification time as an HTTP date (`Last-Modified` value).
///
/// Sub-second precision is dropped.
pub fn http_date(mtime: SystemTime) -> String {
    httpdate::fmt_http_date(clamp_to_epoch(mtime))
}

/// Whether a client holding a copy dated `if_modified_since` is still fresh.
///
/// True when the parsed header time is at or after `mtime`, or when the raw
/// header is exactly the `Last-Modified` value we would send for `mtime`. The
/// second check covers files with sub-second modification times, whose
/// formatted date is truncated below the real time. An unparseable header
/// counts as modified.
pub fn is_not_modified(if_modified_since: &str, mtime: SystemTime) -> bool {
    let Ok(since) = httpdate::parse_http_date(if_modified_since) else {
        return false;
    };
    let mtime = clamp_to_epoch(mtime);
    since >= mtime || if_modified_since == http_date(mtime)
}
