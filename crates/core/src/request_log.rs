//! Bounded in-memory log of recent requests, shown by the shell's `tail`.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use time::OffsetDateTime;
use time::macros::format_description;

/// Fixed-capacity request log. Appending past capacity evicts the oldest line.
#[derive(Clone, Debug)]
pub struct RequestLog {
    lines: Arc<Mutex<VecDeque<String>>>,
    capacity: usize,
}

impl Default for RequestLog {
    fn default() -> Self {
        Self::new(crate::DEFAULT_LOG_CAPACITY)
    }
}

impl RequestLog {
    /// Create a log retaining at most `capacity` lines (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: Arc::new(Mutex::new(VecDeque::with_capacity(capacity))),
            capacity,
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<String>> {
        self.lines.lock().unwrap_or_else(|poisoned| {
            tracing::warn!("request log Mutex was poisoned, recovering with into_inner()");
            poisoned.into_inner()
        })
    }

    /// Append a line, evicting the oldest ones beyond capacity.
    pub fn append(&self, line: impl Into<String>) {
        let mut lines = self.lock();
        lines.push_back(line.into());
        while lines.len() > self.capacity {
            lines.pop_front();
        }
    }

    /// Append a line for `client`, stamped with the current time.
    ///
    /// Format: `{client} - - [{dd/Mon/YYYY HH:MM:SS}] {message}`.
    pub fn record(&self, client: &str, message: &str) {
        self.append(format_line(client, OffsetDateTime::now_utc(), message));
    }

    /// Snapshot of retained lines, oldest first.
    pub fn lines(&self) -> Vec<String> {
        self.lock().iter().cloned().collect()
    }

    /// Maximum number of retained lines.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of retained lines.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

/// Format one log line.
pub fn format_line(client: &str, at: OffsetDateTime, message: &str) -> String {
    let stamp = at
        .format(format_description!(
            "[day]/[month repr:short]/[year] [hour]:[minute]:[second]"
        ))
        .unwrap_or_else(|_| at.unix_timestamp().to_string());
    format!("{client} - - [{stamp}] {message}")
}
