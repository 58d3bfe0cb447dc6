//! `Range` header parsing and validation.
//!
//! Only the single-range form `bytes=<start>-[<end>]` is understood. Anything
//! else parses to `None`, which callers treat as "no range requested".

use std::fmt;

/// A satisfiable, inclusive byte range within a file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ByteRange {
    /// First byte offset.
    pub start: u64,
    /// Last byte offset (inclusive).
    pub end: u64,
}

#[allow(clippy::len_without_is_empty)]
impl ByteRange {
    /// Number of bytes covered by the range. Never zero.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Value of the `Content-Range` header for a file of `size` bytes.
    pub fn content_range(&self, size: u64) -> String {
        format!("bytes {}-{}/{}", self.start, self.end, size)
    }
}

/// The requested range cannot be served from a file of the given size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Unsatisfiable {
    /// Size of the file the range was validated against.
    pub size: u64,
}

impl fmt::Display for Unsatisfiable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "range not satisfiable for {} byte file", self.size)
    }
}

impl std::error::Error for Unsatisfiable {}

/// Parse a raw `Range` header into `(start, end)`.
///
/// Case-insensitive, surrounding whitespace ignored. Returns `None` for any
/// other shape, including multi-range and suffix (`bytes=-N`) requests.
pub fn parse_range(raw: &str) -> Option<(u64, Option<u64>)> {
    let raw = raw.trim().to_ascii_lowercase();
    let spec = raw.strip_prefix("bytes=")?;
    let (start, end) = spec.split_once('-')?;

    let start = parse_digits(start)?;
    let end = if end.is_empty() {
        None
    } else {
        Some(parse_digits(end)?)
    };
    Some((start, end))
}

/// A bound too large for `u64` saturates, so it still reaches range
/// validation and fails there instead of being ignored.
fn parse_digits(s: &str) -> Option<u64> {
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(s.parse().unwrap_or(u64::MAX))
}

/// Check a parsed range against the file size.
///
/// A missing end means "to the end of the file". Empty files never satisfy
/// a range.
pub fn validate_range(
    start: u64,
    end: Option<u64>,
    size: u64,
) -> Result<ByteRange, Unsatisfiable> {
    if size == 0 {
        return Err(Unsatisfiable { size });
    }
    let end = end.unwrap_or(size - 1);
    if start >= size || end >= size || start > end {
        return Err(Unsatisfiable { size });
    }
    Ok(ByteRange { start, end })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_closed_and_open_ranges() {
        assert_eq!(parse_range("bytes=50-59"), Some((50, Some(59))));
        assert_eq!(parse_range("bytes=0-"), Some((0, None)));
        assert_eq!(parse_range("  BYTES=10-20 \t"), Some((10, Some(20))));
    }

    #[test]
    fn rejects_other_forms() {
        for raw in [
            "",
            "bytes=",
            "bytes=-5",
            "bytes=a-5",
            "bytes=5-b",
            "bytes=1-2,4-5",
            "items=0-1",
            "bytes 0-1",
            "bytes=+1-2",
            "bytes= 1-2",
        ] {
            assert_eq!(parse_range(raw), None, "{raw:?} should not parse");
        }
    }

    #[test]
    fn oversized_bounds_are_unsatisfiable() {
        assert_eq!(
            parse_range("bytes=99999999999999999999999-"),
            Some((u64::MAX, None))
        );
        assert_eq!(
            parse_range("bytes=0-99999999999999999999999"),
            Some((0, Some(u64::MAX)))
        );
        assert_eq!(
            validate_range(u64::MAX, None, 100),
            Err(Unsatisfiable { size: 100 })
        );
        assert_eq!(
            validate_range(0, Some(u64::MAX), 100),
            Err(Unsatisfiable { size: 100 })
        );
    }

    #[test]
    fn open_range_extends_to_last_byte() {
        let range = validate_range(10, None, 100).unwrap();
        assert_eq!(range, ByteRange { start: 10, end: 99 });
        assert_eq!(range.len(), 90);
    }

    #[test]
    fn closed_range_length_is_inclusive() {
        let range = validate_range(50, Some(59), 100).unwrap();
        assert_eq!(range.len(), 10);
        assert_eq!(range.content_range(100), "bytes 50-59/100");
    }

    #[test]
    fn single_byte_ranges() {
        assert_eq!(validate_range(0, Some(0), 1).unwrap().len(), 1);
        assert_eq!(validate_range(99, None, 100).unwrap().len(), 1);
    }

    #[test]
    fn rejects_out_of_bounds() {
        for size in 0..8u64 {
            assert!(validate_range(size, None, size).is_err());
            assert!(validate_range(0, Some(size), size).is_err());
            if size >= 2 {
                assert!(validate_range(1, Some(0), size).is_err());
            }
        }
    }

    #[test]
    fn empty_file_is_never_satisfiable() {
        assert_eq!(validate_range(0, None, 0), Err(Unsatisfiable { size: 0 }));
        assert_eq!(validate_range(0, Some(0), 0), Err(Unsatisfiable { size: 0 }));
    }

    #[test]
    fn every_valid_range_is_accepted() {
        let size = 6;
        for start in 0..size {
            for end in start..size {
                let range = validate_range(start, Some(end), size).unwrap();
                assert_eq!(range.len(), end - start + 1);
            }
        }
    }
}
