//! Natural ("human") ordering of names.
//!
//! A name is split into alternating text and digit runs, always starting and
//! ending with a (possibly empty) text run. Text runs compare
//! case-insensitively, digit runs compare by numeric value, so `file2` sorts
//! before `file10`.

use std::cmp::Ordering;

#[derive(Debug, PartialEq, Eq)]
enum Run<'a> {
    Text(&'a str),
    Digits(&'a str),
}

fn runs(s: &str) -> Vec<Run<'_>> {
    let mut out = Vec::new();
    let mut rest = s;
    loop {
        let text_end = rest
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(rest.len());
        out.push(Run::Text(&rest[..text_end]));
        rest = &rest[text_end..];
        if rest.is_empty() {
            return out;
        }
        let digits_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        out.push(Run::Digits(&rest[..digits_end]));
        rest = &rest[digits_end..];
    }
}

fn cmp_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

fn cmp_run(a: &Run<'_>, b: &Run<'_>) -> Ordering {
    match (a, b) {
        (Run::Text(a), Run::Text(b)) => a.to_lowercase().cmp(&b.to_lowercase()),
        (Run::Digits(a), Run::Digits(b)) => cmp_digits(a, b),
        // Runs alternate from a leading text run, so kinds line up by position.
        (Run::Text(_), Run::Digits(_)) => Ordering::Less,
        (Run::Digits(_), Run::Text(_)) => Ordering::Greater,
    }
}

/// Compare two names in natural order.
///
/// Names that compare equal by runs (`a01` and `a1`, `A` and `a`) fall back
/// to plain string order so the result is total.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let (ra, rb) = (runs(a), runs(b));
    ra.iter()
        .zip(rb.iter())
        .map(|(x, y)| cmp_run(x, y))
        .find(|o| o.is_ne())
        .unwrap_or_else(|| ra.len().cmp(&rb.len()))
        .then_with(|| a.cmp(b))
}

/// Sort names in place in natural order.
pub fn natural_sort<S: AsRef<str>>(names: &mut [S]) {
    names.sort_by(|a, b| natural_cmp(a.as_ref(), b.as_ref()));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(names: &[&str]) -> Vec<String> {
        let mut v: Vec<String> = names.iter().map(|s| s.to_string()).collect();
        natural_sort(&mut v);
        v
    }

    #[test]
    fn numbers_compare_by_value() {
        assert_eq!(
            sorted(&["file10", "file2", "file1"]),
            vec!["file1", "file2", "file10"]
        );
    }

    #[test]
    fn text_is_case_insensitive() {
        assert_eq!(sorted(&["b", "A", "a", "B"]), vec!["A", "a", "B", "b"]);
    }

    #[test]
    fn leading_digits_and_prefixes() {
        assert_eq!(
            sorted(&["10 intro", "2 intro", "file", "file1"]),
            vec!["2 intro", "10 intro", "file", "file1"]
        );
    }

    #[test]
    fn multiple_numeric_runs() {
        assert_eq!(
            sorted(&["v1.10.0", "v1.2.10", "v1.2.9"]),
            vec!["v1.2.9", "v1.2.10", "v1.10.0"]
        );
    }

    #[test]
    fn huge_numbers_do_not_overflow() {
        assert_eq!(
            sorted(&["n100000000000000000000000", "n99999999999999999999999"]),
            vec!["n99999999999999999999999", "n100000000000000000000000"]
        );
    }

    #[test]
    fn zero_padding_ties_are_stable() {
        assert_eq!(sorted(&["a1", "a01"]), vec!["a01", "a1"]);
        assert_eq!(natural_cmp("a01", "a1"), Ordering::Less);
        assert_eq!(natural_cmp("x", "x"), Ordering::Equal);
    }

    #[test]
    fn runs_alternate_from_text() {
        assert_eq!(
            runs("12ab3"),
            vec![
                Run::Text(""),
                Run::Digits("12"),
                Run::Text("ab"),
                Run::Digits("3"),
                Run::Text("")
            ]
        );
    }
}
