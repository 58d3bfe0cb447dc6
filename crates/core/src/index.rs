//! HTML directory listing for the share root.

use crate::natsort::natural_sort;
use askama::Template;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use std::borrow::Cow;

/// Bytes left unescaped in a URL path segment: alphanumerics plus `_.-~/`.
const PATH_SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~')
    .remove(b'/');

/// Percent-encode a public name for use in a URL.
pub fn encode_name(name: &str) -> Cow<'_, str> {
    utf8_percent_encode(name, PATH_SEGMENT).into()
}

/// Decode a percent-encoded URL segment back into a public name.
///
/// Invalid UTF-8 after decoding is replaced lossily; such a name can never
/// match a share.
pub fn decode_name(segment: &str) -> Cow<'_, str> {
    percent_decode_str(segment).decode_utf8_lossy()
}

/// One listing row. `href` is already percent-encoded and contains no
/// HTML-special characters; `name` is escaped by the template.
struct IndexEntry<'a> {
    href: Cow<'a, str>,
    name: &'a str,
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexPage<'a> {
    directory: &'a str,
    entries: Vec<IndexEntry<'a>>,
}

/// Render the listing page for `directory` (the share root path, e.g.
/// `/{secret}/`) containing one link per name, in natural order.
///
/// Output depends only on the inputs.
pub fn render_index<I, S>(directory: &str, names: I) -> crate::Result<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut names: Vec<S> = names.into_iter().collect();
    natural_sort(&mut names);

    let entries = names
        .iter()
        .map(|name| {
            let name = name.as_ref();
            IndexEntry {
                href: encode_name(name),
                name,
            }
        })
        .collect();

    Ok(IndexPage { directory, entries }.render()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    fn hrefs(html: &str) -> Vec<String> {
        html.split("href=\"")
            .skip(1)
            .map(|rest| {
                let raw = &rest[..rest.find('"').unwrap()];
                decode_name(raw).into_owned()
            })
            .collect()
    }

    #[test]
    fn links_round_trip_to_names() {
        let names: BTreeSet<String> = [
            "plain.txt",
            "with space.pdf",
            "quote\"and'apos.txt",
            "<script>alert(1)</script>.html",
            "a&b.txt",
            "ünïcødé ☃.md",
            "100%.png",
            "hash#frag?.bin",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        let html = render_index("/s3cr3t/", &names).unwrap();
        let decoded: BTreeSet<String> = hrefs(&html).into_iter().collect();
        assert_eq!(decoded, names);
    }

    #[test]
    fn display_names_are_escaped() {
        let html = render_index("/x/", ["<b>&\"'.txt"]).unwrap();
        assert!(html.contains(">&lt;b&gt;&amp;&quot;"));
        assert!(!html.contains("<b>"));
        assert!(!html.contains("\"'.txt"));
    }

    #[test]
    fn entries_are_naturally_ordered() {
        let html = render_index("/x/", ["file10", "file2", "file1"]).unwrap();
        let order = hrefs(&html);
        assert_eq!(order, vec!["file1", "file2", "file10"]);
    }

    #[test]
    fn output_is_deterministic() {
        let a = render_index("/x/", ["b", "a", "c"]).unwrap();
        let b = render_index("/x/", ["c", "b", "a"]).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn skeleton_with_no_entries() {
        let html = render_index("/x/", Vec::<String>::new()).unwrap();
        assert!(html.starts_with("<!DOCTYPE HTML"));
        assert!(html.contains("<title>Directory listing for /x/</title>"));
        assert!(html.contains("<h1>Directory listing for /x/</h1>"));
        assert!(html.contains("<ul>\n</ul>"));
        assert!(!html.contains("<li>"));
    }

    #[test]
    fn one_entry_per_line() {
        let html = render_index("/x/", ["a", "b"]).unwrap();
        assert!(html.contains(
            "<ul>\n<li><a href=\"a\">a</a></li>\n<li><a href=\"b\">b</a></li>\n</ul>"
        ));
    }

    #[test]
    fn directory_title_is_escaped() {
        let html = render_index("/<i>/", ["a"]).unwrap();
        assert!(html.contains("Directory listing for /&lt;i&gt;"));
        assert!(!html.contains("<i>"));
    }

    #[test]
    fn encode_name_matches_url_quoting() {
        assert_eq!(encode_name("a b.txt"), "a%20b.txt");
        assert_eq!(encode_name("ü"), "%C3%BC");
        assert_eq!(encode_name("x_y-z.~"), "x_y-z.~");
        assert_eq!(decode_name("a%20b.txt"), "a b.txt");
    }
}
