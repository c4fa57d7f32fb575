use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    // A drive letter followed by a colon, or a UNC `\\server` prefix.
    static ref LOCAL_PATH: Regex = Regex::new(r"^(?:\p{Alphabetic}:|\\\\)").unwrap();
}

/// What kind of text the clipboard handed us.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification<'a> {
    LocalPath(&'a str),
    Url(&'a str),
    Passthrough(&'a str),
}

/// Decide how a trimmed input should be processed. Only looks at the prefix,
/// no network or filesystem access happens here.
pub fn classify(input: &str) -> Classification<'_> {
    if is_local_path(input) {
        Classification::LocalPath(input)
    } else if input.starts_with("http") {
        Classification::Url(input)
    } else {
        Classification::Passthrough(input)
    }
}

fn is_local_path(input: &str) -> bool {
    let unquoted = strip_one(strip_one(input, '"'), '\'');
    LOCAL_PATH.is_match(unquoted)
}

/// Strip a single layer of `quote` from both ends, if present.
pub(crate) fn strip_one(s: &str, quote: char) -> &str {
    let s = s.strip_prefix(quote).unwrap_or(s);
    s.strip_suffix(quote).unwrap_or(s)
}

#[test]
fn test_classify() {
    assert_eq!(
        classify(r"C:\Users\a"),
        Classification::LocalPath(r"C:\Users\a")
    );
    assert_eq!(
        classify(r#""D:\My Files""#),
        Classification::LocalPath(r#""D:\My Files""#)
    );
    assert_eq!(
        classify(r"\\server\share"),
        Classification::LocalPath(r"\\server\share")
    );
    assert_eq!(classify("'é:/x'"), Classification::LocalPath("'é:/x'"));

    assert_eq!(
        classify("https://example.com"),
        Classification::Url("https://example.com")
    );
    // The prefix check is deliberately loose.
    assert_eq!(classify("httpfoo"), Classification::Url("httpfoo"));

    assert_eq!(classify("hello"), Classification::Passthrough("hello"));
    assert_eq!(classify("1:2"), Classification::Passthrough("1:2"));
    assert_eq!(classify("C"), Classification::Passthrough("C"));
    assert_eq!(classify(""), Classification::Passthrough(""));
}
