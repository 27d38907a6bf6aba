//! Small string transforms shared across the crate.

use memchr::memchr_iter;

/// Characters that may never appear in a header or attribute name, on top of
/// the printable-ASCII requirement.
const FORBIDDEN_NAME_CHARS: &[u8] = b":;(),<>=@?[]\r\n\t &{}\"\\";

/// Normalizes a name for comparison: lowercased, `-` replaced by `_`.
///
/// ```rust
/// assert_eq!(headway::util::normalize_str("Content-Type"), "content_type");
/// assert_eq!(headway::util::normalize_str("X-content-type"), "x_content_type");
/// ```
pub fn normalize_str(string: &str) -> String {
    string.to_ascii_lowercase().replace('-', "_")
}

/// Prettifies a header name: every `-`-separated segment capitalized.
///
/// ```rust
/// assert_eq!(headway::util::prettify_name("x-hEllo-wORLD"), "X-Hello-World");
/// assert_eq!(headway::util::prettify_name("content_type"), "Content-Type");
/// ```
pub fn prettify_name(name: &str) -> String {
    name.replace('_', "-")
        .split('-')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join("-")
}

fn capitalize(segment: &str) -> String {
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Removes one pair of matching outer quotes (`"` or `'`) if present.
///
/// ```rust
/// assert_eq!(headway::util::unquote("\"hello\""), "hello");
/// assert_eq!(headway::util::unquote("\"hello"), "\"hello");
/// ```
pub fn unquote(string: &str) -> &str {
    let stripped = string
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .or_else(|| string.strip_prefix('\'').and_then(|s| s.strip_suffix('\'')));

    stripped.unwrap_or(string)
}

/// Surrounds a string with double quotes, never doubling existing ones.
pub fn quote(string: &str) -> String {
    format!("\"{}\"", unquote(string))
}

/// Removes the backslash from every escaped double quote.
pub fn unescape_double_quote(content: &str) -> String {
    content.replace("\\\"", "\"")
}

/// Backslash-escapes every double quote, idempotently.
pub fn escape_double_quote(content: &str) -> String {
    unescape_double_quote(content).replace('"', "\\\"")
}

/// Undoes header folding: every CRLF followed by one or more spaces becomes
/// a single space.
///
/// ```rust
/// let folded = "___utmvbtouVBFmB=gZg\r\n    XbNOjalT: Lte; path=/";
/// assert_eq!(headway::util::unfold(folded), "___utmvbtouVBFmB=gZg XbNOjalT: Lte; path=/");
/// ```
pub fn unfold(content: &str) -> String {
    let bytes = content.as_bytes();
    let mut result = String::with_capacity(content.len());
    let mut start = 0;

    for cr in memchr_iter(b'\r', bytes) {
        if cr < start || bytes.get(cr + 1) != Some(&b'\n') || bytes.get(cr + 2) != Some(&b' ') {
            continue;
        }

        let mut end = cr + 2;
        while bytes.get(end) == Some(&b' ') {
            end += 1;
        }

        result.push_str(&content[start..cr]);
        result.push(' ');
        start = end;
    }

    result.push_str(&content[start..]);
    result
}

/// Extracts every parenthesized comment found in `content`, in order.
///
/// ```rust
/// let ua = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.9) Gecko/20100101 (hello)";
/// assert_eq!(headway::util::extract_comments(ua),
///            vec!["Macintosh; Intel Mac OS X 10.9", "hello"]);
/// ```
pub fn extract_comments(content: &str) -> Vec<String> {
    let mut comments = Vec::new();
    let mut remainder = content;

    while let Some(open) = remainder.find('(') {
        let after = &remainder[open + 1..];
        match after.find(')') {
            Some(close) if close > 0 => {
                comments.push(after[..close].to_string());
                remainder = &after[close + 1..];
            }
            Some(close) => remainder = &after[close + 1..],
            None => break,
        }
    }

    comments
}

/// Verifies that a header name is legal: non-empty printable ASCII with no
/// separator, no whitespace, and no quoting character in it.
///
/// ```rust
/// assert!(headway::util::is_legal_name("Content-Type"));
/// assert!(headway::util::is_legal_name("Hello-World/"));
/// assert!(!headway::util::is_legal_name(":hello"));
/// assert!(!headway::util::is_legal_name("Hello World"));
/// ```
pub fn is_legal_name(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| (0x21..=0x7E).contains(&b) && !FORBIDDEN_NAME_CHARS.contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization() {
        assert_eq!(normalize_str("Content-Type"), "content_type");
        assert_eq!(normalize_str("UPGRADE"), "upgrade");
        assert_eq!(prettify_name("server"), "Server");
        assert_eq!(prettify_name("contEnt-TYPE"), "Content-Type");
    }

    #[test]
    fn quoting() {
        assert_eq!(unquote("\"a\""), "a");
        assert_eq!(unquote("\"\""), "");
        assert_eq!(unquote("'single'"), "single");
        assert_eq!(unquote("plain"), "plain");
        assert_eq!(quote("hello"), "\"hello\"");
        assert_eq!(quote("\"hello\""), "\"hello\"");
        assert_eq!(quote("\"hello"), "\"\"hello\"");
    }

    #[test]
    fn double_quote_escaping() {
        assert_eq!(unescape_double_quote(r#"UTF\"-8"#), "UTF\"-8");
        assert_eq!(unescape_double_quote("UTF\"-8"), "UTF\"-8");
        assert_eq!(escape_double_quote(r#"UTF\"-8"#), r#"UTF\"-8"#);
        assert_eq!(escape_double_quote("UTF\"-8"), r#"UTF\"-8"#);
    }

    #[test]
    fn unfolding() {
        assert_eq!(unfold("a\r\n  b"), "a b");
        assert_eq!(unfold("a\r\nb"), "a\r\nb");
        assert_eq!(unfold("no folds here"), "no folds here");
        assert_eq!(unfold("x\r\n y\r\n   z"), "x y z");
    }

    #[test]
    fn comments() {
        let ua = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.9; rv:50.0) \
                  Gecko/20100101 Firefox/50.0 (hello) llll (abc)";
        assert_eq!(
            extract_comments(ua),
            vec!["Macintosh; Intel Mac OS X 10.9; rv:50.0", "hello", "abc"]
        );
        assert!(extract_comments("nothing to see").is_empty());
        assert!(extract_comments("empty ()").is_empty());
    }

    #[test]
    fn name_legality() {
        assert!(is_legal_name("hello"));
        assert!(is_legal_name("Content-Type"));
        assert!(!is_legal_name(""));
        assert!(!is_legal_name(":hello"));
        assert!(!is_legal_name("Hello;"));
        assert!(!is_legal_name("Hello\rWorld"));
        assert!(!is_legal_name("Hello \tWorld"));
        assert!(!is_legal_name("Hello World\""));
        assert!(!is_legal_name("\x07"));
        assert!(!is_legal_name("\x7f"));
        assert!(!is_legal_name("héllo"));
    }
}
