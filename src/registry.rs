//! Registration table for well-known header types.
//!
//! Collection rendering consults this table to decide whether multiple
//! occurrences of one header squash onto a single comma-joined line. The
//! table is explicit and built once; nothing is discovered at runtime.

use std::sync::OnceLock;

use indexmap::IndexMap;
use uncased::Uncased;

use crate::util::normalize_str;

/// Render-time metadata for one known header type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderMeta {
    /// The canonical wire spelling.
    pub name: &'static str,
    /// Whether repeated occurrences render as one comma-joined line.
    pub squash: bool,
}

/// `(canonical name, squash)` for every registered header type.
const KNOWN_HEADERS: &[(&str, bool)] = &[
    ("Accept", true),
    ("Accept-Charset", false),
    ("Accept-Encoding", false),
    ("Accept-Language", true),
    ("Allow", true),
    ("Alt-Svc", true),
    ("Authorization", false),
    ("Cache-Control", true),
    ("Connection", false),
    ("Content-Disposition", false),
    ("Content-Encoding", false),
    ("Content-Length", false),
    ("Content-Range", false),
    ("Content-Security-Policy", false),
    ("Content-Type", false),
    ("Cookie", false),
    ("Date", false),
    ("Digest", false),
    ("ETag", false),
    ("Expires", false),
    ("Forwarded", false),
    ("From", false),
    ("Host", false),
    ("If-Match", true),
    ("Keep-Alive", true),
    ("Last-Modified", false),
    ("Location", false),
    ("Referer", false),
    ("Referrer-Policy", true),
    ("Server", false),
    ("Set-Cookie", false),
    ("Strict-Transport-Security", false),
    ("Transfer-Encoding", true),
    ("User-Agent", false),
    ("Vary", true),
    ("WWW-Authenticate", true),
    ("X-Content-Type-Options", false),
    ("X-Frame-Options", false),
    ("X-Xss-Protection", false),
];

fn table() -> &'static IndexMap<Uncased<'static>, HeaderMeta> {
    static TABLE: OnceLock<IndexMap<Uncased<'static>, HeaderMeta>> = OnceLock::new();

    TABLE.get_or_init(|| {
        KNOWN_HEADERS
            .iter()
            .map(|&(name, squash)| {
                (Uncased::from(normalize_str(name)), HeaderMeta { name, squash })
            })
            .collect()
    })
}

/// Looks up the metadata registered for `name`, ignoring case and the
/// difference between `-` and `_`.
pub fn lookup(name: &str) -> Option<&'static HeaderMeta> {
    table().get(&Uncased::from(normalize_str(name)))
}

/// Returns `true` if `name` is registered as squashing repeated
/// occurrences onto one line. Unregistered names never squash.
pub fn squashes(name: &str) -> bool {
    lookup(name).is_some_and(|meta| meta.squash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_and_separator_insensitive_lookup() {
        assert_eq!(lookup("accept").map(|m| m.name), Some("Accept"));
        assert_eq!(lookup("CACHE_CONTROL").map(|m| m.name), Some("Cache-Control"));
        assert_eq!(lookup("x-unknown-header"), None);
    }

    #[test]
    fn squash_flags() {
        assert!(squashes("Vary"));
        assert!(squashes("www-authenticate"));
        assert!(!squashes("Set-Cookie"));
        assert!(!squashes("X-Completely-Custom"));
    }
}
