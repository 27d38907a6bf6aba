//! An ordered collection of [`Header`] instances.

use std::fmt;
use std::str::FromStr;

use either::Either;
use indexmap::IndexMap;
use tracing::debug;

use crate::error::{Error, Result};
use crate::header::Header;
use crate::parse::{is_json_object, split_block, split_content, Delimiter};
use crate::registry;
use crate::util::{is_legal_name, normalize_str};

/// An ordered header set.
///
/// Names may legitimately repeat (`Set-Cookie` being the canonical case):
/// all occurrences are retained in their original order and resolved as a
/// group on lookup. Lookups ignore ASCII case and the `-`/`_` distinction.
/// Cloning is a deep copy; mutating a clone never affects the original.
///
/// ```rust
/// use headway::Headers;
///
/// let headers: Headers = "Content-Type: text/html; charset=UTF-8\r\nAllow: POST\r\n".parse()?;
/// assert_eq!(headers.len(), 2);
/// assert!(headers.has("content-type"));
/// # Ok::<_, headway::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Headers {
    entries: Vec<Header>,
}

impl Headers {
    /// An empty header set.
    pub fn new() -> Headers {
        Headers::default()
    }

    /// The number of headers held, repeats included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no header is held.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the headers in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Header> {
        self.entries.iter()
    }

    /// Case-insensitively checks whether a header named `name` is present.
    pub fn has(&self, name: &str) -> bool {
        let name = normalize_str(name);
        self.iter().any(|h| h.normalized_name() == name)
    }

    /// Returns `true` if an equal header instance is present.
    pub fn contains(&self, header: &Header) -> bool {
        self.iter().any(|h| h == header)
    }

    /// Fetches the header(s) named `name`: one header if exactly one
    /// occurrence matches, otherwise the ordered group.
    pub fn get(&self, name: &str) -> Option<Either<&Header, Vec<&Header>>> {
        match self.get_all(name).as_slice() {
            [] => None,
            [single] => Some(Either::Left(single)),
            group => Some(Either::Right(group.to_vec())),
        }
    }

    /// Fetches every header named `name`, in order. The always-list
    /// counterpart of [`get()`](Self::get).
    pub fn get_all(&self, name: &str) -> Vec<&Header> {
        let name = normalize_str(name);
        self.iter().filter(|h| h.normalized_name() == name).collect()
    }

    /// Returns `true` if `name` occurs more than once.
    pub fn has_many(&self, name: &str) -> bool {
        self.get_all(name).len() > 1
    }

    /// The distinct header names in first-seen order, original spelling.
    pub fn keys(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        let mut keys: Vec<&str> = Vec::new();

        for header in self.iter() {
            if !seen.contains(&header.normalized_name()) {
                seen.push(header.normalized_name());
                keys.push(header.name());
            }
        }

        keys
    }

    /// `(name, content)` pairs for every header, in order.
    pub fn items(&self) -> Vec<(&str, &str)> {
        self.iter().map(|h| (h.name(), h.content())).collect()
    }

    /// Flattens to a single-valued map: repeated names concatenate their
    /// contents with `", "`. Keys keep the first-seen spelling, `_` folded
    /// to `-`.
    pub fn to_map(&self) -> IndexMap<String, String> {
        let mut map: IndexMap<String, String> = IndexMap::new();

        for header in self.iter() {
            let key = header.name().replace('_', "-");
            let slot = map.keys().position(|k| normalize_str(k) == normalize_str(&key));

            match slot {
                Some(i) => {
                    map[i].push_str(", ");
                    map[i].push_str(header.content());
                }
                None => {
                    map.insert(key, header.content().to_string());
                }
            }
        }

        map
    }

    /// A compact JSON dump of [`items()`](Self::items).
    pub fn to_json(&self) -> String {
        // Tuples of strings always serialize.
        serde_json::to_string(&self.items()).unwrap_or_default()
    }

    /// Appends a header at the end.
    pub fn push(&mut self, header: Header) {
        self.entries.push(header);
    }

    /// Inserts a header before `index`; an `index` beyond the end appends.
    pub fn insert(&mut self, index: usize, header: Header) {
        let index = index.min(self.entries.len());
        self.entries.insert(index, header);
    }

    /// Replaces every header named `name` with fresh ones built from
    /// `value`. A comma-joined `value` becomes multiple headers, one per
    /// entry, unless the value is a JSON document or the header is the
    /// IMAP `Subject`, whose commas are prose.
    pub fn set(&mut self, name: &str, value: &str) -> Result<()> {
        if !is_legal_name(name) {
            return Err(Error::InvalidName(name.to_string()));
        }

        let split = !is_json_object(value) && normalize_str(name) != "subject";

        let replacements = match split {
            false => vec![Header::new(name, value)?],
            true => {
                let entries = split_content(value, Delimiter::Comma);
                entries
                    .iter()
                    .map(|entry| Header::new(name, entry))
                    .collect::<Result<Vec<_>>>()?
            }
        };

        let name = normalize_str(name);
        self.entries.retain(|h| h.normalized_name() != name);
        self.entries.extend(replacements);
        Ok(())
    }

    /// Removes and returns every header named `name`, in order.
    ///
    /// Fails with [`Error::KeyNotFound`] if none matches.
    pub fn remove(&mut self, name: &str) -> Result<Vec<Header>> {
        if !self.has(name) {
            return Err(Error::KeyNotFound(name.to_string()));
        }

        let name = normalize_str(name);
        let mut removed = Vec::new();
        let mut kept = Vec::with_capacity(self.entries.len());

        for header in self.entries.drain(..) {
            if header.normalized_name() == name {
                removed.push(header);
            } else {
                kept.push(header);
            }
        }

        self.entries = kept;
        Ok(removed)
    }

    /// Removes the first header equal to `header`. Returns `true` if one
    /// was removed.
    pub fn remove_header(&mut self, header: &Header) -> bool {
        match self.entries.iter().position(|h| h == header) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    /// Removes and returns the header at a (possibly negative) position.
    pub fn pop(&mut self, index: isize) -> Result<Header> {
        let len = self.entries.len();

        let resolved = match index {
            i if i >= 0 && (i as usize) < len => i as usize,
            i if i < 0 && len > 0 => i.rem_euclid(len as isize) as usize,
            i => return Err(Error::IndexOutOfRange(i)),
        };

        Ok(self.entries.remove(resolved))
    }

    /// The position of the first header equal to `header`.
    pub fn index_of(&self, header: &Header) -> Option<usize> {
        self.entries.iter().position(|h| h == header)
    }

    /// The position of the first header named `name`, case-insensitively.
    pub fn index_of_name(&self, name: &str) -> Option<usize> {
        let name = normalize_str(name);
        self.entries.iter().position(|h| h.normalized_name() == name)
    }
}

/// Renders to wire format: one group per distinct name, CRLF-separated, no
/// trailing newline. A name registered as squashing renders its repeated
/// occurrences as a single comma-joined line.
impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;

        for name in self.keys() {
            let group = self.get_all(name);

            if !first {
                f.write_str("\r\n")?;
            }
            first = false;

            if group.len() > 1 && registry::squashes(name) {
                let contents: Vec<&str> = group.iter().map(|h| h.content()).collect();
                write!(f, "{}: {}", name, contents.join(", "))?;
            } else {
                for (i, header) in group.iter().enumerate() {
                    if i > 0 {
                        f.write_str("\r\n")?;
                    }

                    write!(f, "{header}")?;
                }
            }
        }

        Ok(())
    }
}

/// Two header sets are equal when they have the same length and the same
/// multiset of headers; order does not matter.
impl PartialEq for Headers {
    fn eq(&self, other: &Headers) -> bool {
        if self.len() != other.len() {
            return false;
        }

        let mut matched = vec![false; other.len()];

        'outer: for header in self.iter() {
            for (slot, candidate) in other.iter().enumerate() {
                if !matched[slot] && header == candidate {
                    matched[slot] = true;
                    continue 'outer;
                }
            }

            return false;
        }

        true
    }
}

impl Eq for Headers {}

impl From<Vec<Header>> for Headers {
    fn from(entries: Vec<Header>) -> Headers {
        Headers { entries }
    }
}

impl FromIterator<Header> for Headers {
    fn from_iter<I: IntoIterator<Item = Header>>(iter: I) -> Headers {
        Headers { entries: iter.into_iter().collect() }
    }
}

impl Extend<Header> for Headers {
    fn extend<I: IntoIterator<Item = Header>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}

impl IntoIterator for Headers {
    type Item = Header;
    type IntoIter = std::vec::IntoIter<Header>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = &'a Header;
    type IntoIter = std::slice::Iter<'a, Header>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// Parses a raw header block (`Name: value` lines).
///
/// Folded continuation lines are unfolded, lines carrying an illegal name
/// are skipped, and a comma-joined content becomes multiple same-named
/// headers unless the content is a JSON document or the header is the IMAP
/// `Subject`. A document that is itself a JSON object is routed through
/// [`serializer::decode()`](crate::serializer::decode).
impl FromStr for Headers {
    type Err = Error;

    fn from_str(text: &str) -> Result<Headers> {
        let trimmed = text.trim();
        if trimmed.starts_with('{') && trimmed.ends_with('}') {
            let value = serde_json::from_str(trimmed)
                .map_err(|e| Error::malformed("serialized headers hold invalid JSON", e))?;

            return crate::serializer::decode(&value);
        }

        let mut headers = Headers::new();

        for (name, content) in split_block(text) {
            if !is_legal_name(&name) {
                debug!(name = %name, "skipping illegal header name");
                continue;
            }

            let entries = match is_json_object(&content) {
                true => vec![content.clone()],
                false => split_content(&content, Delimiter::Comma),
            };

            if entries.len() > 1 && normalize_str(&name) != "subject" {
                for entry in &entries {
                    headers.push(Header::new(&name, entry)?);
                }
            } else {
                headers.push(Header::new(&name, &content)?);
            }
        }

        Ok(headers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(name: &str, content: &str) -> Header {
        Header::new(name, content).unwrap()
    }

    #[test]
    fn ordered_group_lookup() {
        let mut headers = Headers::new();
        headers.push(header("Set-Cookie", "a=1"));
        headers.push(header("Allow", "POST"));
        headers.push(header("set-cookie", "b=2"));

        assert_eq!(headers.len(), 3);
        assert!(headers.has("SET_COOKIE"));
        assert!(headers.has_many("set-cookie"));
        assert!(!headers.has_many("allow"));

        let group = headers.get("Set-Cookie").unwrap().unwrap_right();
        assert_eq!(group.len(), 2);
        assert_eq!(group[0].content(), "a=1");
        assert_eq!(group[1].content(), "b=2");

        let single = headers.get("allow").unwrap().unwrap_left();
        assert_eq!(single.content(), "POST");
        assert!(headers.get("missing").is_none());

        assert_eq!(headers.get_all("set-cookie").len(), 2);
        assert_eq!(headers.keys(), ["Set-Cookie", "Allow"]);
    }

    #[test]
    fn set_splits_comma_joined_values() {
        let mut headers = Headers::new();
        headers.set("content-type", "application/json").unwrap();
        assert_eq!(headers.len(), 1);

        headers.set("accept", "text/html, application/json;q=1.0").unwrap();
        assert_eq!(headers.len(), 3);

        // Subject keeps its commas.
        headers.set("Subject", "hello, world").unwrap();
        assert_eq!(headers.len(), 4);
        assert_eq!(headers.get("subject").unwrap().unwrap_left().content(), "hello, world");

        // So does a JSON document, commas and all.
        headers.set("Report-To", r#"{"group":"csp", "max_age":10886400}"#).unwrap();
        assert_eq!(headers.get_all("report-to").len(), 1);
        let report = headers.get("report-to").unwrap().unwrap_left();
        assert_eq!(report.get("group").unwrap().unwrap_left(), "csp");

        // Replacement removes every prior occurrence.
        headers.set("accept", "*/*").unwrap();
        assert_eq!(headers.get_all("accept").len(), 1);

        assert!(matches!(headers.set("bad name", "x"), Err(Error::InvalidName(_))));
    }

    #[test]
    fn removal() {
        let mut headers = Headers::new();
        headers.push(header("A", "hello"));
        headers.push(header("B", "world"));
        headers.push(header("A", "again"));

        let removed = headers.remove("a").unwrap();
        assert_eq!(removed.len(), 2);
        assert_eq!(headers.len(), 1);
        assert!(matches!(headers.remove("a"), Err(Error::KeyNotFound(_))));

        let b = header("B", "world");
        assert!(headers.remove_header(&b));
        assert!(!headers.remove_header(&b));
        assert!(headers.is_empty());
    }

    #[test]
    fn pop_and_index() {
        let mut headers = Headers::new();
        headers.push(header("A", "hello"));
        headers.push(header("B", "world"));
        headers.push(header("C", "funny; riddle"));

        assert_eq!(headers.index_of_name("c"), Some(2));
        assert_eq!(headers.index_of(&header("B", "world")), Some(1));
        assert_eq!(headers.index_of_name("zzz"), None);

        let last = headers.pop(-1).unwrap();
        assert_eq!(last.name(), "C");
        let first = headers.pop(0).unwrap();
        assert_eq!(first.name(), "A");
        assert!(matches!(headers.pop(5), Err(Error::IndexOutOfRange(5))));
    }

    #[test]
    fn insertion_order_is_preserved() {
        let mut headers = Headers::new();
        headers.push(header("B", "2"));
        headers.insert(0, header("A", "1"));
        headers.insert(99, header("C", "3"));

        let names: Vec<&str> = headers.iter().map(Header::name).collect();
        assert_eq!(names, ["A", "B", "C"]);
    }

    #[test]
    fn rendering_squashes_registered_names() {
        let mut headers = Headers::new();
        headers.push(header("Vary", "Accept-Encoding"));
        headers.push(header("Vary", "Cookie"));
        headers.push(header("Set-Cookie", "a=1"));
        headers.push(header("Set-Cookie", "b=2"));

        assert_eq!(
            headers.to_string(),
            "Vary: Accept-Encoding, Cookie\r\nSet-Cookie: a=1\r\nSet-Cookie: b=2"
        );
    }

    #[test]
    fn equality_ignores_order() {
        let a = header("X", "1") + header("Y", "2");
        let b = header("Y", "2") + header("X", "1");
        assert_eq!(a, b);

        let mut c = b.clone();
        c.push(header("X", "1"));
        assert_ne!(a, c, "length matters");

        let mut d = header("X", "1") + header("X", "1");
        let e = header("X", "1") + header("X", "2");
        assert_ne!(d, e, "duplicates must match one-to-one");
        d.pop(-1).unwrap();
        d.push(header("X", "2"));
        assert_eq!(d, e);
    }

    #[test]
    fn clones_are_deep() {
        let mut original = Headers::new();
        original.push(header("Content-Type", "text/html; charset=UTF-8"));

        let mut copy = original.clone();
        copy.get_all("content-type");
        copy.set("content-type", "application/json").unwrap();
        copy.push(header("Allow", "POST"));

        assert_eq!(original.len(), 1);
        assert_eq!(
            original.get("content-type").unwrap().unwrap_left().content(),
            "text/html; charset=UTF-8"
        );
    }

    #[test]
    fn flattened_map_view() {
        let mut headers = Headers::new();
        headers.push(header("Accept", "text/html"));
        headers.push(header("ACCEPT", "application/json"));
        headers.push(header("Host", "example.org"));

        let map = headers.to_map();
        assert_eq!(map.get("Accept").map(String::as_str), Some("text/html, application/json"));
        assert_eq!(map.get("Host").map(String::as_str), Some("example.org"));
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn parse_raw_block() {
        let block = "Content-Type: text/html; charset=UTF-8\r\n\
                     Allow: POST\r\n\
                     Bad Name: skipped\r\n";

        let headers: Headers = block.parse().unwrap();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers.keys(), ["Content-Type", "Allow"]);
    }

    #[test]
    fn parse_splits_multi_entry_content() {
        let headers: Headers = "accept: text/html, application/json\r\n".parse().unwrap();
        assert_eq!(headers.get_all("accept").len(), 2);

        let headers: Headers = "Subject: hello, world\r\n".parse().unwrap();
        assert_eq!(headers.len(), 1);
    }

    #[test]
    fn parse_keeps_dates_whole() {
        let block = "set-cookie: 1P_JAR=2020-03-16-21; expires=Wed, 15-Apr-2020 21:27:31 GMT; path=/\r\n";
        let headers: Headers = block.parse().unwrap();

        assert_eq!(headers.len(), 1);
        let cookie = headers.get("set-cookie").unwrap().unwrap_left();
        assert_eq!(
            cookie.get("expires").unwrap().unwrap_left(),
            "Wed, 15-Apr-2020 21:27:31 GMT"
        );
    }

    #[test]
    fn json_content_in_block() {
        let block = "Report-To: {\"group\":\"csp\", \"max_age\":10886400}\r\n";
        let headers: Headers = block.parse().unwrap();

        assert_eq!(headers.len(), 1);
        let report = headers.get("report-to").unwrap().unwrap_left();
        assert_eq!(report.get("group").unwrap().unwrap_left(), "csp");
    }
}
