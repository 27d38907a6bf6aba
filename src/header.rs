//! A single header: a name and its structured content.

use std::fmt;

use either::Either;
use serde_json::Value;

use crate::attributes::Attributes;
use crate::error::{Error, Result};
use crate::headers::Headers;
use crate::parse::{is_json_object, split_content, Delimiter};
use crate::util::{extract_comments, is_legal_name, normalize_str, prettify_name, unfold, unquote};

/// A header name paired with its content, kept in sync with the
/// [`Attributes`] index derived from that content.
///
/// The declared name is preserved as given; a normalized form (lowercase,
/// `-` folded to `_`) drives every comparison and a prettified form
/// (`content_type` becomes `Content-Type`) is available for display. Every
/// mutation re-renders the content string from the index, and fresh content
/// is re-tokenized into a fresh index, so the two views never drift apart.
///
/// ```rust
/// use headway::Header;
///
/// let mut header = Header::new("Content-Type", "text/html; charset=UTF-8")?;
/// assert_eq!(header.get("charset").unwrap().unwrap_left(), "UTF-8");
/// assert!(header.has("text/html"));
///
/// header.set("charset", "ASCII");
/// assert_eq!(header.to_string(), r#"Content-Type: text/html; charset="ASCII""#);
/// # Ok::<_, headway::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Header {
    name: String,
    normalized_name: String,
    pretty_name: String,
    content: String,
    members: Vec<String>,
    attrs: Attributes,
}

impl Header {
    /// Constructs a header from a declared name and its raw content.
    ///
    /// Fails with [`Error::InvalidName`] if `name` contains anything other
    /// than printable ASCII free of separators, quotes, and whitespace.
    ///
    /// Content is split on `;` into members, except when it is a JSON
    /// object or array literal: then each JSON entry becomes one member
    /// (`null` values become adjectives) and undecodable JSON fails with
    /// [`Error::MalformedContent`].
    pub fn new(name: &str, content: &str) -> Result<Header> {
        if !is_legal_name(name) {
            return Err(Error::InvalidName(name.to_string()));
        }

        let members = if is_json_object(content) {
            json_members(name, content)?
        } else {
            split_content(content, Delimiter::SemiColon)
        };

        let attrs = Attributes::from_members(&members);

        Ok(Header {
            name: name.to_string(),
            normalized_name: normalize_str(name),
            pretty_name: prettify_name(name),
            content: content.to_string(),
            members,
            attrs,
        })
    }

    /// The header name as it was captured initially.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name normalized for comparison: lowercase, `-` folded to `_`.
    pub fn normalized_name(&self) -> &str {
        &self.normalized_name
    }

    /// The prettified name: each `-`-separated segment capitalized.
    pub fn pretty_name(&self) -> &str {
        &self.pretty_name
    }

    /// The associated content. A single-member content is implicitly
    /// unquoted, so an entity tag reads back without its wrapping quotes.
    ///
    /// ```rust
    /// # use headway::Header;
    /// let etag = Header::new("ETag", "\"33a64df551425fcc55e4\"")?;
    /// assert_eq!(etag.content(), "33a64df551425fcc55e4");
    /// # Ok::<_, headway::Error>(())
    /// ```
    pub fn content(&self) -> &str {
        if self.attrs.len() == 1 {
            return unquote(&self.content);
        }

        &self.content
    }

    /// The content with any folded line (CRLF + spaces) flattened out.
    pub fn unfolded_content(&self) -> String {
        unfold(self.content())
    }

    /// Every parenthesized comment found in the content, in order.
    pub fn comments(&self) -> Vec<String> {
        extract_comments(self.content())
    }

    /// All member names in position order, adjectives included.
    pub fn attrs(&self) -> Vec<&str> {
        self.attrs.iter().map(|(_, key, _)| key).collect()
    }

    /// The distinct member names that carry at least one value.
    pub fn valued_attrs(&self) -> Vec<&str> {
        self.attrs.keys()
    }

    /// Case-insensitively checks for a member or attribute name. A
    /// space-separated adjective also matches on its individual words, so a
    /// `Bearer token` authorization content has both `bearer` and `token`.
    pub fn has(&self, item: &str) -> bool {
        let item = normalize_str(item);

        self.attrs().iter().any(|attr| {
            let target = normalize_str(attr);
            item == target || split_content(&target, Delimiter::Space).contains(&item)
        })
    }

    /// Retrieves the value(s) of an attribute, case-insensitively, unquoted
    /// and unfolded. Returns `None` when no *valued* occurrence exists.
    pub fn get(&self, attr: &str) -> Option<Either<String, Vec<String>>> {
        let polish = |v: &str| unfold(unquote(v));

        match self.attrs.get(attr)? {
            Either::Left(value) => Some(Either::Left(polish(value))),
            Either::Right(values) => {
                Some(Either::Right(values.into_iter().map(polish).collect()))
            }
        }
    }

    /// Returns `true` if `name` has more than one valued occurrence.
    pub fn has_many(&self, name: &str) -> bool {
        matches!(self.attrs.get(name), Some(Either::Right(values)) if values.len() > 1)
    }

    /// The raw member at a (possibly negative) position.
    pub fn member(&self, index: isize) -> Result<&str> {
        let resolved = wrap_index(index, self.members.len())?;

        self.members
            .get(resolved)
            .map(String::as_str)
            .ok_or(Error::IndexOutOfRange(index))
    }

    /// Replaces every prior occurrence of `key`, valued or not, with a
    /// single fresh `key=value` appended at the end. Non-string values are
    /// coerced through their display form.
    pub fn set(&mut self, key: &str, value: impl fmt::Display) {
        // Cannot fail: no position or mode involved.
        let _ = self.attrs.remove(key, None, None);
        self.attrs.push(key, Some(&value.to_string()));
        self.resync();
    }

    /// Removes every valued occurrence of `key`.
    ///
    /// Fails with [`Error::KeyNotFound`] if `key` has no valued occurrence:
    /// removing a bare adjective must go through
    /// [`remove_adjective()`](Self::remove_adjective) instead.
    pub fn delete(&mut self, key: &str) -> Result<()> {
        if self.attrs.get(key).is_none() {
            return Err(Error::KeyNotFound(key.to_string()));
        }

        self.attrs.remove(key, None, Some(true))?;
        self.resync();
        Ok(())
    }

    /// Removes every bare (valueless) occurrence of `member`.
    ///
    /// Fails with [`Error::KeyNotFound`] if the header does not contain it.
    pub fn remove_adjective(&mut self, member: &str) -> Result<()> {
        if !self.has(member) {
            return Err(Error::KeyNotFound(member.to_string()));
        }

        self.attrs.remove(member, None, Some(false))?;
        self.resync();
        Ok(())
    }

    /// Appends a new bare member at the end, leaving the existing content
    /// string untouched otherwise.
    pub fn push_adjective(&mut self, member: &str) {
        self.attrs.push(member, None);

        if self.content.trim_start().is_empty() {
            self.content = member.to_string();
            self.members.clear();
        } else {
            self.content.push_str("; ");
            self.content.push_str(member);
        }

        self.members.push(member.to_string());
    }

    /// Appends a member at the end, valued or not, re-rendering the
    /// content canonically.
    pub fn push_member(&mut self, key: &str, value: Option<&str>) {
        self.attrs.push(key, value);
        self.resync();
    }

    /// Inserts a member before the given (possibly negative) position.
    ///
    /// ```rust
    /// # use headway::Header;
    /// let mut header = Header::new("Content-Type", "application/json; format=flowed")?;
    /// header.insert(1, "charset", Some("UTF-8"));
    /// assert_eq!(header.to_string(),
    ///            r#"Content-Type: application/json; charset="UTF-8"; format="flowed""#);
    /// # Ok::<_, headway::Error>(())
    /// ```
    pub fn insert(&mut self, index: isize, key: &str, value: Option<&str>) {
        let len = self.attrs.len().max(1);
        let index = if index >= 0 { index } else { index.rem_euclid(len as isize) };

        self.attrs.insert(index, key, value);
        self.resync();
    }

    /// Removes and returns the `(name, value)` occurrence at a (possibly
    /// negative) position.
    pub fn pop(&mut self, index: isize) -> Result<(String, Option<String>)> {
        let resolved = wrap_index(index, self.attrs.len())?;

        let (key, value) = self
            .attrs
            .get_index(resolved)
            .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
            .ok_or(Error::IndexOutOfRange(index))?;

        self.attrs.remove(&key, Some(resolved as isize), None)?;
        self.resync();

        Ok((key, value))
    }

    /// Removes every occurrence of `key` and returns its value(s).
    ///
    /// Fails with [`Error::KeyNotFound`] if `key` has no valued occurrence.
    pub fn pop_key(&mut self, key: &str) -> Result<(String, Either<String, Vec<String>>)> {
        let values = self
            .attrs
            .get(key)
            .map(|v| v.map_either(str::to_string, |vs| {
                vs.into_iter().map(str::to_string).collect::<Vec<_>>()
            }))
            .ok_or_else(|| Error::KeyNotFound(key.to_string()))?;

        self.attrs.remove(key, None, None)?;
        self.resync();

        Ok((key.to_string(), values))
    }

    /// Iterates over all occurrences as `(name, value)` pairs, in position
    /// order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> + '_ {
        self.attrs.iter().map(|(_, key, value)| (key, value))
    }

    /// Returns `true` if `item` case-insensitively matches a bare member.
    fn matches_adjective(&self, item: &str) -> bool {
        self.iter()
            .any(|(key, value)| value.is_none() && normalize_str(key) == normalize_str(item))
    }

    /// Re-renders content from the index and re-splits the member list.
    fn resync(&mut self) {
        self.content = self.attrs.to_string();
        self.members = split_content(&self.content, Delimiter::SemiColon);
    }
}

fn json_members(name: &str, content: &str) -> Result<Vec<String>> {
    let payload: Value = serde_json::from_str(content)
        .map_err(|e| Error::malformed(format!("header '{name}' holds invalid JSON"), e))?;

    let stringify = |value: &Value| match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    match payload {
        Value::Array(items) => Ok(items.iter().map(stringify).collect()),
        Value::Object(entries) => Ok(entries
            .iter()
            .map(|(key, value)| match value {
                Value::Null => key.clone(),
                other => format!("{key}={}", stringify(other)),
            })
            .collect()),
        _ => Err(Error::bad_shape(format!("header '{name}' is malformed"))),
    }
}

fn wrap_index(index: isize, len: usize) -> Result<usize> {
    if index >= 0 {
        return Ok(index as usize);
    }

    match len {
        0 => Err(Error::IndexOutOfRange(index)),
        len => Ok(index.rem_euclid(len as isize) as usize),
    }
}

/// The wire line: `Name: content`.
impl fmt::Display for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.content)
    }
}

/// Names compare after normalization; attribute indexes compare as
/// order-independent multisets.
impl PartialEq for Header {
    fn eq(&self, other: &Header) -> bool {
        self.normalized_name == other.normalized_name && self.attrs == other.attrs
    }
}

impl Eq for Header {}

/// A string equals a header when it matches the (unquoted) content exactly
/// or matches one of the header's adjectives.
impl PartialEq<str> for Header {
    fn eq(&self, other: &str) -> bool {
        self.content() == other || self.matches_adjective(other)
    }
}

impl PartialEq<&str> for Header {
    fn eq(&self, other: &&str) -> bool {
        self == *other
    }
}

impl PartialEq<Header> for str {
    fn eq(&self, other: &Header) -> bool {
        other == self
    }
}

/// Joining two headers yields a two-entry collection.
impl std::ops::Add for Header {
    type Output = Headers;

    fn add(self, other: Header) -> Headers {
        let mut headers = Headers::new();
        headers.push(self);
        headers.push(other);
        headers
    }
}
