//! The ordered, case-insensitive attribute index backing a [`Header`].
//!
//! [`Header`]: crate::Header

use std::fmt;

use either::Either;
use indexmap::IndexMap;
use uncased::Uncased;

use crate::error::{Error, Result};
use crate::util::{escape_double_quote, normalize_str, unescape_double_quote, unquote};

/// Every occurrence of one attribute name: parallel lists of values and
/// dense positions, plus the spelling seen first.
#[derive(Debug, Clone)]
struct Occurrences {
    name: String,
    values: Vec<Option<String>>,
    positions: Vec<usize>,
}

/// An ordered multimap from case-insensitive attribute names to their
/// values, each occurrence tagged with a dense zero-based position.
///
/// A valueless occurrence is an *adjective* (a bare flag such as `HttpOnly`);
/// a valued one is an *attribute* (`charset=UTF-8`). The same name may occur
/// any number of times, valued or not. At all times the positions across all
/// names form exactly `{0, .., len - 1}`: insertion and removal renumber the
/// remaining occurrences to keep the range gap-free.
///
/// Name lookups ignore ASCII case and treat `-` and `_` as equal.
#[derive(Debug, Clone, Default)]
pub struct Attributes {
    bag: IndexMap<Uncased<'static>, Occurrences>,
}

/// The lookup key for `name`: `-` folded to `_`, case handled by `Uncased`.
fn bag_key(name: &str) -> Uncased<'static> {
    Uncased::from(name.replace('-', "_"))
}

impl Attributes {
    /// An empty index.
    pub fn new() -> Attributes {
        Attributes::default()
    }

    /// Builds an index from already-split members, classifying each one as
    /// an adjective or an attribute.
    ///
    /// A member containing `=` is split into a key/value pair unless the
    /// would-be value consists entirely of `=` characters, is empty, or the
    /// would-be key contains a space. The guard keeps Base64 padding such as
    /// `dGVzdA==` from being mistaken for an assignment; it is knowingly
    /// heuristic and can swallow legitimate but odd-looking attributes.
    ///
    /// Quoted values are stripped of their outer quotes and `\"` escapes.
    pub fn from_members<T: AsRef<str>>(members: &[T]) -> Attributes {
        let mut attributes = Attributes::new();

        for member in members.iter().map(T::as_ref) {
            if member.is_empty() {
                continue;
            }

            if let Some((key, value)) = member.split_once('=') {
                let base64_lookalike = value.chars().all(|c| c == '=') || value.is_empty();

                if !base64_lookalike && !key.contains(' ') {
                    let value = unescape_double_quote(unquote(value));
                    attributes.push(key, Some(&value));
                    continue;
                }
            }

            attributes.push(unquote(member), None);
        }

        attributes
    }

    /// The dense length: highest occupied position plus one, **not** the
    /// number of distinct names.
    pub fn len(&self) -> usize {
        self.bag
            .values()
            .flat_map(|occ| occ.positions.iter().copied())
            .max()
            .map_or(0, |max| max + 1)
    }

    /// Returns `true` if no occurrence is present.
    pub fn is_empty(&self) -> bool {
        self.bag.is_empty()
    }

    /// Appends an occurrence at the next free position.
    pub fn push(&mut self, key: &str, value: Option<&str>) {
        let position = self.len();
        self.place(key, value, position);
    }

    /// Inserts an occurrence *before* `index`, shifting every occurrence at
    /// or after it one position up.
    ///
    /// A negative `index` wraps around the current length; an `index` beyond
    /// the end appends.
    pub fn insert(&mut self, index: isize, key: &str, value: Option<&str>) {
        let index = self.wrap(index).min(self.len());

        for occ in self.bag.values_mut() {
            for position in occ.positions.iter_mut() {
                if *position >= index {
                    *position += 1;
                }
            }
        }

        self.place(key, value, index);
    }

    fn place(&mut self, key: &str, value: Option<&str>, position: usize) {
        let occ = self.bag.entry(bag_key(key)).or_insert_with(|| Occurrences {
            name: key.to_string(),
            values: vec![],
            positions: vec![],
        });

        occ.values.push(value.map(str::to_string));
        occ.positions.push(position);
    }

    /// Removes occurrences of `key` and renumbers the survivors.
    ///
    /// Three mutually exclusive modes:
    ///
    ///   * `position: Some(_)` removes the single occurrence of `key` at
    ///     that (possibly negative) position;
    ///   * `with_value: Some(true)` removes only the valued occurrences,
    ///     `Some(false)` only the adjectives;
    ///   * neither set removes every occurrence of `key`.
    ///
    /// Setting both `position` and `with_value` fails with
    /// [`Error::InvalidArgument`] before any mutation. A `key` with no
    /// occurrence at all is a quiet no-op.
    pub fn remove(
        &mut self,
        key: &str,
        position: Option<isize>,
        with_value: Option<bool>,
    ) -> Result<()> {
        if position.is_some() && with_value.is_some() {
            return Err(Error::InvalidArgument(
                "cannot remove by position and by value-presence at once",
            ));
        }

        let bag_key = bag_key(key);
        if !self.bag.contains_key(&bag_key) {
            return Ok(());
        }

        let resolved = match position {
            Some(index) if index >= 0 => Some(index as usize),
            Some(index) => match self.len() {
                0 => return Err(Error::IndexOutOfRange(index)),
                len => Some(index.rem_euclid(len as isize) as usize),
            },
            None => None,
        };

        let mut freed: Vec<usize> = Vec::new();

        let now_empty = if let Some(occ) = self.bag.get_mut(&bag_key) {
            match (resolved, with_value) {
                (Some(index), _) => {
                    let slot = occ
                        .positions
                        .iter()
                        .position(|&p| p == index)
                        .ok_or(Error::IndexOutOfRange(index as isize))?;

                    occ.values.remove(slot);
                    freed.push(occ.positions.remove(slot));
                }
                (None, Some(valued)) => {
                    let mut slot = 0;
                    while slot < occ.values.len() {
                        if occ.values[slot].is_some() == valued {
                            occ.values.remove(slot);
                            freed.push(occ.positions.remove(slot));
                        } else {
                            slot += 1;
                        }
                    }
                }
                (None, None) => {
                    occ.values.clear();
                    freed.append(&mut occ.positions);
                }
            }

            occ.values.is_empty()
        } else {
            false
        };

        if now_empty {
            self.bag.shift_remove(&bag_key);
        }

        // Close the gaps: each survivor drops by the number of freed
        // positions below it.
        for occ in self.bag.values_mut() {
            for position in occ.positions.iter_mut() {
                *position -= freed.iter().filter(|&&f| f < *position).count();
            }
        }

        Ok(())
    }

    /// Case-insensitively fetches the value(s) associated with `key`, in
    /// position order.
    ///
    /// Returns `None` when `key` has no *valued* occurrence; adjectives are
    /// invisible to this accessor.
    pub fn get(&self, key: &str) -> Option<Either<&str, Vec<&str>>> {
        let occ = self.bag.get(&bag_key(key))?;

        let mut values: Vec<(usize, &str)> = occ
            .positions
            .iter()
            .zip(occ.values.iter())
            .filter_map(|(&p, v)| v.as_deref().map(|v| (p, v)))
            .collect();

        values.sort_by_key(|&(p, _)| p);

        match values.as_slice() {
            [] => None,
            [(_, single)] => Some(Either::Left(single)),
            _ => Some(Either::Right(values.into_iter().map(|(_, v)| v).collect())),
        }
    }

    /// Fetches the `(name, value)` occurrence at a dense position.
    pub fn get_index(&self, index: usize) -> Option<(&str, Option<&str>)> {
        for occ in self.bag.values() {
            if let Some(slot) = occ.positions.iter().position(|&p| p == index) {
                return Some((&occ.name, occ.values[slot].as_deref()));
            }
        }

        None
    }

    /// Iterates over all occurrences in position order as
    /// `(position, name, value)` triples.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &str, Option<&str>)> + '_ {
        (0..self.len()).filter_map(|i| self.get_index(i).map(|(k, v)| (i, k, v)))
    }

    /// The distinct names that have at least one value, in position order.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();

        for (_, key, value) in self.iter() {
            if value.is_some() && !keys.iter().any(|&k| bag_key(k) == bag_key(key)) {
                keys.push(key);
            }
        }

        keys
    }

    /// Returns `true` if `key` occurs at all, valued or not.
    pub fn contains_key(&self, key: &str) -> bool {
        self.bag.contains_key(&bag_key(key))
    }

    /// Returns `true` if some occurrence of `key` carries exactly `value`.
    ///
    /// The name comparison is case-insensitive, the value comparison is not.
    pub fn has_pair(&self, key: &str, value: &str) -> bool {
        let key = bag_key(key);

        self.bag.get(&key).is_some_and(|occ| {
            occ.values.iter().any(|v| v.as_deref() == Some(value))
        })
    }

    fn wrap(&self, index: isize) -> usize {
        if index >= 0 {
            return index as usize;
        }

        match self.len() {
            0 => 0,
            len => index.rem_euclid(len as isize) as usize,
        }
    }
}

/// Two indexes are equal when they hold the same multiset of occurrences;
/// occurrence order affects serialization, never equality. Valued
/// occurrences compare with a case-folded key and an exact value; an
/// adjective is one opaque token and compares exactly, case included.
impl PartialEq for Attributes {
    fn eq(&self, other: &Attributes) -> bool {
        fn pairs(attrs: &Attributes) -> Vec<(String, Option<&str>)> {
            let mut pairs: Vec<_> = attrs
                .iter()
                .map(|(_, key, value)| match value {
                    Some(_) => (normalize_str(key), value),
                    None => (key.to_string(), None),
                })
                .collect();

            pairs.sort();
            pairs
        }

        self.len() == other.len() && pairs(self) == pairs(other)
    }
}

impl Eq for Attributes {}

/// Serializes back to the canonical `; `-joined wire form: adjectives as
/// bare tokens, attributes as `key="value"` with embedded quotes re-escaped.
impl fmt::Display for Attributes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, key, value) in self.iter() {
            if position > 0 {
                f.write_str("; ")?;
            }

            match value {
                Some(value) => write!(f, "{}=\"{}\"", key, escape_double_quote(value))?,
                None => f.write_str(key)?,
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::{split_content, Delimiter};

    fn from_content(content: &str) -> Attributes {
        Attributes::from_members(&split_content(content, Delimiter::SemiColon))
    }

    #[track_caller]
    fn assert_dense(attrs: &Attributes) {
        let mut positions: Vec<usize> = attrs
            .bag
            .values()
            .flat_map(|occ| occ.positions.iter().copied())
            .collect();

        positions.sort_unstable();
        let expected: Vec<usize> = (0..positions.len()).collect();
        assert_eq!(positions, expected, "positions must be dense and gap-free");
        assert_eq!(attrs.len(), expected.len());
    }

    #[test]
    fn classification() {
        let attrs = from_content("text/html; charset=UTF-8; format=flowed");
        assert_eq!(attrs.len(), 3);
        assert_eq!(attrs.get("charset"), Some(Either::Left("UTF-8")));
        assert_eq!(attrs.get_index(0), Some(("text/html", None)));
        assert_eq!(attrs.get("text/html"), None);
        assert_dense(&attrs);
    }

    #[test]
    fn base64_padding_is_an_adjective() {
        let attrs = from_content("dGVzdA==; sig=");
        assert_eq!(attrs.get_index(0), Some(("dGVzdA==", None)));
        assert_eq!(attrs.get_index(1), Some(("sig=", None)));
        assert_eq!(attrs.get("dGVzdA"), None);

        // A space in the would-be key also disqualifies the split.
        let attrs = from_content("One ring=to rule them all");
        assert_eq!(attrs.get_index(0), Some(("One ring=to rule them all", None)));
    }

    #[test]
    fn one_to_many_values_in_order() {
        let attrs = from_content("gem=power; gem=mind; gem=soul; gems");
        assert_eq!(
            attrs.get("GEM"),
            Some(Either::Right(vec!["power", "mind", "soul"]))
        );
        assert_eq!(attrs.len(), 4);
        assert!(attrs.contains_key("gems"));
        assert_dense(&attrs);
    }

    #[test]
    fn quoted_value_round_trip() {
        let attrs = from_content(r#"text/html; charset="UTF-\"8""#);
        assert_eq!(attrs.get("charset"), Some(Either::Left("UTF-\"8")));
        assert_eq!(attrs.to_string(), r#"text/html; charset="UTF-\"8""#);
    }

    #[test]
    fn serialization() {
        let attrs = from_content("text/html; charset=UTF-8");
        assert_eq!(attrs.to_string(), r#"text/html; charset="UTF-8""#);

        let mut attrs = attrs;
        attrs.push("charset", None);
        assert_eq!(attrs.to_string(), r#"text/html; charset="UTF-8"; charset"#);
    }

    #[test]
    fn positioned_insert() {
        let mut attrs = from_content("text/html; charset");
        attrs.insert(1, "charset", Some("UTF-8"));
        assert_eq!(attrs.to_string(), r#"text/html; charset="UTF-8"; charset"#);

        attrs.insert(-1, "hello", None);
        assert_eq!(
            attrs.to_string(),
            r#"text/html; charset="UTF-8"; hello; charset"#
        );
        assert_dense(&attrs);

        // Out-of-range insert clamps to an append.
        attrs.insert(99, "tail", None);
        assert_eq!(attrs.get_index(4), Some(("tail", None)));
        assert_dense(&attrs);
    }

    #[test]
    fn removal_modes() {
        let mut attrs = from_content("text/html; charset=UTF-8; charset");
        attrs.remove("charset", Some(1), None).unwrap();
        assert_eq!(attrs.to_string(), "text/html; charset");
        assert_dense(&attrs);

        let mut attrs = from_content("text/html; charset=UTF-8; charset");
        attrs.remove("charset", None, Some(false)).unwrap();
        assert_eq!(attrs.to_string(), r#"text/html; charset="UTF-8""#);

        let mut attrs = from_content("text/html; charset=UTF-8; charset");
        attrs.remove("charset", None, None).unwrap();
        assert_eq!(attrs.to_string(), "text/html");
        assert_dense(&attrs);
    }

    #[test]
    fn removal_argument_conflicts() {
        let mut attrs = from_content("a; b=1");

        let err = attrs.remove("b", Some(1), Some(true)).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert_eq!(attrs.to_string(), r#"a; b="1""#, "failed remove must not mutate");

        let err = attrs.remove("b", Some(5), None).unwrap_err();
        assert!(matches!(err, Error::IndexOutOfRange(5)));

        // Unknown keys are a quiet no-op.
        attrs.remove("missing", None, None).unwrap();
        assert_eq!(attrs.len(), 2);
    }

    #[test]
    fn insert_remove_symmetry() {
        let before = from_content("a; b=k; z=0");

        let mut attrs = before.clone();
        attrs.insert(1, "extra", Some("v"));
        assert_dense(&attrs);
        attrs.remove("extra", Some(1), None).unwrap();

        assert_eq!(attrs, before);
        assert_eq!(attrs.to_string(), before.to_string());
    }

    #[test]
    fn equality_is_order_independent() {
        let a = Attributes::from_members(&["a", "p=8a", "a", "XX"]);
        let b = Attributes::from_members(&["p=8a", "a", "a", "XX"]);
        let c = Attributes::from_members(&["P=8a", "a", "a", "XX"]);
        let d = Attributes::from_members(&["p=8a", "a", "a", "XX", "XX=a"]);
        let e = Attributes::from_members(&["p=8A", "a", "a", "XX"]);

        assert_eq!(a, b);
        assert_eq!(a, c, "valued keys compare case-insensitively");
        assert_ne!(a, d);
        assert_ne!(a, e, "values compare case-sensitively");
    }

    #[test]
    fn adjectives_compare_case_sensitively() {
        let lower = Attributes::from_members(&["x", "q=1"]);
        let upper = Attributes::from_members(&["X", "q=1"]);
        let mixed = Attributes::from_members(&["x", "Q=1"]);

        assert_ne!(lower, upper, "an adjective is one opaque token");
        assert_eq!(lower, mixed);
    }

    #[test]
    fn pair_lookup() {
        let attrs = Attributes::from_members(&["application/xml", "q=0.9", "q=0.1"]);
        assert!(attrs.has_pair("Q", "0.9"));
        assert!(!attrs.has_pair("Q", "0.2"));
        assert!(!attrs.has_pair("z", "0.9"));
    }

    #[test]
    fn dense_invariant_under_churn() {
        let mut attrs = Attributes::new();

        for i in 0..8 {
            attrs.push("k", Some(&i.to_string()));
            assert_dense(&attrs);
        }

        attrs.insert(3, "mid", None);
        assert_dense(&attrs);
        attrs.remove("k", None, Some(true)).unwrap();
        assert_dense(&attrs);
        assert_eq!(attrs.to_string(), "mid");
    }
}
