#![warn(rust_2018_idioms)]
#![warn(missing_docs)]

//! Structured, queryable access to textual header fields.
//!
//! A raw content string such as `text/html; charset="UTF-8"; format=flowed`
//! becomes an ordered collection of named, possibly-repeated,
//! possibly-valueless members that can be read, mutated, inserted, and
//! removed by position or by case-insensitive name. The same model covers
//! HTTP headers and email/IMAP message headers.
//!
//! ```rust
//! use headway::{Header, Headers};
//!
//! let mut header = Header::new("Content-Type", "text/html; charset=UTF-8")?;
//! assert_eq!(header.get("charset").unwrap().unwrap_left(), "UTF-8");
//! assert!(header.has("text/html"));
//!
//! let headers: Headers = "Host: example.org\r\nAllow: GET, POST\r\n".parse()?;
//! assert_eq!(headers.get_all("allow").len(), 2);
//! # Ok::<_, headway::Error>(())
//! ```

pub mod parse;
pub mod registry;
pub mod serializer;
pub mod util;

mod attributes;
mod error;
mod header;
mod headers;

/// Case-preserving, ASCII case-insensitive string types.
///
/// An _uncased_ string is case-preserving: the string itself keeps its
/// cased characters, but comparison (including ordering, equality, and
/// hashing) is ASCII case-insensitive.
pub mod uncased {
    #[doc(inline)]
    pub use uncased::*;
}

pub use crate::attributes::Attributes;
pub use crate::error::{Error, Result};
pub use crate::header::Header;
pub use crate::headers::Headers;

// Re-exported so that one-or-many query results can be matched without
// depending on `either` directly.
pub use either::Either;
