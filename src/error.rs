//! Errors arising from constructing or manipulating headers.

use std::fmt;

/// The error type returned by fallible header operations.
///
/// Every failure is local and synchronous: a mutating operation that returns
/// an `Error` has not modified the structure it was called on.
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// A header or attribute name contains a forbidden character.
    InvalidName(String),
    /// The requested attribute or header name has no matching occurrence.
    KeyNotFound(String),
    /// The requested position does not resolve to an occupied index.
    IndexOutOfRange(isize),
    /// Conflicting or unusable parameters were supplied.
    InvalidArgument(&'static str),
    /// Content that looked like a JSON document failed to decode, or a
    /// serialized header set did not have the expected shape.
    MalformedContent(String, Option<serde_json::Error>),
}

impl Error {
    pub(crate) fn malformed(what: impl Into<String>, source: serde_json::Error) -> Error {
        Error::MalformedContent(what.into(), Some(source))
    }

    pub(crate) fn bad_shape(what: impl Into<String>) -> Error {
        Error::MalformedContent(what.into(), None)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidName(name) => write!(f, "'{name}' is not a valid header name"),
            Error::KeyNotFound(key) => write!(f, "'{key}' has no matching occurrence"),
            Error::IndexOutOfRange(index) => write!(f, "index {index} is not occupied"),
            Error::InvalidArgument(reason) => reason.fmt(f),
            Error::MalformedContent(what, Some(e)) => write!(f, "{what}: {e}"),
            Error::MalformedContent(what, None) => what.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::MalformedContent(_, Some(e)) => Some(e),
            _ => None,
        }
    }
}

/// A specialized `Result` whose error is [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;
