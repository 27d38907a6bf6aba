//! JSON round-trip for a whole header set.
//!
//! The encoded shape is `{ name: [ { member: value | null | [values] } ] }`:
//! one object per header occurrence, `null` for adjectives, and an array
//! wherever one member name repeats within a single header. Decoding an
//! encoded set yields a semantically equal [`Headers`]; wire-level member
//! order inside a JSON object is preserved, key order across names is not
//! significant for equality.

use serde_json::{Map, Value};

use crate::error::{Error, Result};
use crate::header::Header;
use crate::headers::Headers;

/// Encodes a header set into its nested JSON representation.
pub fn encode(headers: &Headers) -> Value {
    let mut result: Map<String, Value> = Map::new();

    for header in headers.iter() {
        let mut encoded: Map<String, Value> = Map::new();

        for (member, value) in header.iter() {
            let value = match value {
                Some(v) => Value::String(v.to_string()),
                None => Value::Null,
            };

            match encoded.get_mut(member) {
                None => {
                    encoded.insert(member.to_string(), value);
                }
                Some(Value::Array(values)) => values.push(value),
                Some(existing) => {
                    let first = existing.take();
                    *existing = Value::Array(vec![first, value]);
                }
            }
        }

        match result.get_mut(header.name()) {
            Some(Value::Array(group)) => group.push(Value::Object(encoded)),
            _ => {
                result.insert(
                    header.name().to_string(),
                    Value::Array(vec![Value::Object(encoded)]),
                );
            }
        }
    }

    Value::Object(result)
}

/// Decodes a previously encoded header set.
///
/// Fails with [`Error::MalformedContent`] when the value does not have the
/// encoded shape: an object of arrays of objects.
pub fn decode(encoded: &Value) -> Result<Headers> {
    let top = encoded
        .as_object()
        .ok_or_else(|| Error::bad_shape("decoding requires a JSON object at the top level"))?;

    let mut headers = Headers::new();

    for (name, group) in top {
        let group = group
            .as_array()
            .ok_or_else(|| Error::bad_shape("decoding requires first-level values to be lists"))?;

        for encoded_header in group {
            let members = encoded_header
                .as_object()
                .ok_or_else(|| Error::bad_shape("decoding requires each list element to be an object"))?;

            let mut header = Header::new(name, "")?;

            for (member, value) in members {
                match value {
                    Value::Null => header.push_adjective(member),
                    Value::Array(values) => {
                        for value in values {
                            match value {
                                Value::Null => header.push_member(member, None),
                                Value::String(s) => header.push_member(member, Some(s)),
                                other => header.push_member(member, Some(&other.to_string())),
                            }
                        }
                    }
                    Value::String(s) => header.set(member, s),
                    other => header.set(member, other),
                }
            }

            headers.push(header);
        }
    }

    Ok(headers)
}
