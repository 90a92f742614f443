//! Locating and reading the JSON object inside the provider's JS wrapper.
//!
//! The body looks like `quotebridge_v6_line_hs_600000_00_all({...})`. The
//! object is taken from the first `{` to the first `}`; it never nests.

use super::DecodeError;
use serde_json::{Map, Value};

/// Slice the object out of a response body, braces included.
pub fn extract_object(body: &str) -> Result<&str, DecodeError> {
    let start = body.find('{').ok_or(DecodeError::NoPayloadFound)?;
    let end = body.find('}').ok_or(DecodeError::NoPayloadFound)?;
    if end < start {
        return Err(DecodeError::NoPayloadFound);
    }
    Ok(&body[start..=end])
}

/// The parsed payload object. Fields are read lazily so that a bad `price`
/// does not prevent the calendar from decoding.
#[derive(Debug, Clone)]
pub struct Payload {
    fields: Map<String, Value>,
}

impl Payload {
    pub fn from_body(body: &str) -> Result<Self, DecodeError> {
        let object = extract_object(body)?;
        match serde_json::from_str::<Value>(object) {
            Ok(Value::Object(fields)) => Ok(Self { fields }),
            _ => Err(DecodeError::NoPayloadFound),
        }
    }

    fn field(&self, name: &str) -> Result<&Value, DecodeError> {
        self.fields
            .get(name)
            .ok_or_else(|| DecodeError::Malformed(format!("missing field `{name}`")))
    }

    /// A string field such as `dates`, `price` or `volumn`.
    pub fn str_field(&self, name: &str) -> Result<&str, DecodeError> {
        self.field(name)?.as_str().ok_or_else(|| {
            DecodeError::Malformed(format!("field `{name}` is not a string"))
        })
    }

    /// An integer field that may arrive as a number or a numeric string.
    pub fn int_field(&self, name: &str) -> Result<i64, DecodeError> {
        lenient_int(self.field(name)?)
            .ok_or_else(|| DecodeError::Malformed(format!("field `{name}` is not an integer")))
    }

    /// The `sortYear` groups as `(year, count)` pairs, in source order.
    pub fn year_counts(&self) -> Result<Vec<(i64, usize)>, DecodeError> {
        let groups = self
            .field("sortYear")?
            .as_array()
            .ok_or_else(|| DecodeError::Malformed("field `sortYear` is not an array".into()))?;

        groups
            .iter()
            .enumerate()
            .map(|(i, group)| {
                let pair = group.as_array().filter(|p| p.len() >= 2).ok_or_else(|| {
                    DecodeError::Malformed(format!("sortYear[{i}] is not a [year, count] pair"))
                })?;
                let year = lenient_int(&pair[0]).ok_or_else(|| {
                    DecodeError::Malformed(format!("sortYear[{i}] has a non-integer year"))
                })?;
                let count = lenient_int(&pair[1])
                    .and_then(|c| usize::try_from(c).ok())
                    .ok_or_else(|| {
                        DecodeError::Malformed(format!("sortYear[{i}] has an invalid count"))
                    })?;
                Ok((year, count))
            })
            .collect()
    }
}

fn lenient_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
