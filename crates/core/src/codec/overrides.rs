use std::fmt;

use serde_json::Value;

use crate::attribute::{AttributeError, AttributeValue};

use super::structural::{json_type, number_to_json};

/// Encodes one field, already in generic JSON form. `None` omits the
/// attribute from the item.
pub type EncodeFn = fn(&Value) -> Result<Option<AttributeValue>, AttributeError>;

/// Decodes one attribute back into generic JSON form. Receives `None` when the
/// attribute is absent or null, and must then return the field's zero value.
pub type DecodeFn = fn(Option<AttributeValue>) -> Result<Value, AttributeError>;

/// A hand-written conversion for one attribute that the generic pass would
/// get wrong, such as a list of strings stored as a string set.
#[derive(Clone, Copy)]
pub struct FieldOverride {
    attribute: &'static str,
    encode: EncodeFn,
    decode: DecodeFn,
}

impl FieldOverride {
    pub const fn new(attribute: &'static str, encode: EncodeFn, decode: DecodeFn) -> Self {
        Self {
            attribute,
            encode,
            decode,
        }
    }

    /// A `Vec<String>` field stored as `SS`. An empty list is omitted.
    pub const fn string_set(attribute: &'static str) -> Self {
        Self::new(attribute, encode_string_set, decode_string_set)
    }

    /// A list-of-numbers field stored as `NS`. An empty list is omitted.
    pub const fn number_set(attribute: &'static str) -> Self {
        Self::new(attribute, encode_number_set, decode_number_set)
    }

    /// A `Vec<u8>` field stored as `B` rather than a list of numbers.
    pub const fn binary(attribute: &'static str) -> Self {
        Self::new(attribute, encode_binary, decode_binary)
    }

    pub fn attribute(&self) -> &'static str {
        self.attribute
    }

    pub(crate) fn encode(&self, field: &Value) -> Result<Option<AttributeValue>, AttributeError> {
        (self.encode)(field)
    }

    pub(crate) fn decode(
        &self,
        attribute: Option<AttributeValue>,
    ) -> Result<Value, AttributeError> {
        (self.decode)(attribute)
    }
}

impl fmt::Debug for FieldOverride {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldOverride")
            .field("attribute", &self.attribute)
            .finish_non_exhaustive()
    }
}

fn elements<'a>(field: &'a Value, expected: &'static str) -> Result<&'a [Value], AttributeError> {
    match field {
        Value::Array(values) => Ok(values),
        other => Err(AttributeError::UnexpectedType {
            expected,
            found: json_type(other),
        }),
    }
}

fn encode_string_set(field: &Value) -> Result<Option<AttributeValue>, AttributeError> {
    if field.is_null() {
        return Ok(None);
    }
    let values = elements(field, "list of strings")?;
    if values.is_empty() {
        return Ok(None);
    }
    let strings = values
        .iter()
        .map(|v| {
            v.as_str().map(str::to_string).ok_or(AttributeError::UnexpectedType {
                expected: "string",
                found: json_type(v),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    AttributeValue::string_set(strings).map(Some)
}

fn decode_string_set(attribute: Option<AttributeValue>) -> Result<Value, AttributeError> {
    match attribute {
        None => Ok(Value::Array(Vec::new())),
        Some(AttributeValue::Ss(values)) => {
            Ok(Value::Array(values.into_iter().map(Value::String).collect()))
        }
        Some(other) => Err(AttributeError::UnexpectedType {
            expected: "SS",
            found: other.type_name(),
        }),
    }
}

fn encode_number_set(field: &Value) -> Result<Option<AttributeValue>, AttributeError> {
    if field.is_null() {
        return Ok(None);
    }
    let values = elements(field, "list of numbers")?;
    if values.is_empty() {
        return Ok(None);
    }
    let numbers = values
        .iter()
        .map(|v| match v {
            Value::Number(n) => Ok(n.to_string()),
            other => Err(AttributeError::UnexpectedType {
                expected: "number",
                found: json_type(other),
            }),
        })
        .collect::<Result<Vec<_>, _>>()?;
    AttributeValue::number_set_from_strs(numbers).map(Some)
}

fn decode_number_set(attribute: Option<AttributeValue>) -> Result<Value, AttributeError> {
    match attribute {
        None => Ok(Value::Array(Vec::new())),
        Some(AttributeValue::Ns(values)) => values
            .iter()
            .map(|n| number_to_json(n))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Some(other) => Err(AttributeError::UnexpectedType {
            expected: "NS",
            found: other.type_name(),
        }),
    }
}

fn encode_binary(field: &Value) -> Result<Option<AttributeValue>, AttributeError> {
    if field.is_null() {
        return Ok(None);
    }
    let bytes = elements(field, "list of bytes")?
        .iter()
        .map(|v| {
            v.as_u64()
                .and_then(|b| u8::try_from(b).ok())
                .ok_or_else(|| AttributeError::Malformed(format!("{v} is not a byte")))
        })
        .collect::<Result<Vec<u8>, _>>()?;
    Ok(Some(AttributeValue::B(bytes)))
}

fn decode_binary(attribute: Option<AttributeValue>) -> Result<Value, AttributeError> {
    match attribute {
        None => Ok(Value::Array(Vec::new())),
        Some(AttributeValue::B(bytes)) => Ok(Value::Array(
            bytes.into_iter().map(Value::from).collect(),
        )),
        Some(other) => Err(AttributeError::UnexpectedType {
            expected: "B",
            found: other.type_name(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_set_round_trip() {
        let set = FieldOverride::string_set("role");

        let encoded = set.encode(&json!(["user", "manager", "user"])).unwrap().unwrap();
        assert_eq!(encoded, AttributeValue::string_set(["manager", "user"]).unwrap());

        let decoded = set.decode(Some(encoded)).unwrap();
        assert_eq!(decoded, json!(["user", "manager"]));
    }

    #[test]
    fn test_empty_string_set_is_omitted() {
        let set = FieldOverride::string_set("role");
        assert_eq!(set.encode(&json!([])).unwrap(), None);
        assert_eq!(set.encode(&Value::Null).unwrap(), None);
        assert_eq!(set.decode(None).unwrap(), json!([]));
    }

    #[test]
    fn test_string_set_rejects_wrong_shapes() {
        let set = FieldOverride::string_set("role");
        assert_eq!(
            set.encode(&json!("user")),
            Err(AttributeError::UnexpectedType {
                expected: "list of strings",
                found: "string",
            })
        );
        assert_eq!(
            set.decode(Some(AttributeValue::L(Vec::new()))),
            Err(AttributeError::UnexpectedType {
                expected: "SS",
                found: "L",
            })
        );
    }

    #[test]
    fn test_number_set_round_trip() {
        let set = FieldOverride::number_set("scores");

        let encoded = set.encode(&json!([3, 1, 2.5])).unwrap().unwrap();
        assert_eq!(encoded, AttributeValue::number_set_from_strs(["1", "2.5", "3"]).unwrap());

        let decoded = set.decode(Some(encoded)).unwrap();
        assert_eq!(decoded, json!([3, 1, 2.5]));
    }

    #[test]
    fn test_binary_round_trip() {
        let binary = FieldOverride::binary("avatar");

        let encoded = binary.encode(&json!([104, 105])).unwrap().unwrap();
        assert_eq!(encoded, AttributeValue::binary(b"hi".to_vec()));
        assert_eq!(binary.decode(Some(encoded)).unwrap(), json!([104, 105]));
        assert!(binary.encode(&json!([300])).is_err());
    }

    #[test]
    fn test_debug_names_attribute() {
        let rendered = format!("{:?}", FieldOverride::string_set("role"));
        assert!(rendered.contains("role"));
    }
}
