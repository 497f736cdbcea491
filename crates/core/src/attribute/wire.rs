//! The store's JSON wire format for attribute values.
//!
//! Every value is a single-entry object keyed by its type descriptor:
//! `{"S": "x"}`, `{"N": "12"}`, `{"B": "<base64>"}`, `{"SS": ["a"]}`,
//! `{"M": {...}}`, `{"L": [...]}`, `{"NULL": true}`, `{"BOOL": false}`.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{Map, Value};

use super::{AttributeError, AttributeMap, AttributeValue};

const TYPE_TAGS: [&str; 10] = ["S", "N", "B", "SS", "NS", "BS", "M", "L", "NULL", "BOOL"];

/// Encodes a value in wire form.
pub fn to_wire(value: &AttributeValue) -> Value {
    let (tag, inner) = match value {
        AttributeValue::S(s) => ("S", Value::String(s.clone())),
        AttributeValue::N(n) => ("N", Value::String(n.clone())),
        AttributeValue::B(b) => ("B", Value::String(STANDARD.encode(b))),
        AttributeValue::Ss(values) => ("SS", strings(values)),
        AttributeValue::Ns(values) => ("NS", strings(values)),
        AttributeValue::Bs(values) => (
            "BS",
            Value::Array(
                values
                    .iter()
                    .map(|b| Value::String(STANDARD.encode(b)))
                    .collect(),
            ),
        ),
        AttributeValue::M(map) => ("M", map_to_wire(map)),
        AttributeValue::L(values) => ("L", Value::Array(values.iter().map(to_wire).collect())),
        AttributeValue::Null => ("NULL", Value::Bool(true)),
        AttributeValue::Bool(b) => ("BOOL", Value::Bool(*b)),
    };

    let mut object = Map::with_capacity(1);
    object.insert(tag.to_string(), inner);
    Value::Object(object)
}

/// Encodes a whole item in wire form.
pub fn map_to_wire(map: &AttributeMap) -> Value {
    Value::Object(
        map.iter()
            .map(|(name, value)| (name.clone(), to_wire(value)))
            .collect(),
    )
}

/// Decodes a wire-form value.
pub fn from_wire(value: &Value) -> Result<AttributeValue, AttributeError> {
    let object = value
        .as_object()
        .filter(|o| o.len() == 1)
        .ok_or_else(|| AttributeError::Malformed(format!("expected a typed value, got {value}")))?;
    let (tag, inner) = object
        .iter()
        .next()
        .ok_or_else(|| AttributeError::Malformed("empty typed value".to_string()))?;

    match tag.as_str() {
        "S" => Ok(AttributeValue::S(text(tag, inner)?.to_string())),
        "N" => AttributeValue::number_from_str(text(tag, inner)?),
        "B" => Ok(AttributeValue::B(decode_base64(text(tag, inner)?)?)),
        "SS" => AttributeValue::string_set(texts(tag, inner)?),
        "NS" => AttributeValue::number_set_from_strs(texts(tag, inner)?),
        "BS" => {
            let decoded = texts(tag, inner)?
                .into_iter()
                .map(|b| decode_base64(&b))
                .collect::<Result<Vec<_>, _>>()?;
            AttributeValue::binary_set(decoded)
        }
        "M" => Ok(AttributeValue::M(map_from_wire(inner)?)),
        "L" => match inner {
            Value::Array(values) => Ok(AttributeValue::L(
                values.iter().map(from_wire).collect::<Result<_, _>>()?,
            )),
            _ => Err(mismatch(tag, inner)),
        },
        "NULL" => match inner {
            Value::Bool(true) => Ok(AttributeValue::Null),
            _ => Err(mismatch(tag, inner)),
        },
        "BOOL" => match inner {
            Value::Bool(b) => Ok(AttributeValue::Bool(*b)),
            _ => Err(mismatch(tag, inner)),
        },
        other => Err(AttributeError::Malformed(format!("unknown type tag {other:?}"))),
    }
}

/// Decodes a wire-form item.
pub fn map_from_wire(value: &Value) -> Result<AttributeMap, AttributeError> {
    let object = value
        .as_object()
        .ok_or_else(|| AttributeError::Malformed(format!("expected an item map, got {value}")))?;
    object
        .iter()
        .map(|(name, value)| Ok((name.clone(), from_wire(value)?)))
        .collect()
}

/// Whether `value` looks like a single wire-form value: an object with
/// exactly one key that is a known type tag.
pub fn is_wire_value(value: &Value) -> bool {
    value
        .as_object()
        .filter(|o| o.len() == 1)
        .and_then(|o| o.keys().next())
        .is_some_and(|tag| TYPE_TAGS.contains(&tag.as_str()))
}

fn strings(values: &[String]) -> Value {
    Value::Array(values.iter().cloned().map(Value::String).collect())
}

fn text<'a>(tag: &str, inner: &'a Value) -> Result<&'a str, AttributeError> {
    inner.as_str().ok_or_else(|| mismatch(tag, inner))
}

fn texts(tag: &str, inner: &Value) -> Result<Vec<String>, AttributeError> {
    match inner {
        Value::Array(values) => values
            .iter()
            .map(|v| text(tag, v).map(str::to_string))
            .collect(),
        _ => Err(mismatch(tag, inner)),
    }
}

fn decode_base64(encoded: &str) -> Result<Vec<u8>, AttributeError> {
    STANDARD
        .decode(encoded)
        .map_err(|e| AttributeError::Malformed(format!("invalid base64: {e}")))
}

fn mismatch(tag: &str, inner: &Value) -> AttributeError {
    AttributeError::Malformed(format!("invalid payload for {tag}: {inner}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalar_wire_forms() {
        assert_eq!(to_wire(&AttributeValue::string("x")), json!({"S": "x"}));
        assert_eq!(to_wire(&AttributeValue::number(12_i64)), json!({"N": "12"}));
        assert_eq!(to_wire(&AttributeValue::binary(b"hi".to_vec())), json!({"B": "aGk="}));
        assert_eq!(to_wire(&AttributeValue::Null), json!({"NULL": true}));
        assert_eq!(to_wire(&AttributeValue::Bool(false)), json!({"BOOL": false}));
    }

    #[test]
    fn test_item_from_wire() {
        let wire = json!({
            "user_id": {"S": "foobar-1"},
            "date": {"N": "1700000000"},
            "role": {"SS": ["user", "manager"]},
            "meta": {"M": {"flag": {"BOOL": true}}},
            "tags": {"L": [{"S": "a"}, {"NULL": true}]}
        });

        let item = map_from_wire(&wire).unwrap();

        assert_eq!(item["user_id"], AttributeValue::string("foobar-1"));
        assert_eq!(item["date"], AttributeValue::number(1_700_000_000_i64));
        assert_eq!(
            item["role"],
            AttributeValue::string_set(["manager", "user"]).unwrap()
        );
        assert_eq!(item["meta"].as_m().unwrap()["flag"], AttributeValue::Bool(true));
        assert_eq!(item["tags"].as_l().unwrap().len(), 2);
        assert_eq!(map_to_wire(&item)["role"]["SS"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_from_wire_rejects_malformed_values() {
        assert!(from_wire(&json!("plain")).is_err());
        assert!(from_wire(&json!({"S": 1})).is_err());
        assert!(from_wire(&json!({"N": "abc"})).is_err());
        assert!(from_wire(&json!({"SS": []})).is_err());
        assert!(from_wire(&json!({"NULL": false})).is_err());
        assert!(from_wire(&json!({"X": "y"})).is_err());
        assert!(from_wire(&json!({"S": "a", "N": "1"})).is_err());
        assert!(map_from_wire(&json!(["not", "a", "map"])).is_err());
    }

    #[test]
    fn test_is_wire_value() {
        assert!(is_wire_value(&json!({"S": "x"})));
        assert!(is_wire_value(&json!({"NULL": true})));
        assert!(!is_wire_value(&json!({"user_id": "x"})));
        assert!(!is_wire_value(&json!("x")));
        assert!(!is_wire_value(&json!({})));
    }
}
