//! Generic conversion between serde records and attribute maps.
//!
//! A record is first serialized to a `serde_json::Value` object; each field
//! then maps structurally (string to `S`, number to `N`, bool to `BOOL`,
//! null to `NULL`, sequence to `L`, struct or map to `M`). Sets and binary have
//! no JSON counterpart and go through [`FieldOverride`]s instead.

use std::any::type_name;
use std::cell::RefCell;

use serde::de::value::MapDeserializer;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Number, Value};

use crate::attribute::{validate_number, AttributeError, AttributeMap, AttributeValue};
use crate::error::{Result, TableError};
use crate::key::KeyResolver;

use super::FieldOverride;

/// Field-by-field codec with an ordered list of per-attribute overrides.
///
/// Overrides are pulled out of the record before the generic pass and put
/// back afterwards, in both directions.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralCodec {
    overrides: &'static [FieldOverride],
}

impl StructuralCodec {
    pub const fn new() -> Self {
        Self { overrides: &[] }
    }

    pub const fn with_overrides(overrides: &'static [FieldOverride]) -> Self {
        Self { overrides }
    }

    pub fn overrides(&self) -> &[FieldOverride] {
        self.overrides
    }

    /// Converts every field of `record` into an attribute.
    pub fn encode<T: Serialize + ?Sized>(&self, record: &T) -> Result<AttributeMap> {
        let value = serde_json::to_value(record)
            .map_err(|e| TableError::conversion(type_name::<T>(), e))?;
        let mut fields = match value {
            Value::Object(fields) => fields,
            other => {
                return Err(TableError::conversion(
                    type_name::<T>(),
                    format!("expected a struct or map, found {}", json_type(&other)),
                ))
            }
        };

        let mut overridden = Vec::with_capacity(self.overrides.len());
        for field_override in self.overrides {
            let name = field_override.attribute();
            if let Some(field) = fields.remove(name) {
                let encoded = field_override
                    .encode(&field)
                    .map_err(|e| TableError::conversion(name, e))?;
                if let Some(encoded) = encoded {
                    overridden.push((name, encoded));
                }
            }
        }

        let mut item = AttributeMap::with_capacity(fields.len() + overridden.len());
        for (name, field) in fields {
            let value = encode_value(field).map_err(|e| TableError::conversion(&name, e))?;
            item.insert(name, value);
        }
        for (name, value) in overridden {
            item.insert(name.to_string(), value);
        }

        Ok(item)
    }

    /// Rebuilds a record from an item. Null attributes are treated as absent
    /// so that defaulted fields come back at their zero value.
    pub fn decode<T: DeserializeOwned>(&self, mut item: AttributeMap) -> Result<T> {
        let mut overridden = Vec::with_capacity(self.overrides.len());
        for field_override in self.overrides {
            let name = field_override.attribute();
            let attribute = item.remove(name).filter(|v| !v.is_null());
            let decoded = field_override
                .decode(attribute)
                .map_err(|e| TableError::conversion(name, e))?;
            overridden.push((name, decoded));
        }

        let mut fields = Map::new();
        for (name, attribute) in item {
            if attribute.is_null() {
                continue;
            }
            let value = decode_value(attribute).map_err(|e| TableError::conversion(&name, e))?;
            fields.insert(name, value);
        }
        for (name, value) in overridden {
            fields.insert(name.to_string(), value);
        }

        deserialize_fields(fields)
    }
}

/// Marshals a record, short-circuiting key-only records to their primary key.
///
/// This is the usual body of [`ItemCodec::marshal_item`](super::ItemCodec).
pub fn marshal_keyed<R>(record: &R, codec: &StructuralCodec) -> Result<AttributeMap>
where
    R: Serialize + KeyResolver + ?Sized,
{
    if record.is_key_only() {
        return Ok(record.primary_key());
    }
    codec.encode(record)
}

/// Converts one generic JSON value into an attribute.
pub fn encode_value(value: Value) -> std::result::Result<AttributeValue, AttributeError> {
    Ok(match value {
        Value::Null => AttributeValue::Null,
        Value::Bool(b) => AttributeValue::Bool(b),
        Value::Number(n) => AttributeValue::number_from_str(&n.to_string())?,
        Value::String(s) => AttributeValue::S(s),
        Value::Array(values) => AttributeValue::L(
            values
                .into_iter()
                .map(encode_value)
                .collect::<std::result::Result<_, _>>()?,
        ),
        Value::Object(entries) => AttributeValue::M(
            entries
                .into_iter()
                .map(|(k, v)| Ok((k, encode_value(v)?)))
                .collect::<std::result::Result<_, AttributeError>>()?,
        ),
    })
}

/// Converts one attribute into generic JSON. Sets and binary are refused.
pub fn decode_value(value: AttributeValue) -> std::result::Result<Value, AttributeError> {
    Ok(match value {
        AttributeValue::S(s) => Value::String(s),
        AttributeValue::N(n) => number_to_json(&n)?,
        AttributeValue::Bool(b) => Value::Bool(b),
        AttributeValue::Null => Value::Null,
        AttributeValue::L(values) => Value::Array(
            values
                .into_iter()
                .map(decode_value)
                .collect::<std::result::Result<_, _>>()?,
        ),
        AttributeValue::M(entries) => Value::Object(
            entries
                .into_iter()
                .map(|(k, v)| Ok((k, decode_value(v)?)))
                .collect::<std::result::Result<_, AttributeError>>()?,
        ),
        other @ (AttributeValue::B(_)
        | AttributeValue::Ss(_)
        | AttributeValue::Ns(_)
        | AttributeValue::Bs(_)) => {
            return Err(AttributeError::UnexpectedType {
                expected: "S, N, BOOL, NULL, L or M",
                found: other.type_name(),
            })
        }
    })
}

/// Parses decimal text as the narrowest JSON number that holds it.
pub(crate) fn number_to_json(text: &str) -> std::result::Result<Value, AttributeError> {
    validate_number(text)?;
    if let Ok(n) = text.parse::<i64>() {
        return Ok(Value::from(n));
    }
    if let Ok(n) = text.parse::<u64>() {
        return Ok(Value::from(n));
    }
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .ok_or_else(|| AttributeError::InvalidNumber(text.to_string()))
}

pub(crate) fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Deserializes a record from its fields, naming the offending attribute on
/// failure.
fn deserialize_fields<T: DeserializeOwned>(fields: Map<String, Value>) -> Result<T> {
    let current = RefCell::new(None::<String>);
    let entries = fields.into_iter().map(|(name, value)| {
        current.replace(Some(name.clone()));
        (name, value)
    });
    let deserializer = MapDeserializer::<_, serde_json::Error>::new(entries);

    T::deserialize(deserializer).map_err(|e| {
        let message = e.to_string();
        let attribute = quoted_field(&message)
            .map(str::to_string)
            .or_else(|| current.take())
            .unwrap_or_else(|| type_name::<T>().to_string());
        TableError::Conversion {
            attribute,
            reason: message,
        }
    })
}

/// Pulls `x` out of serde's "missing field `x`" style messages.
fn quoted_field(message: &str) -> Option<&str> {
    let rest = message
        .strip_prefix("missing field `")
        .or_else(|| message.strip_prefix("unknown field `"))
        .or_else(|| message.strip_prefix("duplicate field `"))?;
    rest.split('`').next()
}
