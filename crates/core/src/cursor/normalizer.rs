use serde_json::{Map, Value};

use crate::attribute::{canonical_number, wire, AttributeMap, AttributeValue};
use crate::codec::encode_value;
use crate::error::{Result, TableError};
use crate::key::KeySchema;

use super::{ExclusiveStartKey, StartKey};

/// Turns any [`StartKey`] shape into the canonical key map the store expects.
///
/// The same key given as an attribute map, a record, or a field map
/// normalizes to the same result: only the key attributes, with numbers in
/// canonical text. Anything else fails here, before the store is called.
#[derive(Debug, Clone, Copy)]
pub struct CursorNormalizer<'a> {
    schema: &'a KeySchema,
}

impl<'a> CursorNormalizer<'a> {
    pub fn new(schema: &'a KeySchema) -> Self {
        Self { schema }
    }

    pub fn normalize(&self, start_key: StartKey) -> Result<AttributeMap> {
        match start_key {
            StartKey::Attributes(item) => self.key_of(&item),
            StartKey::Record(record) => self.key_of(&record.primary_key()),
            StartKey::Fields(fields) => self.from_fields(fields),
            StartKey::Raw(value) => self.classify(value),
            StartKey::Unchecked(_) => Err(TableError::Normalization(
                "an unchecked start key cannot be normalized".to_string(),
            )),
        }
    }

    /// Like [`normalize`](Self::normalize), except `Unchecked` keys pass
    /// through as they are.
    pub fn resolve(&self, start_key: StartKey) -> Result<ExclusiveStartKey> {
        match start_key {
            StartKey::Unchecked(value) => Ok(ExclusiveStartKey::Unchecked(value)),
            other => self.normalize(other).map(ExclusiveStartKey::Key),
        }
    }

    fn from_fields(&self, fields: Map<String, Value>) -> Result<AttributeMap> {
        let mut key = AttributeMap::with_capacity(fields.len());
        for (name, value) in fields {
            let attribute = encode_value(value).map_err(|e| {
                TableError::Normalization(format!("field `{name}` is not a key value: {e}"))
            })?;
            key.insert(name, attribute);
        }
        self.key_of(&key)
    }

    fn key_of(&self, item: &AttributeMap) -> Result<AttributeMap> {
        let mut key = self.schema.extract_key(item).map_err(normalization)?;
        for value in key.values_mut() {
            if let AttributeValue::N(text) = value {
                *text = canonical_number(text)
                    .map_err(|e| TableError::Normalization(e.to_string()))?;
            }
        }
        Ok(key)
    }

    fn classify(&self, value: Value) -> Result<AttributeMap> {
        match value {
            Value::Object(entries)
                if !entries.is_empty() && entries.values().all(wire::is_wire_value) =>
            {
                let key = wire::map_from_wire(&Value::Object(entries))
                    .map_err(|e| TableError::Normalization(e.to_string()))?;
                self.normalize(StartKey::Attributes(key))
            }
            Value::Object(entries) if entries.values().all(is_scalar) => self.from_fields(entries),
            other => Err(TableError::Normalization(format!(
                "unrecognized start key shape: {}",
                describe(&other)
            ))),
        }
    }
}

fn normalization(error: TableError) -> TableError {
    match error {
        TableError::InvalidKey(message) => TableError::Normalization(message),
        other => other,
    }
}

fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::String(_) | Value::Number(_) | Value::Bool(_))
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a map with nested values",
    }
}
