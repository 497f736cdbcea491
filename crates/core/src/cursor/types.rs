use std::fmt;

use serde_json::{Map, Value};

use crate::attribute::AttributeMap;
use crate::key::KeyResolver;

/// Where a query should resume, in any of the shapes callers hold.
pub enum StartKey {
    /// A canonical attribute map, typically a previous page's cursor.
    Attributes(AttributeMap),
    /// A record whose primary key marks the position.
    Record(Box<dyn KeyResolver + Send + Sync>),
    /// Plain key field names mapped to native JSON values.
    Fields(Map<String, Value>),
    /// An untyped JSON value, classified at normalization time as either a
    /// wire-format attribute map or a plain field map.
    Raw(Value),
    /// Handed to the store without any shape check. Errors, if any, come from
    /// the store.
    Unchecked(Value),
}

impl StartKey {
    pub fn attributes(key: AttributeMap) -> Self {
        StartKey::Attributes(key)
    }

    pub fn record<R>(record: R) -> Self
    where
        R: KeyResolver + Send + Sync + 'static,
    {
        StartKey::Record(Box::new(record))
    }

    pub fn fields<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        StartKey::Fields(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    pub fn raw(value: Value) -> Self {
        StartKey::Raw(value)
    }

    pub fn unchecked(value: Value) -> Self {
        StartKey::Unchecked(value)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            StartKey::Attributes(_) => "attributes",
            StartKey::Record(_) => "record",
            StartKey::Fields(_) => "fields",
            StartKey::Raw(_) => "raw",
            StartKey::Unchecked(_) => "unchecked",
        }
    }
}

impl From<AttributeMap> for StartKey {
    fn from(key: AttributeMap) -> Self {
        StartKey::Attributes(key)
    }
}

impl fmt::Debug for StartKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartKey::Attributes(key) => f.debug_tuple("Attributes").field(key).finish(),
            StartKey::Record(record) => f
                .debug_tuple("Record")
                .field(&record.primary_key())
                .finish(),
            StartKey::Fields(fields) => f.debug_tuple("Fields").field(fields).finish(),
            StartKey::Raw(value) => f.debug_tuple("Raw").field(value).finish(),
            StartKey::Unchecked(value) => f.debug_tuple("Unchecked").field(value).finish(),
        }
    }
}

/// The start key as sent to the store.
#[derive(Debug, Clone, PartialEq)]
pub enum ExclusiveStartKey {
    /// A validated primary-key map.
    Key(AttributeMap),
    /// Forwarded untouched; the store decides whether it is acceptable.
    Unchecked(Value),
}
