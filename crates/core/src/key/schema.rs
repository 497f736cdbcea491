use std::fmt;
use std::str::FromStr;

use crate::attribute::{AttributeMap, AttributeValue};
use crate::error::{Result, TableError};

/// Scalar types a key attribute may have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    S,
    N,
    B,
}

impl KeyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyType::S => "S",
            KeyType::N => "N",
            KeyType::B => "B",
        }
    }

    /// Whether `value` has this key type.
    pub fn matches(&self, value: &AttributeValue) -> bool {
        matches!(
            (self, value),
            (KeyType::S, AttributeValue::S(_))
                | (KeyType::N, AttributeValue::N(_))
                | (KeyType::B, AttributeValue::B(_))
        )
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "S" => Ok(KeyType::S),
            "N" => Ok(KeyType::N),
            "B" => Ok(KeyType::B),
            other => Err(format!("Unknown key type {other:?}, expected S, N or B")),
        }
    }
}

/// One attribute of a primary key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyAttribute {
    pub name: String,
    pub key_type: KeyType,
}

impl KeyAttribute {
    pub fn new(name: impl Into<String>, key_type: KeyType) -> Self {
        Self {
            name: name.into(),
            key_type,
        }
    }
}

/// A table's primary key: a hash attribute and an optional range attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySchema {
    hash: KeyAttribute,
    range: Option<KeyAttribute>,
}

impl KeySchema {
    pub fn new(hash_name: impl Into<String>, hash_type: KeyType) -> Self {
        Self {
            hash: KeyAttribute::new(hash_name, hash_type),
            range: None,
        }
    }

    pub fn with_range_key(mut self, name: impl Into<String>, key_type: KeyType) -> Self {
        self.range = Some(KeyAttribute::new(name, key_type));
        self
    }

    pub fn hash_key(&self) -> &KeyAttribute {
        &self.hash
    }

    pub fn range_key(&self) -> Option<&KeyAttribute> {
        self.range.as_ref()
    }

    /// Names of the key attributes, hash first.
    pub fn attribute_names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.hash.name.as_str()).chain(self.range.iter().map(|r| r.name.as_str()))
    }

    pub fn is_key_attribute(&self, name: &str) -> bool {
        self.attribute_names().any(|n| n == name)
    }

    /// Builds a validated primary-key map from hash and range values.
    pub fn key(&self, hash: AttributeValue, range: Option<AttributeValue>) -> Result<AttributeMap> {
        let mut key = AttributeMap::with_capacity(2);
        key.insert(self.hash.name.clone(), hash);

        match (&self.range, range) {
            (Some(attribute), Some(value)) => {
                key.insert(attribute.name.clone(), value);
            }
            (Some(attribute), None) => {
                return Err(TableError::InvalidKey(format!(
                    "missing range key `{}`",
                    attribute.name
                )));
            }
            (None, Some(_)) => {
                return Err(TableError::InvalidKey(format!(
                    "table has no range key, but one was given for hash key `{}`",
                    self.hash.name
                )));
            }
            (None, None) => {}
        }

        self.validate_key(&key)?;
        Ok(key)
    }

    /// Checks that every key attribute is present in `item`, has the declared
    /// type, and is not an empty string or binary.
    pub fn validate_key(&self, item: &AttributeMap) -> Result<()> {
        validate_attribute(&self.hash, item)?;
        if let Some(range) = &self.range {
            validate_attribute(range, item)?;
        }
        Ok(())
    }

    /// Copies the key attributes out of a full item, validating them.
    pub fn extract_key(&self, item: &AttributeMap) -> Result<AttributeMap> {
        self.validate_key(item)?;
        Ok(self
            .attribute_names()
            .filter_map(|name| item.get(name).map(|v| (name.to_string(), v.clone())))
            .collect())
    }
}

fn validate_attribute(attribute: &KeyAttribute, item: &AttributeMap) -> Result<()> {
    let value = item
        .get(&attribute.name)
        .ok_or_else(|| TableError::InvalidKey(format!("missing key attribute `{}`", attribute.name)))?;

    if !attribute.key_type.matches(value) {
        return Err(TableError::InvalidKey(format!(
            "key attribute `{}` must be {}, found {}",
            attribute.name,
            attribute.key_type,
            value.type_name()
        )));
    }

    let empty = match value {
        AttributeValue::S(s) => s.is_empty(),
        AttributeValue::B(b) => b.is_empty(),
        _ => false,
    };
    if empty {
        return Err(TableError::InvalidKey(format!(
            "key attribute `{}` must not be empty",
            attribute.name
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn login_schema() -> KeySchema {
        KeySchema::new("user_id", KeyType::S).with_range_key("date", KeyType::N)
    }

    #[test]
    fn test_key_type_from_str() {
        assert_eq!("s".parse::<KeyType>(), Ok(KeyType::S));
        assert_eq!("N".parse::<KeyType>(), Ok(KeyType::N));
        assert!("SS".parse::<KeyType>().is_err());
    }

    #[test]
    fn test_key_with_range() {
        let key = login_schema()
            .key("foobar-1".into(), Some(AttributeValue::number(1_700_000_000_i64)))
            .unwrap();

        assert_eq!(key.len(), 2);
        assert_eq!(key["user_id"], AttributeValue::string("foobar-1"));
        assert_eq!(key["date"], AttributeValue::number(1_700_000_000_i64));
    }

    #[test]
    fn test_key_requires_range_when_configured() {
        let result = login_schema().key("foobar-1".into(), None);
        assert!(matches!(result, Err(TableError::InvalidKey(_))));
    }

    #[test]
    fn test_key_rejects_unexpected_range() {
        let schema = KeySchema::new("id", KeyType::S);
        let result = schema.key("a".into(), Some("b".into()));
        assert!(matches!(result, Err(TableError::InvalidKey(_))));
    }

    #[test]
    fn test_validate_key_checks_type() {
        let result = login_schema().key("foobar-1".into(), Some("not-a-number".into()));
        let Err(TableError::InvalidKey(message)) = result else {
            panic!("expected InvalidKey");
        };
        assert!(message.contains("must be N, found S"));
    }

    #[test]
    fn test_validate_key_rejects_empty_hash() {
        let result = login_schema().key("".into(), Some(AttributeValue::number(1)));
        assert!(matches!(result, Err(TableError::InvalidKey(_))));
    }

    #[test]
    fn test_extract_key_drops_other_attributes() {
        let mut item = AttributeMap::new();
        item.insert("user_id".to_string(), "foobar-1".into());
        item.insert("date".to_string(), AttributeValue::number(5));
        item.insert("status".to_string(), "ok".into());

        let key = login_schema().extract_key(&item).unwrap();

        assert_eq!(key.len(), 2);
        assert!(!key.contains_key("status"));
    }

    #[test]
    fn test_attribute_names() {
        let schema = login_schema();
        assert_eq!(schema.attribute_names().collect::<Vec<_>>(), ["user_id", "date"]);
        assert!(schema.is_key_attribute("date"));
        assert!(!schema.is_key_attribute("status"));
    }
}
