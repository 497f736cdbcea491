use crate::attribute::{AttributeMap, AttributeValue};

/// Derives a record's primary key.
///
/// `primary_key` must return exactly the hash attribute and, when the table
/// has one, the range attribute. It must not look at any other field.
pub trait KeyResolver {
    fn primary_key(&self) -> AttributeMap;

    /// True when the hash key is set, the range key (if any) is non-zero and
    /// every other field holds its zero value.
    ///
    /// Such a record marshals to its primary key alone, which lets it double
    /// as a pagination cursor. The check runs on every call.
    fn is_key_only(&self) -> bool;
}

impl<R: KeyResolver + ?Sized> KeyResolver for &R {
    fn primary_key(&self) -> AttributeMap {
        (**self).primary_key()
    }

    fn is_key_only(&self) -> bool {
        (**self).is_key_only()
    }
}

/// Builds a primary-key map from a hash pair and an optional range pair.
pub fn primary_key(
    hash: (&str, AttributeValue),
    range: Option<(&str, AttributeValue)>,
) -> AttributeMap {
    let mut key = AttributeMap::with_capacity(2);
    key.insert(hash.0.to_string(), hash.1);
    if let Some((name, value)) = range {
        key.insert(name.to_string(), value);
    }
    key
}
