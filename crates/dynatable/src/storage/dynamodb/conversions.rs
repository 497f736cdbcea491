//! DynamoDB attribute conversion functions.
//!
//! Pure functions for converting between the SDK's `AttributeValue` and the
//! crate's own. These are testable in isolation without DynamoDB access.

use std::collections::HashMap;

use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::AttributeValue as SdkValue;
use dynatable_core::{AttributeMap, AttributeValue, StoreError, StoreResult};

/// Convert an attribute value to its SDK form.
pub fn to_sdk(value: AttributeValue) -> SdkValue {
    match value {
        AttributeValue::S(s) => SdkValue::S(s),
        AttributeValue::N(n) => SdkValue::N(n),
        AttributeValue::B(b) => SdkValue::B(Blob::new(b)),
        AttributeValue::Ss(values) => SdkValue::Ss(values),
        AttributeValue::Ns(values) => SdkValue::Ns(values),
        AttributeValue::Bs(values) => SdkValue::Bs(values.into_iter().map(Blob::new).collect()),
        AttributeValue::M(map) => SdkValue::M(item_to_sdk(map)),
        AttributeValue::L(values) => SdkValue::L(values.into_iter().map(to_sdk).collect()),
        AttributeValue::Null => SdkValue::Null(true),
        AttributeValue::Bool(b) => SdkValue::Bool(b),
    }
}

/// Convert an SDK attribute value back into the crate's form.
pub fn from_sdk(value: SdkValue) -> StoreResult<AttributeValue> {
    Ok(match value {
        SdkValue::S(s) => AttributeValue::S(s),
        SdkValue::N(n) => AttributeValue::N(n),
        SdkValue::B(b) => AttributeValue::B(b.into_inner()),
        SdkValue::Ss(values) => AttributeValue::Ss(values),
        SdkValue::Ns(values) => AttributeValue::Ns(values),
        SdkValue::Bs(values) => {
            AttributeValue::Bs(values.into_iter().map(Blob::into_inner).collect())
        }
        SdkValue::M(map) => AttributeValue::M(item_from_sdk(map)?),
        SdkValue::L(values) => {
            AttributeValue::L(values.into_iter().map(from_sdk).collect::<StoreResult<_>>()?)
        }
        SdkValue::Null(_) => AttributeValue::Null,
        SdkValue::Bool(b) => AttributeValue::Bool(b),
        other => {
            return Err(StoreError::new(
                StoreError::SERIALIZATION,
                format!("Unsupported attribute value: {other:?}"),
            ))
        }
    })
}

/// Convert an item to a DynamoDB item.
pub fn item_to_sdk(item: AttributeMap) -> HashMap<String, SdkValue> {
    item.into_iter()
        .map(|(name, value)| (name, to_sdk(value)))
        .collect()
}

/// Convert a DynamoDB item to an item.
pub fn item_from_sdk(item: HashMap<String, SdkValue>) -> StoreResult<AttributeMap> {
    item.into_iter()
        .map(|(name, value)| Ok((name, from_sdk(value)?)))
        .collect()
}

/// Convert an optional item, treating an absent map as `None`.
pub fn optional_item_to_sdk(item: Option<AttributeMap>) -> Option<HashMap<String, SdkValue>> {
    item.filter(|item| !item.is_empty()).map(item_to_sdk)
}
