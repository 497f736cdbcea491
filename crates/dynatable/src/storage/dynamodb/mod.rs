//! DynamoDB storage backend implementation.
//!
//! This module provides a DynamoDB-based implementation of the `Store` trait
//! using `aws-sdk-dynamodb`.

mod conversions;
mod error;
mod store;

pub use conversions::{from_sdk, item_from_sdk, item_to_sdk, to_sdk};
pub use error::map_sdk_error;
pub use store::DynamoDbStore;
