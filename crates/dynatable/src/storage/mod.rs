//! Storage backend implementations.
//!
//! This module provides concrete implementations of the `Store` trait defined
//! in `dynatable_core::store`.
//!
//! # Feature Flags
//!
//! - `dynamodb`: AWS DynamoDB storage backend using `aws-sdk-dynamodb`
//!
//! The in-memory backend is always available.
//!
//! # Examples
//!
//! Build with DynamoDB:
//! ```bash
//! cargo build -p dynatable --features dynamodb
//! ```

pub mod inmemory;

#[cfg(feature = "dynamodb")]
pub mod dynamodb;

pub use inmemory::InMemoryStore;

#[cfg(feature = "dynamodb")]
pub use dynamodb::DynamoDbStore;
