//! In-memory storage backend for testing.
//!
//! This module provides an in-memory implementation of the `Store` trait that
//! keeps every table in a HashMap wrapped in `Arc<RwLock<_>>`. Condition,
//! update, projection and key condition expressions are evaluated locally, so
//! a `Table` behaves the same as it does against DynamoDB for the supported
//! expression subset.
//!
//! # Example
//!
//! ```rust,ignore
//! use dynatable::storage::inmemory::InMemoryStore;
//!
//! let store = InMemoryStore::new();
//! store.create_table("logins", schema).await?;
//! let table = Table::new(store, "logins", schema);
//! ```

mod expression;
mod store;

pub use store::InMemoryStore;
