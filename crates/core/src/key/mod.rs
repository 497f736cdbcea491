//! Primary keys: the table's key schema and the record-side resolver.

mod schema;
mod traits;

pub use schema::{KeyAttribute, KeySchema, KeyType};
pub use traits::{primary_key, KeyResolver};
