//! Typed records over a hash/range key document store.
//!
//! Records implement [`ItemCodec`] and [`KeyResolver`]; a [`Table`] turns them
//! into store requests through any [`Store`] backend.

pub mod attribute;
pub mod codec;
pub mod cursor;
pub mod error;
pub mod key;
pub mod options;
pub mod store;
pub mod table;

pub use attribute::{AttributeError, AttributeMap, AttributeValue};
pub use codec::{marshal_keyed, FieldOverride, ItemCodec, RawItem, StructuralCodec};
pub use cursor::{CursorNormalizer, ExclusiveStartKey, StartKey};
pub use error::{Result, TableError};
pub use key::{primary_key, KeyResolver, KeySchema, KeyType};
pub use options::{
    DeleteOptions, ExpressionAttributes, GetOptions, PutOptions, QueryOptions, ReturnValues,
    UpdateOptions,
};
pub use store::{Store, StoreError, StoreResult};
pub use table::{QueryPage, Table};
