use std::sync::Arc;

use async_trait::async_trait;

use crate::attribute::AttributeMap;

use super::{
    DeleteItemInput, GetItemInput, PutItemInput, QueryInput, QueryOutput, StoreResult,
    UpdateItemInput, UpdateItemOutput,
};

/// A hash/range key document store.
///
/// Implementations own connection handling and retries. Each method maps to a
/// single store request; errors are returned with the store's own code.
#[async_trait]
pub trait Store: Send + Sync {
    /// Writes a full item, replacing any item with the same key.
    async fn put_item(&self, input: PutItemInput) -> StoreResult<()>;

    /// Reads one item by primary key. `None` when no item exists.
    async fn get_item(&self, input: GetItemInput) -> StoreResult<Option<AttributeMap>>;

    /// Applies an update expression to the item with the given key.
    async fn update_item(&self, input: UpdateItemInput) -> StoreResult<UpdateItemOutput>;

    /// Deletes the item with the given key.
    async fn delete_item(&self, input: DeleteItemInput) -> StoreResult<()>;

    /// Reads one page of items matching a key condition.
    async fn query(&self, input: QueryInput) -> StoreResult<QueryOutput>;
}

#[async_trait]
impl<S: Store + ?Sized> Store for Arc<S> {
    async fn put_item(&self, input: PutItemInput) -> StoreResult<()> {
        (**self).put_item(input).await
    }

    async fn get_item(&self, input: GetItemInput) -> StoreResult<Option<AttributeMap>> {
        (**self).get_item(input).await
    }

    async fn update_item(&self, input: UpdateItemInput) -> StoreResult<UpdateItemOutput> {
        (**self).update_item(input).await
    }

    async fn delete_item(&self, input: DeleteItemInput) -> StoreResult<()> {
        (**self).delete_item(input).await
    }

    async fn query(&self, input: QueryInput) -> StoreResult<QueryOutput> {
        (**self).query(input).await
    }
}
