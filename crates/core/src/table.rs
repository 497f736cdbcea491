//! The typed table: record-level CRUD and query over a [`Store`].

use crate::attribute::{AttributeMap, AttributeValue};
use crate::codec::ItemCodec;
use crate::cursor::CursorNormalizer;
use crate::error::{Result, TableError};
use crate::key::KeySchema;
use crate::options::{DeleteOptions, GetOptions, PutOptions, QueryOptions, UpdateOptions};
use crate::store::{
    DeleteItemInput, GetItemInput, PutItemInput, QueryInput, Store, UpdateItemInput,
};

/// A table of `R` records in a store, addressed by a fixed key schema.
///
/// Each operation validates its input locally, then makes exactly one store
/// call. Nothing is cached between calls.
#[derive(Debug, Clone)]
pub struct Table<S> {
    store: S,
    name: String,
    schema: KeySchema,
}

/// One page of query results.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPage<R> {
    /// Items in the order the store returned them.
    pub items: Vec<R>,
    /// The store's continuation key, untouched. `None` on the last page.
    pub last_evaluated_key: Option<AttributeMap>,
}

impl<R> QueryPage<R> {
    pub fn has_more(&self) -> bool {
        self.last_evaluated_key.is_some()
    }
}

impl<S: Store> Table<S> {
    pub fn new(store: S, name: impl Into<String>, schema: KeySchema) -> Self {
        Self {
            store,
            name: name.into(),
            schema,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema(&self) -> &KeySchema {
        &self.schema
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Writes a record, replacing any item with the same key.
    pub async fn put_item<R: ItemCodec>(&self, record: &R, options: PutOptions) -> Result<()> {
        let item = record.marshal_item()?;
        if let Err(err) = self.schema.validate_key(&item) {
            tracing::warn!(table = %self.name, error = %err, "Refusing to put item");
            return Err(err);
        }

        tracing::debug!(
            table = %self.name,
            attributes = item.len(),
            conditional = options.condition.is_some(),
            "Putting item"
        );

        self.store
            .put_item(PutItemInput {
                table_name: self.name.clone(),
                item,
                condition_expression: options.condition,
                expression_attributes: options.attributes,
            })
            .await?;

        Ok(())
    }

    /// Reads one record by key. Fails with [`TableError::ItemNotFound`] when
    /// no item exists.
    pub async fn get_item<R: ItemCodec>(
        &self,
        hash: impl Into<AttributeValue>,
        range: Option<AttributeValue>,
        options: GetOptions,
    ) -> Result<R> {
        let key = self.key(hash.into(), range)?;
        tracing::debug!(table = %self.name, "Getting item");

        let item = self
            .store
            .get_item(GetItemInput {
                table_name: self.name.clone(),
                key,
                consistent_read: options.consistent_read,
                projection_expression: options.projection,
                expression_attributes: options.attributes,
            })
            .await?;

        match item {
            Some(item) => R::unmarshal_item(item),
            None => {
                tracing::debug!(table = %self.name, "Item not found");
                Err(TableError::ItemNotFound)
            }
        }
    }

    /// Applies an update expression to the item at the given key.
    pub async fn update_item(
        &self,
        hash: impl Into<AttributeValue>,
        range: Option<AttributeValue>,
        options: UpdateOptions,
    ) -> Result<()> {
        self.send_update(hash.into(), range, options).await?;
        Ok(())
    }

    /// Like [`update_item`](Self::update_item), decoding whatever attributes
    /// the store returns per [`UpdateOptions::return_values`].
    pub async fn update_item_returning<R: ItemCodec>(
        &self,
        hash: impl Into<AttributeValue>,
        range: Option<AttributeValue>,
        options: UpdateOptions,
    ) -> Result<Option<R>> {
        self.send_update(hash.into(), range, options)
            .await?
            .map(R::unmarshal_item)
            .transpose()
    }

    /// Deletes the item at the given key.
    pub async fn delete_item(
        &self,
        hash: impl Into<AttributeValue>,
        range: Option<AttributeValue>,
        options: DeleteOptions,
    ) -> Result<()> {
        let key = self.key(hash.into(), range)?;
        tracing::debug!(
            table = %self.name,
            conditional = options.condition.is_some(),
            "Deleting item"
        );

        self.store
            .delete_item(DeleteItemInput {
                table_name: self.name.clone(),
                key,
                condition_expression: options.condition,
                expression_attributes: options.attributes,
            })
            .await?;

        Ok(())
    }

    /// Reads one page of records.
    ///
    /// The start key is normalized before the store is called, so a malformed
    /// one never reaches it. Fetching further pages is up to the caller.
    pub async fn query<R: ItemCodec>(&self, options: QueryOptions) -> Result<QueryPage<R>> {
        let exclusive_start_key = match options.exclusive_start_key {
            Some(start_key) => {
                let kind = start_key.kind();
                match CursorNormalizer::new(&self.schema).resolve(start_key) {
                    Ok(resolved) => Some(resolved),
                    Err(err) => {
                        tracing::warn!(
                            table = %self.name,
                            start_key = kind,
                            error = %err,
                            "Rejected start key"
                        );
                        return Err(err);
                    }
                }
            }
            None => None,
        };

        tracing::debug!(
            table = %self.name,
            index = ?options.index_name,
            limit = ?options.limit,
            resuming = exclusive_start_key.is_some(),
            "Querying"
        );

        let output = self
            .store
            .query(QueryInput {
                table_name: self.name.clone(),
                index_name: options.index_name,
                key_condition_expression: options.key_condition,
                filter_expression: options.filter,
                projection_expression: options.projection,
                expression_attributes: options.attributes,
                limit: options.limit,
                scan_index_forward: options.scan_index_forward,
                consistent_read: options.consistent_read,
                exclusive_start_key,
            })
            .await?;

        let items = output
            .items
            .into_iter()
            .map(R::unmarshal_item)
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            table = %self.name,
            count = items.len(),
            has_more = output.last_evaluated_key.is_some(),
            "Query page read"
        );

        Ok(QueryPage {
            items,
            last_evaluated_key: output.last_evaluated_key,
        })
    }

    async fn send_update(
        &self,
        hash: AttributeValue,
        range: Option<AttributeValue>,
        options: UpdateOptions,
    ) -> Result<Option<AttributeMap>> {
        let key = self.key(hash, range)?;
        tracing::debug!(
            table = %self.name,
            return_values = options.return_values.as_str(),
            "Updating item"
        );

        let output = self
            .store
            .update_item(UpdateItemInput {
                table_name: self.name.clone(),
                key,
                update_expression: options.update,
                condition_expression: options.condition,
                expression_attributes: options.attributes,
                return_values: options.return_values,
            })
            .await?;

        Ok(output.attributes)
    }

    fn key(&self, hash: AttributeValue, range: Option<AttributeValue>) -> Result<AttributeMap> {
        self.schema.key(hash, range).inspect_err(|err| {
            tracing::warn!(table = %self.name, error = %err, "Invalid primary key");
        })
    }
}
