//! DynamoDB store implementation.
//!
//! Implements the `Store` trait from `dynatable_core` using DynamoDB.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::types::{AttributeValue as SdkValue, ReturnValue};
use aws_sdk_dynamodb::Client;

use dynatable_core::attribute::wire;
use dynatable_core::store::{
    DeleteItemInput, GetItemInput, PutItemInput, QueryInput, QueryOutput, UpdateItemInput,
    UpdateItemOutput,
};
use dynatable_core::{
    AttributeMap, ExclusiveStartKey, ExpressionAttributes, ReturnValues, Store, StoreError,
    StoreResult,
};

use super::conversions::{item_from_sdk, item_to_sdk, optional_item_to_sdk};
use super::error::map_sdk_error;
use crate::config::Config;

/// DynamoDB-backed store.
///
/// One client serves every table; the table name travels with each request.
#[derive(Debug, Clone)]
pub struct DynamoDbStore {
    client: Client,
}

impl DynamoDbStore {
    /// Creates a new store with the given DynamoDB client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Creates a new store from configuration.
    ///
    /// Uses the AWS SDK default credential chain, the configured region and,
    /// when set, a custom endpoint such as DynamoDB Local.
    pub async fn from_config(config: &Config) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()));

        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        let sdk_config = loader.load().await;
        Self::new(Client::new(&sdk_config))
    }

    /// Get the underlying client.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

fn names(attributes: &ExpressionAttributes) -> Option<HashMap<String, String>> {
    (!attributes.names.is_empty()).then(|| attributes.names.clone())
}

fn values(attributes: ExpressionAttributes) -> Option<HashMap<String, SdkValue>> {
    optional_item_to_sdk(Some(attributes.values))
}

fn return_value(return_values: ReturnValues) -> ReturnValue {
    ReturnValue::from(return_values.as_str())
}

/// Builds the SDK start key. A pass-through value that is not a wire-form
/// map cannot be sent at all, so it fails here the way the service would
/// fail to deserialize it.
fn start_key(start: ExclusiveStartKey) -> StoreResult<HashMap<String, SdkValue>> {
    let key = match start {
        ExclusiveStartKey::Key(key) => key,
        ExclusiveStartKey::Unchecked(value) => wire::map_from_wire(&value)
            .map_err(|e| StoreError::new(StoreError::SERIALIZATION, e.to_string()))?,
    };
    Ok(item_to_sdk(key))
}

#[async_trait]
impl Store for DynamoDbStore {
    async fn put_item(&self, input: PutItemInput) -> StoreResult<()> {
        self.client
            .put_item()
            .table_name(&input.table_name)
            .set_item(Some(item_to_sdk(input.item)))
            .set_condition_expression(input.condition_expression)
            .set_expression_attribute_names(names(&input.expression_attributes))
            .set_expression_attribute_values(values(input.expression_attributes))
            .send()
            .await
            .map_err(map_sdk_error)?;

        Ok(())
    }

    async fn get_item(&self, input: GetItemInput) -> StoreResult<Option<AttributeMap>> {
        let result = self
            .client
            .get_item()
            .table_name(&input.table_name)
            .set_key(Some(item_to_sdk(input.key)))
            .consistent_read(input.consistent_read)
            .set_projection_expression(input.projection_expression)
            .set_expression_attribute_names(names(&input.expression_attributes))
            .send()
            .await
            .map_err(map_sdk_error)?;

        result.item.map(item_from_sdk).transpose()
    }

    async fn update_item(&self, input: UpdateItemInput) -> StoreResult<UpdateItemOutput> {
        let result = self
            .client
            .update_item()
            .table_name(&input.table_name)
            .set_key(Some(item_to_sdk(input.key)))
            .set_update_expression(input.update_expression)
            .set_condition_expression(input.condition_expression)
            .set_expression_attribute_names(names(&input.expression_attributes))
            .set_expression_attribute_values(values(input.expression_attributes))
            .return_values(return_value(input.return_values))
            .send()
            .await
            .map_err(map_sdk_error)?;

        Ok(UpdateItemOutput {
            attributes: result.attributes.map(item_from_sdk).transpose()?,
        })
    }

    async fn delete_item(&self, input: DeleteItemInput) -> StoreResult<()> {
        self.client
            .delete_item()
            .table_name(&input.table_name)
            .set_key(Some(item_to_sdk(input.key)))
            .set_condition_expression(input.condition_expression)
            .set_expression_attribute_names(names(&input.expression_attributes))
            .set_expression_attribute_values(values(input.expression_attributes))
            .send()
            .await
            .map_err(map_sdk_error)?;

        Ok(())
    }

    async fn query(&self, input: QueryInput) -> StoreResult<QueryOutput> {
        let exclusive_start_key = input.exclusive_start_key.map(start_key).transpose()?;

        let result = self
            .client
            .query()
            .table_name(&input.table_name)
            .set_index_name(input.index_name)
            .set_key_condition_expression(input.key_condition_expression)
            .set_filter_expression(input.filter_expression)
            .set_projection_expression(input.projection_expression)
            .set_expression_attribute_names(names(&input.expression_attributes))
            .set_expression_attribute_values(values(input.expression_attributes))
            .set_limit(input.limit)
            .scan_index_forward(input.scan_index_forward)
            .consistent_read(input.consistent_read)
            .set_exclusive_start_key(exclusive_start_key)
            .send()
            .await
            .map_err(map_sdk_error)?;

        let items = result
            .items
            .unwrap_or_default()
            .into_iter()
            .map(item_from_sdk)
            .collect::<StoreResult<Vec<_>>>()?;
        let last_evaluated_key = result
            .last_evaluated_key
            .filter(|key| !key.is_empty())
            .map(item_from_sdk)
            .transpose()?;

        tracing::trace!(
            table = %input.table_name,
            count = items.len(),
            has_more = last_evaluated_key.is_some(),
            "Query"
        );

        Ok(QueryOutput {
            items,
            last_evaluated_key,
        })
    }
}
