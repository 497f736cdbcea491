use crate::attribute::AttributeMap;
use crate::cursor::ExclusiveStartKey;
use crate::options::{ExpressionAttributes, ReturnValues};

/// A PutItem request.
#[derive(Debug, Clone, PartialEq)]
pub struct PutItemInput {
    pub table_name: String,
    pub item: AttributeMap,
    pub condition_expression: Option<String>,
    pub expression_attributes: ExpressionAttributes,
}

/// A GetItem request. Only placeholder names apply to a projection.
#[derive(Debug, Clone, PartialEq)]
pub struct GetItemInput {
    pub table_name: String,
    pub key: AttributeMap,
    pub consistent_read: bool,
    pub projection_expression: Option<String>,
    pub expression_attributes: ExpressionAttributes,
}

/// An UpdateItem request.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateItemInput {
    pub table_name: String,
    pub key: AttributeMap,
    pub update_expression: Option<String>,
    pub condition_expression: Option<String>,
    pub expression_attributes: ExpressionAttributes,
    pub return_values: ReturnValues,
}

/// Attributes echoed back by an UpdateItem call, per its `ReturnValues`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateItemOutput {
    pub attributes: Option<AttributeMap>,
}

/// A DeleteItem request.
#[derive(Debug, Clone, PartialEq)]
pub struct DeleteItemInput {
    pub table_name: String,
    pub key: AttributeMap,
    pub condition_expression: Option<String>,
    pub expression_attributes: ExpressionAttributes,
}

/// A Query request for a single page.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryInput {
    pub table_name: String,
    pub index_name: Option<String>,
    pub key_condition_expression: Option<String>,
    pub filter_expression: Option<String>,
    pub projection_expression: Option<String>,
    pub expression_attributes: ExpressionAttributes,
    pub limit: Option<i32>,
    pub scan_index_forward: bool,
    pub consistent_read: bool,
    pub exclusive_start_key: Option<ExclusiveStartKey>,
}

/// One page of query results, in store order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOutput {
    pub items: Vec<AttributeMap>,
    /// Continuation key; `None` when this is the last page.
    pub last_evaluated_key: Option<AttributeMap>,
}
