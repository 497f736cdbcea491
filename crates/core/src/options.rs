//! Per-operation options.
//!
//! Expressions are opaque strings handed to the store untouched; placeholders
//! (`#name`, `:value`) are resolved by the store through
//! [`ExpressionAttributes`].

use std::collections::HashMap;

use crate::attribute::{AttributeMap, AttributeValue};
use crate::cursor::StartKey;

/// Placeholder substitutions for expression strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpressionAttributes {
    /// `#placeholder` to attribute name.
    pub names: HashMap<String, String>,
    /// `:placeholder` to value.
    pub values: AttributeMap,
}

impl ExpressionAttributes {
    pub fn insert_name(&mut self, placeholder: impl Into<String>, name: impl Into<String>) {
        self.names.insert(placeholder.into(), name.into());
    }

    pub fn insert_value(&mut self, placeholder: impl Into<String>, value: AttributeValue) {
        self.values.insert(placeholder.into(), value);
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.values.is_empty()
    }
}

/// Which attributes an update echoes back.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReturnValues {
    #[default]
    None,
    AllOld,
    UpdatedOld,
    AllNew,
    UpdatedNew,
}

impl ReturnValues {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnValues::None => "NONE",
            ReturnValues::AllOld => "ALL_OLD",
            ReturnValues::UpdatedOld => "UPDATED_OLD",
            ReturnValues::AllNew => "ALL_NEW",
            ReturnValues::UpdatedNew => "UPDATED_NEW",
        }
    }
}

macro_rules! expression_attribute_setters {
    ($($ty:ty),* $(,)?) => {
        $(
            impl $ty {
                /// Maps a `#placeholder` to an attribute name.
                pub fn attribute_name(
                    mut self,
                    placeholder: impl Into<String>,
                    name: impl Into<String>,
                ) -> Self {
                    self.attributes.insert_name(placeholder, name);
                    self
                }

                /// Binds a `:placeholder` to a value.
                pub fn attribute_value(
                    mut self,
                    placeholder: impl Into<String>,
                    value: AttributeValue,
                ) -> Self {
                    self.attributes.insert_value(placeholder, value);
                    self
                }
            }
        )*
    };
}

expression_attribute_setters!(
    PutOptions,
    GetOptions,
    UpdateOptions,
    DeleteOptions,
    QueryOptions,
);

/// Options for [`Table::put_item`](crate::Table::put_item).
#[derive(Debug, Clone, Default)]
pub struct PutOptions {
    pub condition: Option<String>,
    pub attributes: ExpressionAttributes,
}

impl PutOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn condition(mut self, expression: impl Into<String>) -> Self {
        self.condition = Some(expression.into());
        self
    }
}

/// Options for [`Table::get_item`](crate::Table::get_item).
#[derive(Debug, Clone, Default)]
pub struct GetOptions {
    pub consistent_read: bool,
    pub projection: Option<String>,
    pub attributes: ExpressionAttributes,
}

impl GetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn consistent_read(mut self) -> Self {
        self.consistent_read = true;
        self
    }

    pub fn projection(mut self, expression: impl Into<String>) -> Self {
        self.projection = Some(expression.into());
        self
    }
}

/// Options for [`Table::update_item`](crate::Table::update_item).
#[derive(Debug, Clone, Default)]
pub struct UpdateOptions {
    pub update: Option<String>,
    pub condition: Option<String>,
    pub attributes: ExpressionAttributes,
    pub return_values: ReturnValues,
}

impl UpdateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(mut self, expression: impl Into<String>) -> Self {
        self.update = Some(expression.into());
        self
    }

    pub fn condition(mut self, expression: impl Into<String>) -> Self {
        self.condition = Some(expression.into());
        self
    }

    pub fn return_values(mut self, return_values: ReturnValues) -> Self {
        self.return_values = return_values;
        self
    }
}

/// Options for [`Table::delete_item`](crate::Table::delete_item).
#[derive(Debug, Clone, Default)]
pub struct DeleteOptions {
    pub condition: Option<String>,
    pub attributes: ExpressionAttributes,
}

impl DeleteOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn condition(mut self, expression: impl Into<String>) -> Self {
        self.condition = Some(expression.into());
        self
    }
}

/// Options for [`Table::query`](crate::Table::query).
///
/// Results are ascending by range key unless [`descending`](Self::descending)
/// is set.
#[derive(Debug)]
pub struct QueryOptions {
    pub key_condition: Option<String>,
    pub filter: Option<String>,
    pub projection: Option<String>,
    pub index_name: Option<String>,
    pub limit: Option<i32>,
    pub scan_index_forward: bool,
    pub consistent_read: bool,
    pub exclusive_start_key: Option<StartKey>,
    pub attributes: ExpressionAttributes,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            key_condition: None,
            filter: None,
            projection: None,
            index_name: None,
            limit: None,
            scan_index_forward: true,
            consistent_read: false,
            exclusive_start_key: None,
            attributes: ExpressionAttributes::default(),
        }
    }
}

impl QueryOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn key_condition(mut self, expression: impl Into<String>) -> Self {
        self.key_condition = Some(expression.into());
        self
    }

    pub fn filter(mut self, expression: impl Into<String>) -> Self {
        self.filter = Some(expression.into());
        self
    }

    pub fn projection(mut self, expression: impl Into<String>) -> Self {
        self.projection = Some(expression.into());
        self
    }

    pub fn index_name(mut self, index: impl Into<String>) -> Self {
        self.index_name = Some(index.into());
        self
    }

    pub fn limit(mut self, limit: i32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn descending(mut self) -> Self {
        self.scan_index_forward = false;
        self
    }

    pub fn consistent_read(mut self) -> Self {
        self.consistent_read = true;
        self
    }

    /// Resumes after the given key. Accepts any [`StartKey`] shape, including
    /// a cursor returned by a previous page.
    pub fn exclusive_start_key(mut self, start_key: impl Into<StartKey>) -> Self {
        self.exclusive_start_key = Some(start_key.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_return_values_as_str() {
        assert_eq!(ReturnValues::default().as_str(), "NONE");
        assert_eq!(ReturnValues::AllNew.as_str(), "ALL_NEW");
        assert_eq!(ReturnValues::UpdatedOld.as_str(), "UPDATED_OLD");
    }

    #[test]
    fn test_put_options_builder() {
        let options = PutOptions::new()
            .condition("attribute_not_exists(#date)")
            .attribute_name("#date", "date");

        assert_eq!(options.condition.as_deref(), Some("attribute_not_exists(#date)"));
        assert_eq!(options.attributes.names["#date"], "date");
        assert!(options.attributes.values.is_empty());
    }

    #[test]
    fn test_update_options_builder() {
        let options = UpdateOptions::new()
            .update("ADD #count :i")
            .attribute_name("#count", "login_count")
            .attribute_value(":i", AttributeValue::number(1))
            .return_values(ReturnValues::AllNew);

        assert_eq!(options.update.as_deref(), Some("ADD #count :i"));
        assert_eq!(options.attributes.values[":i"], AttributeValue::number(1));
        assert_eq!(options.return_values, ReturnValues::AllNew);
    }

    #[test]
    fn test_query_options_default_is_ascending() {
        let options = QueryOptions::new();
        assert!(options.scan_index_forward);
        assert!(options.exclusive_start_key.is_none());

        let options = options.descending().limit(10);
        assert!(!options.scan_index_forward);
        assert_eq!(options.limit, Some(10));
    }

    #[test]
    fn test_expression_attributes_is_empty() {
        let mut attributes = ExpressionAttributes::default();
        assert!(attributes.is_empty());
        attributes.insert_name("#s", "status");
        assert!(!attributes.is_empty());
    }
}
