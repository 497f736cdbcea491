//! Command line interface for reading and writing table items.
//!
//! Items and keys are exchanged in DynamoDB JSON, e.g.
//! `{"user_id": {"S": "u-1"}, "date": {"N": "42"}}`.

use anyhow::{bail, Context, Result};
use base64::Engine;
use clap::{Args, Parser, Subcommand};
use serde_json::{json, Value};

use dynatable_core::attribute::wire;
use dynatable_core::{
    AttributeValue, DeleteOptions, ExpressionAttributes, GetOptions, KeyType, PutOptions,
    QueryOptions, RawItem, ReturnValues, StartKey, Store, Table, UpdateOptions,
};

use crate::config::Config;

/// dynatable - Read and write typed items in a DynamoDB table
#[derive(Parser, Debug)]
#[command(name = "dynatable")]
#[command(version, about, long_about = "Read and write items in a DynamoDB table.

Environment variables:
  DYNATABLE_TABLE_NAME      - Table name (defaults to dynatable)
  DYNATABLE_HASH_KEY        - Hash key attribute (defaults to id)
  DYNATABLE_HASH_KEY_TYPE   - S, N or B (defaults to S)
  DYNATABLE_RANGE_KEY       - Range key attribute (optional)
  DYNATABLE_RANGE_KEY_TYPE  - S, N or B (defaults to S)
  AWS_ENDPOINT_URL          - Use local DynamoDB (e.g., http://localhost:8000)
  AWS_REGION                - AWS region (defaults to us-east-1)")]
pub struct Cli {
    /// Table name
    #[arg(long, short, global = true)]
    pub table: Option<String>,

    /// Hash key attribute name
    #[arg(long, global = true)]
    pub hash_key: Option<String>,

    /// Hash key type (S, N or B)
    #[arg(long, global = true)]
    pub hash_key_type: Option<KeyType>,

    /// Range key attribute name
    #[arg(long, global = true)]
    pub range_key: Option<String>,

    /// Range key type (S, N or B)
    #[arg(long, global = true)]
    pub range_key_type: Option<KeyType>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Applies command line overrides on top of the environment configuration.
    pub fn config(&self, mut config: Config) -> Config {
        if let Some(table) = &self.table {
            config.table_name = table.clone();
        }
        if let Some(hash_key) = &self.hash_key {
            config.hash_key = hash_key.clone();
        }
        if let Some(hash_key_type) = self.hash_key_type {
            config.hash_key_type = hash_key_type;
        }
        if let Some(range_key) = &self.range_key {
            config.range_key = Some(range_key.clone());
        }
        if let Some(range_key_type) = self.range_key_type {
            config.range_key_type = range_key_type;
        }
        config
    }
}

/// Available item commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Read one item by key.
    Get {
        #[command(flatten)]
        key: KeyArgs,

        /// Use a strongly consistent read.
        #[arg(long)]
        consistent: bool,

        /// Projection expression.
        #[arg(long)]
        projection: Option<String>,

        #[command(flatten)]
        expression: ExpressionArgs,
    },

    /// Write a full item given in DynamoDB JSON.
    Put {
        /// The item, e.g. '{"id": {"S": "a"}}'.
        #[arg(long)]
        item: String,

        /// Condition expression.
        #[arg(long)]
        condition: Option<String>,

        #[command(flatten)]
        expression: ExpressionArgs,
    },

    /// Apply an update expression and print the updated item.
    Update {
        #[command(flatten)]
        key: KeyArgs,

        /// Update expression, e.g. 'ADD login_count :one'.
        #[arg(long)]
        update: String,

        /// Condition expression.
        #[arg(long)]
        condition: Option<String>,

        #[command(flatten)]
        expression: ExpressionArgs,
    },

    /// Delete one item by key.
    Delete {
        #[command(flatten)]
        key: KeyArgs,

        /// Condition expression.
        #[arg(long)]
        condition: Option<String>,

        #[command(flatten)]
        expression: ExpressionArgs,
    },

    /// Read one page of items sharing a hash key.
    Query {
        /// Hash key value.
        #[arg(long)]
        hash: String,

        /// Maximum number of items to evaluate.
        #[arg(long)]
        limit: Option<i32>,

        /// Resume after this key. Accepts DynamoDB JSON, a plain JSON object
        /// of key fields, or the `LastEvaluatedKey` of a previous page.
        #[arg(long, value_name = "JSON")]
        start_key: Option<String>,

        /// Return items in descending range key order.
        #[arg(long)]
        descending: bool,

        /// Filter expression.
        #[arg(long)]
        filter: Option<String>,

        /// Projection expression.
        #[arg(long)]
        projection: Option<String>,

        #[command(flatten)]
        expression: ExpressionArgs,
    },
}

/// An item key given as plain text, parsed by the table's key types.
#[derive(Debug, Clone, Args)]
pub struct KeyArgs {
    /// Hash key value.
    #[arg(long)]
    pub hash: String,

    /// Range key value.
    #[arg(long)]
    pub range: Option<String>,
}

/// Placeholders for condition, filter, update and projection expressions.
#[derive(Debug, Clone, Default, Args)]
pub struct ExpressionArgs {
    /// Attribute name placeholder, as '#placeholder=name'. Repeatable.
    #[arg(long = "name", value_name = "#P=NAME", value_parser = parse_name)]
    pub names: Vec<(String, String)>,

    /// Attribute value placeholder in DynamoDB JSON, as ':placeholder={"S":"x"}'.
    /// Repeatable.
    #[arg(long = "value", value_name = ":P=JSON", value_parser = parse_value)]
    pub values: Vec<(String, AttributeValue)>,
}

impl ExpressionArgs {
    fn into_attributes(self) -> ExpressionAttributes {
        let mut attributes = ExpressionAttributes::default();
        for (placeholder, name) in self.names {
            attributes.insert_name(placeholder, name);
        }
        for (placeholder, value) in self.values {
            attributes.insert_value(placeholder, value);
        }
        attributes
    }
}

fn parse_name(raw: &str) -> std::result::Result<(String, String), String> {
    match raw.split_once('=') {
        Some((placeholder, name)) if placeholder.starts_with('#') && !name.is_empty() => {
            Ok((placeholder.to_string(), name.to_string()))
        }
        _ => Err(format!("expected '#placeholder=name', got {raw:?}")),
    }
}

fn parse_value(raw: &str) -> std::result::Result<(String, AttributeValue), String> {
    let Some((placeholder, json)) = raw.split_once('=') else {
        return Err(format!("expected ':placeholder=JSON', got {raw:?}"));
    };
    if !placeholder.starts_with(':') {
        return Err(format!("value placeholders start with ':', got {placeholder:?}"));
    }
    let value: Value = serde_json::from_str(json).map_err(|e| e.to_string())?;
    let value = wire::from_wire(&value).map_err(|e| e.to_string())?;
    Ok((placeholder.to_string(), value))
}

/// Parses a key given on the command line according to its key type.
/// Binary keys are base64.
pub fn key_value(raw: &str, key_type: KeyType) -> Result<AttributeValue> {
    match key_type {
        KeyType::S => Ok(AttributeValue::string(raw)),
        KeyType::N => AttributeValue::number_from_str(raw)
            .with_context(|| format!("Invalid number key: {raw}")),
        KeyType::B => base64::engine::general_purpose::STANDARD
            .decode(raw)
            .map(AttributeValue::binary)
            .with_context(|| format!("Invalid base64 key: {raw}")),
    }
}

/// Parses a `--start-key` argument. Text that is not JSON is passed on as a
/// JSON string so the table reports the shape it could not use.
pub fn start_key(raw: &str) -> StartKey {
    StartKey::raw(serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string())))
}

fn key<S: Store>(
    table: &Table<S>,
    args: &KeyArgs,
) -> Result<(AttributeValue, Option<AttributeValue>)> {
    let schema = table.schema();
    let hash = key_value(&args.hash, schema.hash_key().key_type)?;
    let range = match (&args.range, schema.range_key()) {
        (Some(raw), Some(range_key)) => Some(key_value(raw, range_key.key_type)?),
        (Some(_), None) => bail!("Table {} has no range key", table.name()),
        (None, _) => None,
    };
    Ok((hash, range))
}

/// Runs a command against the table. Returns the JSON to print, if any.
pub async fn run<S: Store>(table: &Table<S>, command: Command) -> Result<Option<Value>> {
    match command {
        Command::Get {
            key: key_args,
            consistent,
            projection,
            expression,
        } => {
            let (hash, range) = key(table, &key_args)?;
            let mut options = GetOptions {
                attributes: expression.into_attributes(),
                ..GetOptions::default()
            };
            if consistent {
                options = options.consistent_read();
            }
            if let Some(projection) = projection {
                options = options.projection(projection);
            }

            let item: RawItem = table.get_item(hash, range, options).await?;
            Ok(Some(wire::map_to_wire(&item.into_inner())))
        }
        Command::Put {
            item,
            condition,
            expression,
        } => {
            let item: Value = serde_json::from_str(&item).context("Invalid item JSON")?;
            let item = RawItem(wire::map_from_wire(&item).context("Invalid item")?);
            let options = PutOptions {
                condition,
                attributes: expression.into_attributes(),
            };

            table.put_item(&item, options).await?;
            tracing::info!(table = %table.name(), "Item written");
            Ok(None)
        }
        Command::Update {
            key: key_args,
            update,
            condition,
            expression,
        } => {
            let (hash, range) = key(table, &key_args)?;
            let options = UpdateOptions {
                update: Some(update),
                condition,
                attributes: expression.into_attributes(),
                return_values: ReturnValues::AllNew,
            };

            let item: Option<RawItem> = table.update_item_returning(hash, range, options).await?;
            Ok(item.map(|item| wire::map_to_wire(&item.into_inner())))
        }
        Command::Delete {
            key: key_args,
            condition,
            expression,
        } => {
            let (hash, range) = key(table, &key_args)?;
            let options = DeleteOptions {
                condition,
                attributes: expression.into_attributes(),
            };

            table.delete_item(hash, range, options).await?;
            tracing::info!(table = %table.name(), "Item deleted");
            Ok(None)
        }
        Command::Query {
            hash,
            limit,
            start_key: start,
            descending,
            filter,
            projection,
            expression,
        } => {
            let schema = table.schema();
            let hash = key_value(&hash, schema.hash_key().key_type)?;
            let mut options = QueryOptions {
                attributes: expression.into_attributes(),
                ..QueryOptions::default()
            }
            .key_condition("#hash_key = :hash_key")
            .attribute_name("#hash_key", schema.hash_key().name.clone())
            .attribute_value(":hash_key", hash);

            if let Some(limit) = limit {
                options = options.limit(limit);
            }
            if let Some(start) = start {
                options = options.exclusive_start_key(start_key(&start));
            }
            if descending {
                options = options.descending();
            }
            if let Some(filter) = filter {
                options = options.filter(filter);
            }
            if let Some(projection) = projection {
                options = options.projection(projection);
            }

            let page = table.query::<RawItem>(options).await?;
            let items: Vec<Value> = page
                .items
                .into_iter()
                .map(|item| wire::map_to_wire(&item.into_inner()))
                .collect();
            let last_evaluated_key = page.last_evaluated_key.as_ref().map(wire::map_to_wire);

            Ok(Some(json!({
                "Items": items,
                "LastEvaluatedKey": last_evaluated_key,
            })))
        }
    }
}
