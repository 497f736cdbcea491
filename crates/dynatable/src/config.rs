use std::env;

use dynatable_core::{KeySchema, KeyType};

/// Table and connection settings loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Table name (default: "dynatable")
    pub table_name: String,
    /// Hash key attribute name (default: "id")
    pub hash_key: String,
    /// Hash key type (default: S)
    pub hash_key_type: KeyType,
    /// Range key attribute name, if the table has one
    pub range_key: Option<String>,
    /// Range key type (default: S)
    pub range_key_type: KeyType,
    /// Custom endpoint URL, for local DynamoDB
    pub endpoint_url: Option<String>,
    /// AWS region (default: "us-east-1")
    pub region: String,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `DYNATABLE_TABLE_NAME` - Table name (default: "dynatable")
    /// - `DYNATABLE_HASH_KEY` - Hash key attribute (default: "id")
    /// - `DYNATABLE_HASH_KEY_TYPE` - `S`, `N` or `B` (default: `S`)
    /// - `DYNATABLE_RANGE_KEY` - Range key attribute (optional)
    /// - `DYNATABLE_RANGE_KEY_TYPE` - `S`, `N` or `B` (default: `S`)
    /// - `AWS_ENDPOINT_URL` - Custom endpoint (optional)
    /// - `AWS_REGION` - AWS region (default: "us-east-1")
    pub fn from_env() -> Self {
        Self {
            table_name: env::var("DYNATABLE_TABLE_NAME")
                .unwrap_or_else(|_| "dynatable".to_string()),
            hash_key: env::var("DYNATABLE_HASH_KEY").unwrap_or_else(|_| "id".to_string()),
            hash_key_type: env::var("DYNATABLE_HASH_KEY_TYPE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(KeyType::S),
            range_key: env::var("DYNATABLE_RANGE_KEY")
                .ok()
                .filter(|v| !v.is_empty()),
            range_key_type: env::var("DYNATABLE_RANGE_KEY_TYPE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(KeyType::S),
            endpoint_url: env::var("AWS_ENDPOINT_URL").ok(),
            region: env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
        }
    }

    /// The table's key schema.
    pub fn key_schema(&self) -> KeySchema {
        let schema = KeySchema::new(&self.hash_key, self.hash_key_type);
        match &self.range_key {
            Some(range_key) => schema.with_range_key(range_key, self.range_key_type),
            None => schema,
        }
    }

    /// Returns a display string for the target environment.
    pub fn target_display(&self) -> String {
        match &self.endpoint_url {
            Some(url) => format!("Local DynamoDB ({url}), table {}", self.table_name),
            None => format!("AWS DynamoDB (region: {}), table {}", self.region, self.table_name),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
