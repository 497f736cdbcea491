//! Shared record fixture for table integration tests.

#![allow(dead_code)]

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use dynatable_core::{
    marshal_keyed, primary_key, AttributeError, AttributeMap, AttributeValue, FieldOverride,
    ItemCodec, KeyResolver, KeySchema, KeyType, Result, StructuralCodec,
};

pub const TABLE_NAME: &str = "logins";

const PASSWORD_SALT: &str = "THIS VALUE IS SECRET";

const LOGIN_CODEC: StructuralCodec = StructuralCodec::with_overrides(&[
    FieldOverride::string_set("role"),
    FieldOverride::new("password", encode_password, decode_password),
]);

/// A login event keyed by user and unix timestamp.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Login {
    pub user_id: String,
    pub date: i64,
    pub password: String,
    pub status: String,
    pub login_count: i64,
    pub role: Vec<String>,
}

impl Login {
    /// A record carrying only its key, usable as a query cursor.
    pub fn key(user_id: &str, date: i64) -> Self {
        Self {
            user_id: user_id.to_string(),
            date,
            ..Self::default()
        }
    }
}

impl KeyResolver for Login {
    fn primary_key(&self) -> AttributeMap {
        primary_key(
            ("user_id", AttributeValue::string(&self.user_id)),
            Some(("date", AttributeValue::number(self.date))),
        )
    }

    fn is_key_only(&self) -> bool {
        !self.user_id.is_empty()
            && self.date != 0
            && self.password.is_empty()
            && self.status.is_empty()
            && self.login_count == 0
            && self.role.is_empty()
    }
}

impl ItemCodec for Login {
    fn marshal_item(&self) -> Result<AttributeMap> {
        marshal_keyed(self, &LOGIN_CODEC)
    }

    fn unmarshal_item(item: AttributeMap) -> Result<Self> {
        LOGIN_CODEC.decode(item)
    }
}

pub fn schema() -> KeySchema {
    KeySchema::new("user_id", KeyType::S).with_range_key("date", KeyType::N)
}

/// The value stored in place of a plaintext password.
pub fn hash_password(password: &str) -> String {
    let digest = Sha256::digest(format!("{password}{PASSWORD_SALT}").as_bytes());
    URL_SAFE.encode(digest)
}

fn encode_password(field: &Value) -> std::result::Result<Option<AttributeValue>, AttributeError> {
    match field {
        Value::String(password) if password.is_empty() => Ok(None),
        Value::String(password) => Ok(Some(AttributeValue::string(hash_password(password)))),
        Value::Null => Ok(None),
        _ => Err(AttributeError::UnexpectedType {
            expected: "string",
            found: "non-string",
        }),
    }
}

fn decode_password(
    attribute: Option<AttributeValue>,
) -> std::result::Result<Value, AttributeError> {
    match attribute {
        None => Ok(Value::String(String::new())),
        Some(AttributeValue::S(hash)) => Ok(Value::String(hash)),
        Some(other) => Err(AttributeError::UnexpectedType {
            expected: "S",
            found: other.type_name(),
        }),
    }
}

