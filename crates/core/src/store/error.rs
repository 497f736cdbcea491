use thiserror::Error;

/// An error reported by the store, carried verbatim.
///
/// `code` is the store's native error code (for DynamoDB, the exception name
/// such as `ConditionalCheckFailedException`).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct StoreError {
    code: String,
    message: String,
}

impl StoreError {
    pub const CONDITIONAL_CHECK_FAILED: &'static str = "ConditionalCheckFailedException";
    pub const SERIALIZATION: &'static str = "SerializationError";
    pub const VALIDATION: &'static str = "ValidationException";
    pub const RESOURCE_NOT_FOUND: &'static str = "ResourceNotFoundException";
    pub const CONNECTION_FAILED: &'static str = "ConnectionFailed";

    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_conditional_check_failed(&self) -> bool {
        self.code == Self::CONDITIONAL_CHECK_FAILED
    }
}

/// Result type for store calls.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
