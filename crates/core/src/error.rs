use thiserror::Error;

use crate::store::StoreError;

/// Errors that can occur during table operations.
///
/// `Conversion`, `Normalization` and `InvalidKey` are detected locally before
/// any store call is made. `Store` carries the store's own code and message
/// unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("Cannot convert attribute `{attribute}`: {reason}")]
    Conversion { attribute: String, reason: String },
    #[error("Item not found")]
    ItemNotFound,
    #[error("Invalid start key: {0}")]
    Normalization(String),
    #[error("Invalid primary key: {0}")]
    InvalidKey(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TableError {
    pub fn conversion(attribute: impl Into<String>, reason: impl ToString) -> Self {
        TableError::Conversion {
            attribute: attribute.into(),
            reason: reason.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, TableError::ItemNotFound)
    }

    /// The store's error code, when the failure came from the store.
    pub fn store_code(&self) -> Option<&str> {
        match self {
            TableError::Store(err) => Some(err.code()),
            _ => None,
        }
    }
}

/// Result type for table operations.
pub type Result<T> = std::result::Result<T, TableError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conversion_display() {
        let error = TableError::conversion("role", "Expected SS, found L");
        assert_eq!(
            error.to_string(),
            "Cannot convert attribute `role`: Expected SS, found L"
        );
    }

    #[test]
    fn test_item_not_found_is_distinguished() {
        assert!(TableError::ItemNotFound.is_not_found());
        assert!(!TableError::Normalization("x".to_string()).is_not_found());
    }

    #[test]
    fn test_store_error_is_transparent() {
        let error: TableError =
            StoreError::new(StoreError::CONDITIONAL_CHECK_FAILED, "The conditional request failed")
                .into();
        assert_eq!(
            error.to_string(),
            "ConditionalCheckFailedException: The conditional request failed"
        );
        assert_eq!(error.store_code(), Some("ConditionalCheckFailedException"));
    }

    #[test]
    fn test_local_errors_have_no_store_code() {
        assert_eq!(TableError::ItemNotFound.store_code(), None);
        assert_eq!(TableError::InvalidKey("x".to_string()).store_code(), None);
    }
}
