use thiserror::Error;

/// Errors raised while constructing or reading attribute values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AttributeError {
    #[error("Empty {0} is not a valid attribute value")]
    EmptySet(&'static str),
    #[error("Invalid number: {0:?}")]
    InvalidNumber(String),
    #[error("Expected {expected}, found {found}")]
    UnexpectedType {
        expected: &'static str,
        found: &'static str,
    },
    #[error("Malformed attribute value: {0}")]
    Malformed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_set_display() {
        let error = AttributeError::EmptySet("SS");
        assert_eq!(error.to_string(), "Empty SS is not a valid attribute value");
    }

    #[test]
    fn test_unexpected_type_display() {
        let error = AttributeError::UnexpectedType {
            expected: "SS",
            found: "L",
        };
        assert_eq!(error.to_string(), "Expected SS, found L");
    }

    #[test]
    fn test_invalid_number_display() {
        let error = AttributeError::InvalidNumber("12abc".to_string());
        assert_eq!(error.to_string(), "Invalid number: \"12abc\"");
    }
}
