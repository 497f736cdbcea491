//! DynamoDB error mapping.
//!
//! Maps AWS SDK errors to `StoreError`, keeping the service's own error code
//! and message so callers can match on them.

use std::error::Error;
use std::fmt::Debug;

use aws_sdk_dynamodb::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use dynatable_core::StoreError;

/// Map any operation's SDK error to StoreError.
///
/// Service errors keep their exception name as the code. Errors that never
/// reached the service (dispatch, timeout, credentials) become
/// `ConnectionFailed`.
pub fn map_sdk_error<E, R>(err: SdkError<E, R>) -> StoreError
where
    E: ProvideErrorMetadata + Error + Send + Sync + 'static,
    R: Debug + Send + Sync + 'static,
{
    match err.code() {
        Some(code) => StoreError::new(code, err.message().unwrap_or_default()),
        None => map_connection_error(DisplayErrorContext(&err)),
    }
}

/// Map a generic connection/config error to StoreError.
pub fn map_connection_error(err: impl std::fmt::Display) -> StoreError {
    StoreError::new(StoreError::CONNECTION_FAILED, err.to_string())
}
