//! Pagination start keys and their normalization.

mod normalizer;
mod types;

pub use normalizer::CursorNormalizer;
pub use types::{ExclusiveStartKey, StartKey};
