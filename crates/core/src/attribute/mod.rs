mod error;
mod value;
pub mod wire;

pub use error::AttributeError;
pub use value::{AttributeMap, AttributeValue, Number};
pub(crate) use value::{canonical_number, validate_number};
