//! Marshaling between records and attribute maps.

mod overrides;
mod structural;
mod traits;

pub use overrides::{DecodeFn, EncodeFn, FieldOverride};
pub use structural::{decode_value, encode_value, marshal_keyed, StructuralCodec};
pub use traits::{ItemCodec, RawItem};
