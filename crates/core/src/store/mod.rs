//! The store collaborator: the trait a backend implements and the request and
//! response shapes it exchanges with [`Table`](crate::Table).

mod error;
mod traits;
mod types;

pub use error::{StoreError, StoreResult};
pub use traits::Store;
pub use types::{
    DeleteItemInput, GetItemInput, PutItemInput, QueryInput, QueryOutput, UpdateItemInput,
    UpdateItemOutput,
};
