//! Store backends and command line client for `dynatable_core` tables.
//!
//! The in-memory backend is always compiled; the DynamoDB backend is behind
//! the `dynamodb` feature.

pub mod cli;
pub mod config;
pub mod storage;

pub use config::Config;
