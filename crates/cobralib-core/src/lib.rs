//! Core contracts for cobralib.
//!
//! This crate defines the engine-agnostic value, result, and schema types
//! shared by the database adapters and the file ingestion helpers.

pub mod error;
pub mod ident;
pub mod logging;
pub mod result;
pub mod schema;
pub mod value;

pub use error::{Error, Result};
pub use ident::sanitize_identifier;
pub use logging::init_logging;
pub use result::QueryResult;
pub use schema::{ColumnInfo, KeyRole};
pub use value::Value;
