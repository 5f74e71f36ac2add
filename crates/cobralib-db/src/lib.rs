//! Uniform facade over MySQL, PostgreSQL, SQLite, and SQL Server.
//!
//! The [`Relational`] trait is the capability contract every adapter
//! implements; [`connect`] is the factory that picks the adapter from a
//! [`ConnectionConfig`]. Statements use one placeholder convention (`?`)
//! across all engines, and the [`load`] module fills existing tables from
//! delimited text, Excel, or PDF sources.

pub mod adapter;
pub mod config;
pub mod factory;
pub mod load;
pub mod placeholders;
pub mod statement;

mod driver_util;
mod mssql;
mod mysql;
mod postgres;
mod sqlite;

pub use adapter::Relational;
pub use config::{ConnectionConfig, EngineKind};
pub use factory::connect;
pub use load::{load_delimited, load_excel, load_pdf, load_rows, Coerce, ColumnMap};
pub use mssql::MssqlAdapter;
pub use mysql::MySqlAdapter;
pub use postgres::PostgresAdapter;
pub use sqlite::SqliteAdapter;

pub use cobralib_core::{ColumnInfo, Error, KeyRole, QueryResult, Result, Value};
pub use cobralib_ingest::{DelimitedOptions, Delimiter, TextTable};
