use async_trait::async_trait;

use cobralib_core::{ColumnInfo, QueryResult, Result, Value};

use crate::config::EngineKind;

/// Capability contract implemented by every database adapter.
///
/// One adapter instance owns exactly one live connection handle. All
/// methods issue a single request and wait for the engine's response;
/// nothing is retried or parallelized internally.
#[async_trait]
pub trait Relational: Send {
    /// Engine this adapter talks to.
    fn engine(&self) -> EngineKind;

    /// Database the adapter currently operates in, when one is selected.
    fn current_database(&self) -> Option<&str>;

    /// Switch the active database.
    ///
    /// SQLite has no multi-database concept and returns
    /// [`Error::Unsupported`](cobralib_core::Error::Unsupported);
    /// PostgreSQL reconnects, since its protocol cannot switch in-session.
    async fn change_database(&mut self, name: &str) -> Result<()>;

    /// List databases visible to the connected user, as a single
    /// `Databases` column.
    ///
    /// SQLite returns an empty result annotated with a note instead of
    /// failing.
    async fn list_databases(&mut self) -> Result<QueryResult>;

    /// List tables in the given database, or the current one when `None`,
    /// as a single `Tables` column.
    async fn list_tables(&mut self, database: Option<&str>) -> Result<QueryResult>;

    /// Column metadata for a table in the given or current database.
    async fn table_columns(
        &mut self,
        table: &str,
        database: Option<&str>,
    ) -> Result<Vec<ColumnInfo>>;

    /// Execute a statement with `?` placeholders.
    ///
    /// Placeholders are rewritten to the engine's native style before
    /// execution; the number of placeholders must match `params` exactly.
    /// Read statements return rows, writes return `rows_affected`.
    /// Writes with a `RETURNING` clause are fetched like reads and
    /// return their rows.
    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<QueryResult>;

    /// Release the connection handle. Idempotent: closing twice is a
    /// no-op, but any other call after close fails with a connection
    /// error.
    async fn close(&mut self) -> Result<()>;
}
