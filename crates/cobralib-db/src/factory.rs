use tracing::info;

use cobralib_core::Result;

use crate::adapter::Relational;
use crate::config::{ConnectionConfig, EngineKind};
use crate::mssql::MssqlAdapter;
use crate::mysql::MySqlAdapter;
use crate::postgres::PostgresAdapter;
use crate::sqlite::SqliteAdapter;

/// Open a connection and return the adapter for the configured engine.
///
/// Fails with a configuration error when required credentials are missing,
/// or a connection error when the engine is unreachable.
pub async fn connect(config: &ConnectionConfig) -> Result<Box<dyn Relational>> {
    config.validate()?;

    let adapter: Box<dyn Relational> = match config.engine {
        EngineKind::MySql => Box::new(MySqlAdapter::connect(config).await?),
        EngineKind::Postgres => Box::new(PostgresAdapter::connect(config).await?),
        EngineKind::Sqlite => Box::new(SqliteAdapter::connect(config).await?),
        EngineKind::SqlServer => Box::new(MssqlAdapter::connect(config).await?),
    };

    info!(engine = %config.engine, "opened database connection");
    Ok(adapter)
}
