//! PostgreSQL adapter.
//!
//! Catalog operations read `pg_database` and `information_schema`. The
//! wire protocol cannot switch databases in-session, so changing the
//! database opens a fresh connection with the same credentials and drops
//! the old one.

mod decode;

use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgConnectOptions, PgConnection};
use sqlx::{ConnectOptions, Connection, Executor, Row};
use tracing::debug;

use cobralib_core::{ColumnInfo, Error, KeyRole, QueryResult, Result, Value};

use crate::adapter::Relational;
use crate::config::{ConnectionConfig, EngineKind};
use crate::driver_util::map_sqlx_err;
use crate::placeholders::{self, ParamStyle};
use crate::statement::is_read_statement;

const COLUMNS_SQL: &str = "\
SELECT c.column_name,
       c.data_type,
       c.is_nullable,
       c.column_default,
       c.ordinal_position::int4 AS ordinal_position,
       coalesce(c.is_identity, 'NO') AS is_identity
FROM information_schema.columns c
WHERE c.table_schema = 'public' AND c.table_name = $1
ORDER BY c.ordinal_position";

const KEY_COLUMNS_SQL: &str = "\
SELECT kcu.column_name, tc.constraint_type
FROM information_schema.table_constraints tc
JOIN information_schema.key_column_usage kcu
  ON kcu.constraint_name = tc.constraint_name
 AND kcu.table_schema = tc.table_schema
 AND kcu.table_name = tc.table_name
WHERE tc.table_schema = 'public'
  AND tc.table_name = $1
  AND tc.constraint_type IN ('PRIMARY KEY', 'UNIQUE')";

pub struct PostgresAdapter {
    conn: Option<PgConnection>,
    config: ConnectionConfig,
    database: Option<String>,
}

impl PostgresAdapter {
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let mut conn = Self::open(config, config.database.as_deref()).await?;
        let database = match &config.database {
            Some(db) => db.clone(),
            // The server picked the default database for this role.
            None => sqlx::query_scalar::<_, String>("SELECT current_database()")
                .fetch_one(&mut conn)
                .await
                .map_err(map_sqlx_err)?,
        };
        debug!(host = config.host(), database, "connected to postgres");
        Ok(Self {
            conn: Some(conn),
            config: config.clone(),
            database: Some(database),
        })
    }

    async fn open(config: &ConnectionConfig, database: Option<&str>) -> Result<PgConnection> {
        let mut options = PgConnectOptions::new()
            .host(config.host())
            .port(config.port_or_default())
            .username(config.username())
            .password(config.password());
        if let Some(database) = database {
            options = options.database(database);
        }
        options
            .connect()
            .await
            .map_err(|err| Error::Connection(format!("postgres connect failed: {err}")))
    }

    fn conn(&mut self) -> Result<&mut PgConnection> {
        self.conn
            .as_mut()
            .ok_or_else(|| Error::Connection("connection is closed".to_string()))
    }

    /// A database argument other than the current one cannot be served
    /// over this connection.
    fn check_database_arg(&self, database: Option<&str>) -> Result<()> {
        match database {
            Some(db) if Some(db) != self.database.as_deref() => Err(Error::Unsupported(format!(
                "postgres cannot inspect database '{db}' over a connection to '{}'",
                self.database.as_deref().unwrap_or_default()
            ))),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl Relational for PostgresAdapter {
    fn engine(&self) -> EngineKind {
        EngineKind::Postgres
    }

    fn current_database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    async fn change_database(&mut self, name: &str) -> Result<()> {
        if self.conn.is_none() {
            return Err(Error::Connection("connection is closed".to_string()));
        }
        let new_conn = Self::open(&self.config, Some(name)).await?;
        if let Some(old) = self.conn.replace(new_conn) {
            // Best effort; the replacement connection is already live.
            let _ = old.close().await;
        }
        self.database = Some(name.to_string());
        debug!(database = name, "reconnected to postgres database");
        Ok(())
    }

    async fn list_databases(&mut self) -> Result<QueryResult> {
        let conn = self.conn()?;
        let names: Vec<String> = sqlx::query_scalar(
            "SELECT datname FROM pg_database WHERE datistemplate = false ORDER BY datname",
        )
        .fetch_all(&mut *conn)
        .await
        .map_err(map_sqlx_err)?;
        Ok(QueryResult::tabular(
            vec!["Databases".to_string()],
            names.into_iter().map(|n| vec![Value::Text(n)]).collect(),
        ))
    }

    async fn list_tables(&mut self, database: Option<&str>) -> Result<QueryResult> {
        self.check_database_arg(database)?;
        let conn = self.conn()?;
        let names: Vec<String> = sqlx::query_scalar(
            "SELECT table_name FROM information_schema.tables \
             WHERE table_schema = 'public' AND table_type = 'BASE TABLE' \
             ORDER BY table_name",
        )
        .fetch_all(&mut *conn)
        .await
        .map_err(map_sqlx_err)?;
        Ok(QueryResult::tabular(
            vec!["Tables".to_string()],
            names.into_iter().map(|n| vec![Value::Text(n)]).collect(),
        ))
    }

    async fn table_columns(
        &mut self,
        table: &str,
        database: Option<&str>,
    ) -> Result<Vec<ColumnInfo>> {
        self.check_database_arg(database)?;
        let conn = self.conn()?;

        let key_rows = sqlx::query(KEY_COLUMNS_SQL)
            .bind(table)
            .fetch_all(&mut *conn)
            .await
            .map_err(map_sqlx_err)?;
        let key_for = |name: &str| {
            let mut role = KeyRole::None;
            for row in &key_rows {
                let column: String = row.try_get("column_name").unwrap_or_default();
                if column != name {
                    continue;
                }
                let kind: String = row.try_get("constraint_type").unwrap_or_default();
                if kind == "PRIMARY KEY" {
                    return KeyRole::Primary;
                }
                role = KeyRole::Unique;
            }
            role
        };

        let rows = sqlx::query(COLUMNS_SQL)
            .bind(table)
            .fetch_all(&mut *conn)
            .await
            .map_err(map_sqlx_err)?;
        if rows.is_empty() {
            return Err(Error::Statement(format!("no such table: {table}")));
        }
        let mut columns = Vec::with_capacity(rows.len());
        for row in &rows {
            let name: String = row.try_get("column_name").map_err(map_sqlx_err)?;
            let is_nullable: String = row.try_get("is_nullable").map_err(map_sqlx_err)?;
            let is_identity: String = row.try_get("is_identity").map_err(map_sqlx_err)?;
            columns.push(ColumnInfo {
                ordinal_position: row
                    .try_get::<i32, _>("ordinal_position")
                    .map_err(map_sqlx_err)?,
                data_type: row.try_get("data_type").map_err(map_sqlx_err)?,
                is_nullable: is_nullable == "YES",
                key: key_for(&name),
                default: row.try_get("column_default").map_err(map_sqlx_err)?,
                extra: (is_identity == "YES").then(|| "identity".to_string()),
                name,
            });
        }
        Ok(columns)
    }

    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        placeholders::check_params(sql, params.len())?;
        let is_read = is_read_statement(sql);
        let conn = self.conn()?;

        if params.is_empty() {
            if is_read {
                let rows = conn.fetch_all(sql).await.map_err(map_sqlx_err)?;
                return Ok(decode::rows_to_result(&rows));
            }
            let done = conn.execute(sql).await.map_err(map_sqlx_err)?;
            return Ok(QueryResult::from_write(done.rows_affected()));
        }

        let (sql, _) = placeholders::rewrite(sql, ParamStyle::Dollar);
        let mut query = sqlx::query(&sql);
        for value in params {
            query = bind_value(query, value);
        }
        if is_read {
            let rows = query.fetch_all(&mut *conn).await.map_err(map_sqlx_err)?;
            Ok(decode::rows_to_result(&rows))
        } else {
            let done = query.execute(&mut *conn).await.map_err(map_sqlx_err)?;
            Ok(QueryResult::from_write(done.rows_affected()))
        }
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.conn.take() {
            conn.close()
                .await
                .map_err(|err| Error::Connection(err.to_string()))?;
            debug!("closed postgres connection");
        }
        Ok(())
    }
}

fn bind_value<'q>(
    query: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    value: &'q Value,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(v) => query.bind(*v),
        Value::Int16(v) => query.bind(*v),
        Value::Int32(v) => query.bind(*v),
        Value::Int64(v) => query.bind(*v),
        Value::Float32(v) => query.bind(*v),
        Value::Float64(v) => query.bind(*v),
        Value::Decimal(v) => query.bind(*v),
        Value::Text(v) => query.bind(v.as_str()),
        Value::Bytes(v) => query.bind(v.as_slice()),
        Value::Date(v) => query.bind(*v),
        Value::Time(v) => query.bind(*v),
        Value::DateTime(v) => query.bind(*v),
        Value::Uuid(v) => query.bind(*v),
        Value::Json(v) => query.bind(v.clone()),
    }
}
