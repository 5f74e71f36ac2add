//! SQLite adapter.
//!
//! One file is one database, so the multi-database operations degrade
//! deliberately: listing databases yields an annotated empty result and
//! switching databases is refused outright.

mod decode;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteArguments, SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection, Executor, Row};
use tracing::debug;

use cobralib_core::{ColumnInfo, Error, KeyRole, QueryResult, Result, Value};

use crate::adapter::Relational;
use crate::config::{ConnectionConfig, EngineKind};
use crate::driver_util::map_sqlx_err;
use crate::placeholders::{self, ParamStyle};
use crate::statement::is_read_statement;

pub struct SqliteAdapter {
    conn: Option<SqliteConnection>,
    database: String,
}

impl SqliteAdapter {
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let path = config
            .path
            .as_ref()
            .ok_or_else(|| Error::Config("sqlite requires a database file path".to_string()))?;
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let conn = options
            .connect()
            .await
            .map_err(|err| Error::Connection(format!("sqlite open failed: {err}")))?;
        let database = path.display().to_string();
        debug!(database, "opened sqlite database");
        Ok(Self {
            conn: Some(conn),
            database,
        })
    }

    fn conn(&mut self) -> Result<&mut SqliteConnection> {
        self.conn
            .as_mut()
            .ok_or_else(|| Error::Connection("connection is closed".to_string()))
    }
}

#[async_trait]
impl Relational for SqliteAdapter {
    fn engine(&self) -> EngineKind {
        EngineKind::Sqlite
    }

    fn current_database(&self) -> Option<&str> {
        Some(&self.database)
    }

    async fn change_database(&mut self, _name: &str) -> Result<()> {
        Err(Error::Unsupported(
            "sqlite manages a single database per file; open a new connection instead".to_string(),
        ))
    }

    async fn list_databases(&mut self) -> Result<QueryResult> {
        // Annotated empty result, never an error.
        self.conn()?;
        Ok(QueryResult::unsupported(
            vec!["Databases".to_string()],
            "sqlite manages a single database per file",
        ))
    }

    async fn list_tables(&mut self, database: Option<&str>) -> Result<QueryResult> {
        if let Some(db) = database {
            if db != "main" && db != self.database {
                return Err(Error::Unsupported(format!(
                    "sqlite cannot list tables of another database ('{db}')"
                )));
            }
        }
        let conn = self.conn()?;
        let names: Vec<String> = sqlx::query_scalar(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite_%' \
             ORDER BY name",
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
        if let Some(db) = database {
            if db != "main" && db != self.database {
                return Err(Error::Unsupported(format!(
                    "sqlite cannot inspect tables of another database ('{db}')"
                )));
            }
        }
        let conn = self.conn()?;
        let rows = sqlx::query(
            "SELECT cid, name, type, \"notnull\", dflt_value, pk \
             FROM pragma_table_info(?) ORDER BY cid",
        )
        .bind(table)
        .fetch_all(&mut *conn)
        .await
        .map_err(map_sqlx_err)?;
        if rows.is_empty() {
            return Err(Error::Statement(format!("no such table: {table}")));
        }

        let mut columns = Vec::with_capacity(rows.len());
        for row in &rows {
            let cid: i64 = row.try_get("cid").map_err(map_sqlx_err)?;
            let notnull: i64 = row.try_get("notnull").map_err(map_sqlx_err)?;
            let pk: i64 = row.try_get("pk").map_err(map_sqlx_err)?;
            columns.push(ColumnInfo {
                ordinal_position: (cid + 1) as i32,
                name: row.try_get("name").map_err(map_sqlx_err)?,
                data_type: row.try_get("type").map_err(map_sqlx_err)?,
                is_nullable: notnull == 0 && pk == 0,
                key: if pk > 0 { KeyRole::Primary } else { KeyRole::None },
                default: row.try_get("dflt_value").map_err(map_sqlx_err)?,
                extra: None,
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

        let (sql, _) = placeholders::rewrite(sql, ParamStyle::Question);
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
            debug!("closed sqlite database");
        }
        Ok(())
    }
}

fn bind_value<'q>(
    query: sqlx::query::Query<'q, sqlx::Sqlite, SqliteArguments<'q>>,
    value: &'q Value,
) -> sqlx::query::Query<'q, sqlx::Sqlite, SqliteArguments<'q>> {
    match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(v) => query.bind(*v),
        Value::Int16(v) => query.bind(i32::from(*v)),
        Value::Int32(v) => query.bind(*v),
        Value::Int64(v) => query.bind(*v),
        Value::Float32(v) => query.bind(f64::from(*v)),
        Value::Float64(v) => query.bind(*v),
        // SQLite has no decimal/uuid/json affinities; store text.
        Value::Decimal(v) => query.bind(v.to_string()),
        Value::Text(v) => query.bind(v.as_str()),
        Value::Bytes(v) => query.bind(v.as_slice()),
        Value::Date(v) => query.bind(*v),
        Value::Time(v) => query.bind(*v),
        Value::DateTime(v) => query.bind(*v),
        Value::Uuid(v) => query.bind(v.to_string()),
        Value::Json(v) => query.bind(v.to_string()),
    }
}
