//! MySQL adapter.
//!
//! Catalog operations lean on the server's own introspection statements
//! (`SHOW DATABASES`, `SHOW TABLES`, `SHOW COLUMNS`). `USE` cannot be
//! prepared, so parameter-less statements always run over the text
//! protocol.

mod decode;

use async_trait::async_trait;
use sqlx::mysql::{MySqlArguments, MySqlConnectOptions, MySqlConnection};
use sqlx::{ConnectOptions, Connection, Executor};
use tracing::debug;

use cobralib_core::{ColumnInfo, Error, KeyRole, QueryResult, Result, Value};

use crate::adapter::Relational;
use crate::config::{ConnectionConfig, EngineKind};
use crate::driver_util::map_sqlx_err;
use crate::placeholders::{self, ParamStyle};
use crate::statement::is_read_statement;

pub struct MySqlAdapter {
    conn: Option<MySqlConnection>,
    database: Option<String>,
}

impl MySqlAdapter {
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let mut options = MySqlConnectOptions::new()
            .host(config.host())
            .port(config.port_or_default())
            .username(config.username())
            .password(config.password());
        if let Some(database) = &config.database {
            options = options.database(database);
        }
        let conn = options
            .connect()
            .await
            .map_err(|err| Error::Connection(format!("mysql connect failed: {err}")))?;
        debug!(host = config.host(), "connected to mysql");
        Ok(Self {
            conn: Some(conn),
            database: config.database.clone(),
        })
    }

    fn conn(&mut self) -> Result<&mut MySqlConnection> {
        self.conn
            .as_mut()
            .ok_or_else(|| Error::Connection("connection is closed".to_string()))
    }

    fn quote_ident(name: &str) -> Result<String> {
        if name.contains('`') {
            return Err(Error::Statement(format!("invalid identifier '{name}'")));
        }
        Ok(format!("`{name}`"))
    }
}

#[async_trait]
impl Relational for MySqlAdapter {
    fn engine(&self) -> EngineKind {
        EngineKind::MySql
    }

    fn current_database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    async fn change_database(&mut self, name: &str) -> Result<()> {
        let sql = format!("USE {}", Self::quote_ident(name)?);
        let conn = self.conn()?;
        conn.execute(sql.as_str()).await.map_err(map_sqlx_err)?;
        self.database = Some(name.to_string());
        debug!(database = name, "switched mysql database");
        Ok(())
    }

    async fn list_databases(&mut self) -> Result<QueryResult> {
        let conn = self.conn()?;
        let rows = conn
            .fetch_all("SHOW DATABASES")
            .await
            .map_err(map_sqlx_err)?;
        let names = rows
            .iter()
            .map(|row| vec![Value::Text(decode::decode_value(row, 0).as_text())])
            .collect();
        Ok(QueryResult::tabular(vec!["Databases".to_string()], names))
    }

    async fn list_tables(&mut self, database: Option<&str>) -> Result<QueryResult> {
        let database = database
            .or(self.database.as_deref())
            .ok_or_else(|| Error::Statement("no database is currently selected".to_string()))?
            .to_string();
        let sql = format!("SHOW TABLES FROM {}", Self::quote_ident(&database)?);
        let conn = self.conn()?;
        let rows = conn.fetch_all(sql.as_str()).await.map_err(map_sqlx_err)?;
        let names = rows
            .iter()
            .map(|row| vec![Value::Text(decode::decode_value(row, 0).as_text())])
            .collect();
        Ok(QueryResult::tabular(vec!["Tables".to_string()], names))
    }

    async fn table_columns(
        &mut self,
        table: &str,
        database: Option<&str>,
    ) -> Result<Vec<ColumnInfo>> {
        let database = database
            .or(self.database.as_deref())
            .ok_or_else(|| Error::Statement("no database is currently selected".to_string()))?
            .to_string();
        let sql = format!(
            "SHOW COLUMNS FROM {}.{}",
            Self::quote_ident(&database)?,
            Self::quote_ident(table)?
        );
        let conn = self.conn()?;
        let rows = conn.fetch_all(sql.as_str()).await.map_err(map_sqlx_err)?;

        // SHOW COLUMNS yields Field, Type, Null, Key, Default, Extra.
        let mut columns = Vec::with_capacity(rows.len());
        for (idx, row) in rows.iter().enumerate() {
            let cell = |pos: usize| decode::decode_value(row, pos);
            let key = match cell(3).as_text().as_str() {
                "PRI" => KeyRole::Primary,
                "UNI" => KeyRole::Unique,
                "MUL" => KeyRole::Index,
                _ => KeyRole::None,
            };
            let default = match cell(4) {
                Value::Null => None,
                other => Some(other.as_text()),
            };
            let extra = Some(cell(5).as_text()).filter(|s| !s.is_empty());
            columns.push(ColumnInfo {
                ordinal_position: (idx + 1) as i32,
                name: cell(0).as_text(),
                data_type: cell(1).as_text(),
                is_nullable: cell(2).as_text().eq_ignore_ascii_case("YES"),
                key,
                default,
                extra,
            });
        }
        Ok(columns)
    }

    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        placeholders::check_params(sql, params.len())?;
        let is_read = is_read_statement(sql);
        let conn = self.conn()?;

        if params.is_empty() {
            // Text protocol: statements like USE cannot be prepared.
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
            debug!("closed mysql connection");
        }
        Ok(())
    }
}

fn bind_value<'q>(
    query: sqlx::query::Query<'q, sqlx::MySql, MySqlArguments>,
    value: &'q Value,
) -> sqlx::query::Query<'q, sqlx::MySql, MySqlArguments> {
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
        // MySQL has no uuid type; bind the canonical text form.
        Value::Uuid(v) => query.bind(v.to_string()),
        Value::Json(v) => query.bind(v.clone()),
    }
}
