//! SQL Server adapter, speaking TDS via tiberius over a tokio TCP stream.
//!
//! Catalog operations read `sys.databases` and `INFORMATION_SCHEMA`,
//! qualified with the target database so they work without switching the
//! session.

mod decode;

use async_trait::async_trait;
use tiberius::{AuthMethod, Client, Config as TdsConfig, Query as TdsQuery};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::debug;

use cobralib_core::{ColumnInfo, Error, KeyRole, QueryResult, Result, Value};

use crate::adapter::Relational;
use crate::config::{ConnectionConfig, EngineKind};
use crate::placeholders::{self, ParamStyle};
use crate::statement::is_read_statement;

type TdsClient = Client<Compat<TcpStream>>;

pub struct MssqlAdapter {
    client: Option<TdsClient>,
    database: Option<String>,
}

impl MssqlAdapter {
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let mut tds = TdsConfig::new();
        tds.host(config.host());
        tds.port(config.port_or_default());
        tds.authentication(AuthMethod::sql_server(config.username(), config.password()));
        tds.trust_cert();
        if let Some(database) = &config.database {
            tds.database(database);
        }

        let tcp = TcpStream::connect(tds.get_addr())
            .await
            .map_err(|err| Error::Connection(format!("mssql connect failed: {err}")))?;
        tcp.set_nodelay(true)
            .map_err(|err| Error::Connection(err.to_string()))?;
        let mut client = Client::connect(tds, tcp.compat_write())
            .await
            .map_err(map_tds_err)?;

        let database = match &config.database {
            Some(db) => db.clone(),
            None => {
                let rows = client
                    .simple_query("SELECT DB_NAME()")
                    .await
                    .map_err(map_tds_err)?
                    .into_first_result()
                    .await
                    .map_err(map_tds_err)?;
                rows.first()
                    .and_then(|row| row.try_get::<&str, _>(0).ok().flatten())
                    .unwrap_or("master")
                    .to_string()
            }
        };
        debug!(host = config.host(), database, "connected to sql server");
        Ok(Self {
            client: Some(client),
            database: Some(database),
        })
    }

    fn client(&mut self) -> Result<&mut TdsClient> {
        self.client
            .as_mut()
            .ok_or_else(|| Error::Connection("connection is closed".to_string()))
    }

    fn quote_ident(name: &str) -> Result<String> {
        if name.contains(']') {
            return Err(Error::Statement(format!("invalid identifier '{name}'")));
        }
        Ok(format!("[{name}]"))
    }

    fn target_database(&self, database: Option<&str>) -> Result<String> {
        database
            .or(self.database.as_deref())
            .map(str::to_string)
            .ok_or_else(|| Error::Statement("no database is currently selected".to_string()))
    }
}

#[async_trait]
impl Relational for MssqlAdapter {
    fn engine(&self) -> EngineKind {
        EngineKind::SqlServer
    }

    fn current_database(&self) -> Option<&str> {
        self.database.as_deref()
    }

    async fn change_database(&mut self, name: &str) -> Result<()> {
        let sql = format!("USE {}", Self::quote_ident(name)?);
        let client = self.client()?;
        client.simple_query(&sql).await.map_err(map_tds_err)?;
        self.database = Some(name.to_string());
        debug!(database = name, "switched sql server database");
        Ok(())
    }

    async fn list_databases(&mut self) -> Result<QueryResult> {
        let client = self.client()?;
        let rows = client
            .simple_query("SELECT name FROM sys.databases ORDER BY name")
            .await
            .map_err(map_tds_err)?
            .into_first_result()
            .await
            .map_err(map_tds_err)?;
        let names = rows
            .iter()
            .filter_map(|row| row.try_get::<&str, _>(0).ok().flatten())
            .map(|name| vec![Value::Text(name.to_string())])
            .collect();
        Ok(QueryResult::tabular(vec!["Databases".to_string()], names))
    }

    async fn list_tables(&mut self, database: Option<&str>) -> Result<QueryResult> {
        let database = self.target_database(database)?;
        let sql = format!(
            "SELECT TABLE_NAME FROM {}.INFORMATION_SCHEMA.TABLES \
             WHERE TABLE_TYPE = 'BASE TABLE' ORDER BY TABLE_NAME",
            Self::quote_ident(&database)?
        );
        let client = self.client()?;
        let rows = client
            .simple_query(&sql)
            .await
            .map_err(map_tds_err)?
            .into_first_result()
            .await
            .map_err(map_tds_err)?;
        let names = rows
            .iter()
            .filter_map(|row| row.try_get::<&str, _>(0).ok().flatten())
            .map(|name| vec![Value::Text(name.to_string())])
            .collect();
        Ok(QueryResult::tabular(vec!["Tables".to_string()], names))
    }

    async fn table_columns(
        &mut self,
        table: &str,
        database: Option<&str>,
    ) -> Result<Vec<ColumnInfo>> {
        let database = self.target_database(database)?;
        let db = Self::quote_ident(&database)?;
        let db_literal = database.replace('\'', "''");

        let key_sql = format!(
            "SELECT kcu.COLUMN_NAME, tc.CONSTRAINT_TYPE \
             FROM {db}.INFORMATION_SCHEMA.TABLE_CONSTRAINTS tc \
             JOIN {db}.INFORMATION_SCHEMA.KEY_COLUMN_USAGE kcu \
               ON kcu.CONSTRAINT_NAME = tc.CONSTRAINT_NAME \
              AND kcu.TABLE_NAME = tc.TABLE_NAME \
             WHERE tc.TABLE_NAME = @P1 \
               AND tc.CONSTRAINT_TYPE IN ('PRIMARY KEY', 'UNIQUE')"
        );
        let client = self.client()?;
        let mut key_query = TdsQuery::new(key_sql);
        key_query.bind(table.to_string());
        let key_rows = key_query
            .query(client)
            .await
            .map_err(map_tds_err)?
            .into_first_result()
            .await
            .map_err(map_tds_err)?;
        let key_for = |name: &str| {
            let mut role = KeyRole::None;
            for row in &key_rows {
                let column = row.try_get::<&str, _>(0).ok().flatten().unwrap_or_default();
                if column != name {
                    continue;
                }
                let kind = row.try_get::<&str, _>(1).ok().flatten().unwrap_or_default();
                if kind == "PRIMARY KEY" {
                    return KeyRole::Primary;
                }
                role = KeyRole::Unique;
            }
            role
        };

        let columns_sql = format!(
            "SELECT COLUMN_NAME, \
                    DATA_TYPE, \
                    CASE WHEN IS_NULLABLE = 'YES' THEN 1 ELSE 0 END AS IS_NULLABLE, \
                    COLUMN_DEFAULT, \
                    CAST(ORDINAL_POSITION AS INT) AS ORDINAL_POSITION, \
                    COLUMNPROPERTY(OBJECT_ID('{db_literal}.' + TABLE_SCHEMA + '.' + TABLE_NAME), \
                                   COLUMN_NAME, 'IsIdentity') AS IS_IDENTITY \
             FROM {db}.INFORMATION_SCHEMA.COLUMNS \
             WHERE TABLE_NAME = @P1 \
             ORDER BY ORDINAL_POSITION"
        );
        let client = self.client()?;
        let mut query = TdsQuery::new(columns_sql);
        query.bind(table.to_string());
        let rows = query
            .query(client)
            .await
            .map_err(map_tds_err)?
            .into_first_result()
            .await
            .map_err(map_tds_err)?;
        if rows.is_empty() {
            return Err(Error::Statement(format!("no such table: {table}")));
        }

        let mut columns = Vec::with_capacity(rows.len());
        for row in &rows {
            let name = row
                .try_get::<&str, _>(0)
                .map_err(map_tds_err)?
                .unwrap_or_default()
                .to_string();
            let is_identity = row
                .try_get::<i32, _>(5)
                .ok()
                .flatten()
                .unwrap_or_default()
                == 1;
            columns.push(ColumnInfo {
                ordinal_position: row
                    .try_get::<i32, _>(4)
                    .map_err(map_tds_err)?
                    .unwrap_or_default(),
                data_type: row
                    .try_get::<&str, _>(1)
                    .map_err(map_tds_err)?
                    .unwrap_or_default()
                    .to_string(),
                is_nullable: row
                    .try_get::<i32, _>(2)
                    .map_err(map_tds_err)?
                    .unwrap_or_default()
                    == 1,
                key: key_for(&name),
                default: row
                    .try_get::<&str, _>(3)
                    .map_err(map_tds_err)?
                    .map(str::to_string),
                extra: is_identity.then(|| "identity".to_string()),
                name,
            });
        }
        Ok(columns)
    }

    async fn execute(&mut self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        placeholders::check_params(sql, params.len())?;
        let is_read = is_read_statement(sql);
        let (sql, _) = placeholders::rewrite(sql, ParamStyle::AtP);
        let client = self.client()?;

        let mut query = TdsQuery::new(sql);
        for value in params {
            bind_value(&mut query, value);
        }
        if is_read {
            let rows = query
                .query(client)
                .await
                .map_err(map_tds_err)?
                .into_first_result()
                .await
                .map_err(map_tds_err)?;
            Ok(decode::rows_to_result(&rows))
        } else {
            let done = query.execute(client).await.map_err(map_tds_err)?;
            let affected = done.rows_affected().iter().copied().sum();
            Ok(QueryResult::from_write(affected))
        }
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(client) = self.client.take() {
            client
                .close()
                .await
                .map_err(|err| Error::Connection(err.to_string()))?;
            debug!("closed sql server connection");
        }
        Ok(())
    }
}

fn bind_value<'a>(query: &mut TdsQuery<'a>, value: &'a Value) {
    match value {
        Value::Null => query.bind(Option::<&str>::None),
        Value::Bool(v) => query.bind(*v),
        Value::Int16(v) => query.bind(*v),
        Value::Int32(v) => query.bind(*v),
        Value::Int64(v) => query.bind(*v),
        Value::Float32(v) => query.bind(*v),
        Value::Float64(v) => query.bind(*v),
        Value::Decimal(v) => query.bind(tiberius::numeric::Numeric::new_with_scale(
            v.mantissa(),
            v.scale() as u8,
        )),
        Value::Text(v) => query.bind(v.as_str()),
        Value::Bytes(v) => query.bind(v.as_slice()),
        Value::Date(v) => query.bind(*v),
        Value::Time(v) => query.bind(*v),
        Value::DateTime(v) => query.bind(*v),
        Value::Uuid(v) => query.bind(*v),
        Value::Json(v) => query.bind(v.to_string()),
    }
}

/// Server-reported failures are statement errors; everything else is a
/// transport problem.
fn map_tds_err(err: tiberius::error::Error) -> Error {
    match err {
        tiberius::error::Error::Server(token) => Error::Statement(token.to_string()),
        tiberius::error::Error::Conversion(msg) => Error::Statement(msg.into_owned()),
        other => Error::Connection(other.to_string()),
    }
}
