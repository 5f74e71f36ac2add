use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use cobralib_core::{Error, Result};

/// Supported database engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    MySql,
    Postgres,
    Sqlite,
    SqlServer,
}

impl EngineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngineKind::MySql => "mysql",
            EngineKind::Postgres => "postgres",
            EngineKind::Sqlite => "sqlite",
            EngineKind::SqlServer => "mssql",
        }
    }

    pub fn all() -> [EngineKind; 4] {
        [
            EngineKind::MySql,
            EngineKind::Postgres,
            EngineKind::Sqlite,
            EngineKind::SqlServer,
        ]
    }

    fn default_port(&self) -> u16 {
        match self {
            EngineKind::MySql => 3306,
            EngineKind::Postgres => 5432,
            EngineKind::SqlServer => 1433,
            EngineKind::Sqlite => 0,
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "mysql" => Ok(EngineKind::MySql),
            "postgres" | "postgresql" => Ok(EngineKind::Postgres),
            "sqlite" => Ok(EngineKind::Sqlite),
            "mssql" | "sqlserver" | "sql-server" => Ok(EngineKind::SqlServer),
            other => Err(Error::Config(format!("unknown engine tag '{other}'"))),
        }
    }
}

/// Plain-argument credentials for one connection.
///
/// Server engines need username/password/host (port defaults per engine);
/// SQLite needs only a file path. `database` selects the initial database
/// where the engine supports one.
#[derive(Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    pub engine: EngineKind,
    pub username: Option<String>,
    pub password: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: Option<String>,
    /// Database file for the embedded engine. `:memory:` is accepted.
    pub path: Option<PathBuf>,
}

impl ConnectionConfig {
    /// Configuration for a server-based engine.
    pub fn server(
        engine: EngineKind,
        username: impl Into<String>,
        password: impl Into<String>,
        host: impl Into<String>,
    ) -> Self {
        Self {
            engine,
            username: Some(username.into()),
            password: Some(password.into()),
            host: Some(host.into()),
            port: None,
            database: None,
            path: None,
        }
    }

    /// Configuration for the embedded engine.
    pub fn sqlite(path: impl Into<PathBuf>) -> Self {
        Self {
            engine: EngineKind::Sqlite,
            username: None,
            password: None,
            host: None,
            port: None,
            database: None,
            path: Some(path.into()),
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// Effective port: the explicit one, or the engine default.
    pub fn port_or_default(&self) -> u16 {
        self.port.unwrap_or_else(|| self.engine.default_port())
    }

    /// Check that the credentials required by the engine are present.
    pub fn validate(&self) -> Result<()> {
        match self.engine {
            EngineKind::Sqlite => {
                if self.path.is_none() {
                    return Err(Error::Config(
                        "sqlite requires a database file path".to_string(),
                    ));
                }
            }
            engine => {
                for (field, present) in [
                    ("username", self.username.is_some()),
                    ("password", self.password.is_some()),
                    ("host", self.host.is_some()),
                ] {
                    if !present {
                        return Err(Error::Config(format!("{engine} requires a {field}")));
                    }
                }
            }
        }
        Ok(())
    }

    pub(crate) fn username(&self) -> &str {
        self.username.as_deref().unwrap_or_default()
    }

    pub(crate) fn password(&self) -> &str {
        self.password.as_deref().unwrap_or_default()
    }

    pub(crate) fn host(&self) -> &str {
        self.host.as_deref().unwrap_or("localhost")
    }
}

// Manual Debug so credentials never leak into logs.
impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("engine", &self.engine)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("path", &self.path)
            .finish()
    }
}
