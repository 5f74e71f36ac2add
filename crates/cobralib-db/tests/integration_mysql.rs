//! End-to-end checks against a live MySQL server.
//!
//! These run only when `COBRALIB_MYSQL_HOST`, `COBRALIB_MYSQL_USER`, and
//! `COBRALIB_MYSQL_PASSWORD` are set (plus optional `COBRALIB_MYSQL_PORT`
//! and `COBRALIB_MYSQL_DATABASE`); without them each test skips. The
//! configured user needs CREATE/DROP DATABASE privileges.

use std::env;

use anyhow::Result;

use cobralib_db::{connect, ConnectionConfig, EngineKind, KeyRole, Relational, Value};

fn mysql_config() -> Option<ConnectionConfig> {
    let host = env::var("COBRALIB_MYSQL_HOST").ok()?;
    let user = env::var("COBRALIB_MYSQL_USER").ok()?;
    let password = env::var("COBRALIB_MYSQL_PASSWORD").ok()?;
    let mut config = ConnectionConfig::server(EngineKind::MySql, user, password, host);
    if let Ok(port) = env::var("COBRALIB_MYSQL_PORT") {
        config = config.with_port(port.parse().ok()?);
    }
    if let Ok(database) = env::var("COBRALIB_MYSQL_DATABASE") {
        config = config.with_database(database);
    }
    Some(config)
}

macro_rules! require_mysql {
    () => {
        match mysql_config() {
            Some(config) => config,
            None => {
                eprintln!("skipping: COBRALIB_MYSQL_* not set");
                return Ok(());
            }
        }
    };
}

#[tokio::test]
async fn change_database_reflects_table_listing() -> Result<()> {
    let config = require_mysql!();
    let mut db = connect(&config).await?;
    assert_eq!(db.engine(), EngineKind::MySql);
    let scratch = format!("cobralib_test_{}", std::process::id());

    db.execute(&format!("CREATE DATABASE IF NOT EXISTS {scratch}"), &[])
        .await?;
    db.change_database(&scratch).await?;
    assert_eq!(db.current_database(), Some(scratch.as_str()));

    let listing = db.list_databases().await?;
    assert_eq!(listing.columns, vec!["Databases".to_string()]);
    assert!(listing.column_text("Databases").contains(&scratch));

    db.execute(
        "CREATE TABLE parts (\
            id INT AUTO_INCREMENT PRIMARY KEY, \
            sku VARCHAR(32) NOT NULL UNIQUE, \
            qty INT DEFAULT 0)",
        &[],
    )
    .await?;

    let tables = db.list_tables(None).await?;
    assert_eq!(tables.columns, vec!["Tables".to_string()]);
    assert_eq!(tables.column_text("Tables"), vec!["parts"]);

    let columns = db.table_columns("parts", None).await?;
    assert_eq!(columns.len(), 3);
    assert_eq!(columns[0].key, KeyRole::Primary);
    assert_eq!(columns[0].extra.as_deref(), Some("auto_increment"));
    assert_eq!(columns[1].key, KeyRole::Unique);
    assert!(!columns[1].is_nullable);
    assert_eq!(columns[2].default.as_deref(), Some("0"));

    db.execute(&format!("DROP DATABASE {scratch}"), &[]).await?;
    db.close().await?;
    Ok(())
}

#[tokio::test]
async fn parameterized_reads_match_literals() -> Result<()> {
    let config = require_mysql!();
    let mut db = connect(&config).await?;
    let scratch = format!("cobralib_params_{}", std::process::id());

    db.execute(&format!("CREATE DATABASE IF NOT EXISTS {scratch}"), &[])
        .await?;
    db.change_database(&scratch).await?;
    db.execute(
        "CREATE TABLE names (first VARCHAR(32), last VARCHAR(32))",
        &[],
    )
    .await?;
    for (first, last) in [("Jon", "Webb"), ("Fred", "Smith")] {
        db.execute(
            "INSERT INTO names (first, last) VALUES (?, ?)",
            &[Value::from(first), Value::from(last)],
        )
        .await?;
    }

    let with_param = db
        .execute(
            "SELECT first FROM names WHERE last = ? ORDER BY first",
            &[Value::from("Webb")],
        )
        .await?;
    let with_literal = db
        .execute(
            "SELECT first FROM names WHERE last = 'Webb' ORDER BY first",
            &[],
        )
        .await?;
    assert_eq!(with_param.rows, with_literal.rows);
    assert_eq!(with_param.column_text("first"), vec!["Jon"]);

    db.execute(&format!("DROP DATABASE {scratch}"), &[]).await?;
    db.close().await?;
    Ok(())
}
