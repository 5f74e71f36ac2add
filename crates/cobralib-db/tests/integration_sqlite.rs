//! End-to-end checks against embedded SQLite databases.
//!
//! These run without any external service and exercise the factory, the
//! placeholder convention, catalog introspection, and bulk loading.

use std::io::Write;

use anyhow::Result;

use cobralib_db::{
    connect, load_delimited, Coerce, ColumnMap, ConnectionConfig, DelimitedOptions, EngineKind,
    Error, KeyRole, Relational, Value,
};

async fn open_memory() -> Result<Box<dyn Relational>> {
    Ok(connect(&ConnectionConfig::sqlite(":memory:")).await?)
}

#[tokio::test]
async fn factory_yields_sqlite_adapter() -> Result<()> {
    let mut db = open_memory().await?;
    assert_eq!(db.engine(), EngineKind::Sqlite);
    assert_eq!(db.current_database(), Some(":memory:"));
    db.close().await?;
    Ok(())
}

#[tokio::test]
async fn list_databases_is_annotated_empty() -> Result<()> {
    let mut db = open_memory().await?;
    let result = db.list_databases().await?;
    assert_eq!(result.columns, vec!["Databases".to_string()]);
    assert!(result.is_empty());
    assert!(result.note.is_some());
    Ok(())
}

#[tokio::test]
async fn change_database_is_refused() -> Result<()> {
    let mut db = open_memory().await?;
    let err = db.change_database("other").await.unwrap_err();
    assert!(matches!(err, Error::Unsupported(_)));
    Ok(())
}

#[tokio::test]
async fn parameterized_reads_match_literals() -> Result<()> {
    let mut db = open_memory().await?;
    db.execute(
        "CREATE TABLE names (id INTEGER PRIMARY KEY, first TEXT, last TEXT)",
        &[],
    )
    .await?;
    for (first, last) in [("Jon", "Webb"), ("Fred", "Smith"), ("Jillian", "Webb")] {
        let inserted = db
            .execute(
                "INSERT INTO names (first, last) VALUES (?, ?)",
                &[Value::from(first), Value::from(last)],
            )
            .await?;
        assert_eq!(inserted.rows_affected, 1);
    }

    let with_param = db
        .execute(
            "SELECT first FROM names WHERE last = ? ORDER BY first",
            &[Value::from("Webb")],
        )
        .await?;
    let with_literal = db
        .execute("SELECT first FROM names WHERE last = 'Webb' ORDER BY first", &[])
        .await?;
    assert_eq!(with_param.rows, with_literal.rows);
    assert_eq!(with_param.column_text("first"), vec!["Jillian", "Jon"]);
    Ok(())
}

#[tokio::test]
async fn placeholder_count_must_match_params() -> Result<()> {
    let mut db = open_memory().await?;
    let err = db
        .execute("SELECT ? + ?", &[Value::Int32(1)])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Statement(_)));
    assert!(err.to_string().contains("placeholder"));
    Ok(())
}

#[tokio::test]
async fn literal_question_marks_are_not_placeholders() -> Result<()> {
    let mut db = open_memory().await?;
    let result = db
        .execute("SELECT 'ready?' AS prompt WHERE 1 = ?", &[Value::Int32(1)])
        .await?;
    assert_eq!(result.get(0, "prompt"), Some(&Value::Text("ready?".to_string())));
    Ok(())
}

#[tokio::test]
async fn returning_writes_yield_rows() -> Result<()> {
    let mut db = open_memory().await?;
    db.execute("CREATE TABLE t (id INTEGER PRIMARY KEY, a TEXT)", &[])
        .await?;
    let result = db
        .execute(
            "INSERT INTO t (a) VALUES (?) RETURNING id",
            &[Value::from("x")],
        )
        .await?;
    assert_eq!(result.get(0, "id"), Some(&Value::Int64(1)));
    Ok(())
}

#[tokio::test]
async fn list_tables_and_columns_reflect_schema() -> Result<()> {
    let mut db = open_memory().await?;
    db.execute(
        "CREATE TABLE inventory (\
            id INTEGER PRIMARY KEY, \
            sku TEXT NOT NULL, \
            qty INTEGER DEFAULT 0)",
        &[],
    )
    .await?;
    db.execute("CREATE TABLE orders (id INTEGER PRIMARY KEY)", &[])
        .await?;

    let tables = db.list_tables(None).await?;
    assert_eq!(tables.columns, vec!["Tables".to_string()]);
    assert_eq!(tables.column_text("Tables"), vec!["inventory", "orders"]);

    let columns = db.table_columns("inventory", None).await?;
    assert_eq!(columns.len(), 3);
    assert_eq!(columns[0].name, "id");
    assert_eq!(columns[0].ordinal_position, 1);
    assert_eq!(columns[0].key, KeyRole::Primary);
    assert_eq!(columns[1].name, "sku");
    assert!(!columns[1].is_nullable);
    assert_eq!(columns[2].default.as_deref(), Some("0"));
    assert!(columns[2].is_nullable);

    let err = db.table_columns("missing", None).await.unwrap_err();
    assert!(matches!(err, Error::Statement(_)));
    Ok(())
}

#[tokio::test]
async fn foreign_database_arguments_are_refused() -> Result<()> {
    let mut db = open_memory().await?;
    db.execute("CREATE TABLE t (a INTEGER)", &[]).await?;
    assert!(db.list_tables(Some("main")).await.is_ok());
    let err = db.list_tables(Some("elsewhere")).await.unwrap_err();
    assert!(matches!(err, Error::Unsupported(_)));
    Ok(())
}

#[tokio::test]
async fn close_is_idempotent_but_final() -> Result<()> {
    let mut db = open_memory().await?;
    db.close().await?;
    db.close().await?;
    let err = db.execute("SELECT 1", &[]).await.unwrap_err();
    assert!(matches!(err, Error::Connection(_)));
    let err = db.list_databases().await.unwrap_err();
    assert!(matches!(err, Error::Connection(_)));
    Ok(())
}

#[tokio::test]
async fn loads_delimited_file_with_coercions() -> Result<()> {
    let mut csv = tempfile::NamedTempFile::new()?;
    writeln!(csv, "Product Name,Unit Price,In Stock,Added")?;
    writeln!(csv, "widget,1.50,yes,2024-01-02")?;
    writeln!(csv, "gadget,2.25,no,2024-02-03")?;
    writeln!(csv, "sprocket,0.75,yes,2024-03-04")?;
    writeln!(csv, "gizmo,,no,")?;
    csv.flush()?;

    let mut db = open_memory().await?;
    db.execute(
        "CREATE TABLE products (\
            product_name TEXT, \
            unit_price REAL, \
            in_stock BOOLEAN, \
            added DATE)",
        &[],
    )
    .await?;

    let columns = [
        ColumnMap::new("Product Name", "Product Name"),
        ColumnMap::new("Unit Price", "unit_price").with_coerce(Coerce::Float),
        ColumnMap::new("In Stock", "in_stock").with_coerce(Coerce::Bool),
        ColumnMap::new("Added", "added").with_coerce(Coerce::Date),
    ];
    let loaded = load_delimited(
        db.as_mut(),
        "products",
        csv.path(),
        &columns,
        &DelimitedOptions::default(),
    )
    .await?;
    assert_eq!(loaded, 4);

    // 'Product Name' was sanitized into the product_name column.
    let rows = db
        .execute(
            "SELECT product_name, unit_price FROM products ORDER BY product_name",
            &[],
        )
        .await?;
    assert_eq!(
        rows.column_text("product_name"),
        vec!["gadget", "gizmo", "sprocket", "widget"]
    );
    assert_eq!(rows.get(0, "unit_price"), Some(&Value::Float64(2.25)));

    // Empty source fields land as NULL.
    let nulls = db
        .execute(
            "SELECT count(*) AS n FROM products WHERE unit_price IS NULL",
            &[],
        )
        .await?;
    assert_eq!(nulls.get(0, "n"), Some(&Value::Int64(1)));
    Ok(())
}

#[tokio::test]
async fn missing_source_column_is_an_ingest_error() -> Result<()> {
    let mut csv = tempfile::NamedTempFile::new()?;
    writeln!(csv, "a,b")?;
    writeln!(csv, "1,2")?;
    csv.flush()?;

    let mut db = open_memory().await?;
    db.execute("CREATE TABLE t (a TEXT)", &[]).await?;
    let err = load_delimited(
        db.as_mut(),
        "t",
        csv.path(),
        &[ColumnMap::same("missing")],
        &DelimitedOptions::default(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, Error::Ingest(_)));
    assert!(err.to_string().contains("a, b"));
    Ok(())
}

#[tokio::test]
async fn file_backed_database_persists_between_connections() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("facade.db");

    let mut db = connect(&ConnectionConfig::sqlite(&path)).await?;
    db.execute("CREATE TABLE kv (k TEXT, v TEXT)", &[]).await?;
    db.execute(
        "INSERT INTO kv VALUES (?, ?)",
        &[Value::from("answer"), Value::from("42")],
    )
    .await?;
    db.close().await?;

    let mut db = connect(&ConnectionConfig::sqlite(&path)).await?;
    let rows = db.execute("SELECT v FROM kv WHERE k = ?", &[Value::from("answer")]).await?;
    assert_eq!(rows.column_text("v"), vec!["42"]);
    db.close().await?;
    Ok(())
}
