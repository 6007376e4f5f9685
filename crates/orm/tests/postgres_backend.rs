//! Postgres backend against a live database
//!
//! These tests run only when `DATABASE_URL` points at a scratch database and
//! return early otherwise. Each test owns its tables.

use nms_orm::{
    ColumnDescription, ColumnSpec, DataType, DataTypes, DefaultValue, MigrationConfig,
    MigrationStorage, OrmError, PgQueryInterface, QueryInterface,
};

async fn backend(migrations_table: &str) -> Option<PgQueryInterface> {
    let url = match std::env::var("DATABASE_URL") {
        Ok(url) if !url.trim().is_empty() => url,
        _ => {
            eprintln!("DATABASE_URL not set, skipping Postgres test");
            return None;
        }
    };

    let config = MigrationConfig::default()
        .with_database_url(url)
        .with_migrations_table(migrations_table);
    Some(
        PgQueryInterface::connect(&config)
            .await
            .expect("failed to connect to DATABASE_URL"),
    )
}

async fn execute(pg: &PgQueryInterface, sql: &str) {
    sqlx::query(sql).execute(pg.pool()).await.unwrap();
}

async fn recreate(pg: &PgQueryInterface, table: &str, columns: &str) {
    execute(pg, &format!("DROP TABLE IF EXISTS \"{}\"", table)).await;
    execute(pg, &format!("CREATE TABLE \"{}\" ({})", table, columns)).await;
}

async fn drop_table(pg: &PgQueryInterface, table: &str) {
    execute(pg, &format!("DROP TABLE IF EXISTS \"{}\"", table)).await;
}

fn required_json() -> ColumnSpec {
    ColumnSpec::new(DataTypes::new().json())
        .allow_null(false)
        .default_value(DefaultValue::text("[]"))
}

#[tokio::test]
async fn test_missing_table_is_schema_error() {
    let Some(pg) = backend("nms_test_meta_missing").await else {
        return;
    };

    let err = pg
        .change_column("nms_test_no_such_table", "networkIDs", required_json())
        .await
        .unwrap_err();
    assert!(matches!(err, OrmError::Schema(_)), "{:?}", err);
}

#[tokio::test]
async fn test_null_rows_are_constraint_error_and_column_unchanged() {
    let Some(pg) = backend("nms_test_meta_nulls").await else {
        return;
    };
    let table = "nms_test_nulls";
    recreate(&pg, table, "\"networkIDs\" JSON DEFAULT '[]'").await;
    execute(&pg, &format!("INSERT INTO \"{}\" VALUES (NULL)", table)).await;

    let before = pg.describe_column(table, "networkIDs").await.unwrap();
    let err = pg
        .change_column(table, "networkIDs", required_json())
        .await
        .unwrap_err();
    assert!(err.is_constraint_violation(), "{:?}", err);
    assert_eq!(pg.describe_column(table, "networkIDs").await.unwrap(), before);

    drop_table(&pg, table).await;
}

#[tokio::test]
async fn test_invalid_json_text_is_schema_error() {
    let Some(pg) = backend("nms_test_meta_invalid").await else {
        return;
    };
    let table = "nms_test_invalid_json";
    recreate(&pg, table, "\"networkIDs\" TEXT").await;
    execute(&pg, &format!("INSERT INTO \"{}\" VALUES ('not json')", table)).await;

    let err = pg
        .change_column(table, "networkIDs", ColumnSpec::new(DataType::Json))
        .await
        .unwrap_err();
    assert!(matches!(err, OrmError::Schema(_)), "{:?}", err);

    let column = pg.describe_column(table, "networkIDs").await.unwrap();
    assert_eq!(column.data_type, DataType::Text);

    drop_table(&pg, table).await;
}

#[tokio::test]
async fn test_text_column_with_default_converts_to_json() {
    let Some(pg) = backend("nms_test_meta_convert").await else {
        return;
    };
    let table = "nms_test_text_to_json";
    recreate(&pg, table, "\"networkIDs\" TEXT DEFAULT '[\"none\"]'").await;
    execute(&pg, &format!("INSERT INTO \"{}\" VALUES ('[\"net1\"]')", table)).await;

    pg.change_column(table, "networkIDs", required_json())
        .await
        .unwrap();

    assert_eq!(
        pg.describe_column(table, "networkIDs").await.unwrap(),
        ColumnDescription::from(required_json())
    );

    let stored = sqlx::query_scalar::<_, String>(&format!(
        "SELECT \"networkIDs\"::text FROM \"{}\"",
        table
    ))
    .fetch_one(pg.pool())
    .await
    .unwrap();
    assert_eq!(stored, "[\"net1\"]");

    drop_table(&pg, table).await;
}

#[tokio::test]
async fn test_describe_reads_back_text_default() {
    let Some(pg) = backend("nms_test_meta_describe").await else {
        return;
    };
    let table = "nms_test_describe";
    recreate(&pg, table, "\"networkIDs\" JSON").await;

    pg.change_column(
        table,
        "networkIDs",
        ColumnSpec::new(DataType::Json).default_value(DefaultValue::text("[]")),
    )
    .await
    .unwrap();

    let column = pg.describe_column(table, "networkIDs").await.unwrap();
    assert!(column.allow_null);
    assert_eq!(column.default_value, Some(DefaultValue::text("[]")));
    assert_eq!(column.data_type, DataType::Json);

    let err = pg.describe_column(table, "missing").await.unwrap_err();
    assert!(matches!(err, OrmError::Schema(_)));

    drop_table(&pg, table).await;
}

#[tokio::test]
async fn test_meta_table_bookkeeping() {
    let meta = "nms_test_meta_storage";
    let Some(pg) = backend(meta).await else {
        return;
    };
    drop_table(&pg, meta).await;

    pg.ensure_storage().await.unwrap();
    pg.ensure_storage().await.unwrap();
    pg.log_migration("20190225030305-b.js").await.unwrap();
    pg.log_migration("20180101000000-a.js").await.unwrap();
    assert_eq!(
        pg.executed().await.unwrap(),
        vec!["20180101000000-a.js", "20190225030305-b.js"]
    );

    assert!(pg.log_migration("20180101000000-a.js").await.is_err());

    pg.unlog_migration("20190225030305-b.js").await.unwrap();
    assert_eq!(pg.executed().await.unwrap(), vec!["20180101000000-a.js"]);

    drop_table(&pg, meta).await;
}
