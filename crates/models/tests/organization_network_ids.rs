//! Behaviour of the networkIDs migration against the in-memory store

use nms_models::migrations::MakeOrganizationNetworkIdsRequired;
use nms_orm::{
    ColumnDescription, ColumnSpec, DataType, DataTypes, DefaultValue, InMemorySchema, Migration,
    MigrationConfig, MigrationRollback, MigrationRunner, MigrationStorage, OrmError,
    QueryInterface,
};
use serde_json::{json, Map, Value};

fn row(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected an object"),
    }
}

/// Organizations as it looked before the migration: nullable JSON list
async fn organizations() -> InMemorySchema {
    let schema = InMemorySchema::new();
    schema
        .create_table(
            "Organizations",
            vec![
                ("name", ColumnSpec::new(DataType::String(None)).allow_null(false)),
                (
                    "networkIDs",
                    ColumnSpec::new(DataType::Json).default_value(DefaultValue::text("[]")),
                ),
            ],
        )
        .await
        .unwrap();
    schema
}

async fn network_ids(schema: &InMemorySchema) -> ColumnDescription {
    schema
        .describe_column("Organizations", "networkIDs")
        .await
        .unwrap()
}

#[tokio::test]
async fn test_up_makes_column_required() {
    let schema = organizations().await;
    schema
        .insert_row("Organizations", row(json!({"name": "magma", "networkIDs": ["net1"]})))
        .await
        .unwrap();

    MakeOrganizationNetworkIdsRequired
        .up(&schema, &DataTypes::new())
        .await
        .unwrap();

    let column = network_ids(&schema).await;
    assert!(!column.allow_null);
    assert_eq!(column.default_value, Some(DefaultValue::Text("[]".to_string())));
    assert_eq!(column.data_type, DataType::Json);
}

#[tokio::test]
async fn test_down_restores_nullability_only() {
    let schema = organizations().await;
    let types = DataTypes::new();

    MakeOrganizationNetworkIdsRequired.up(&schema, &types).await.unwrap();
    let after_up = network_ids(&schema).await;

    MakeOrganizationNetworkIdsRequired.down(&schema, &types).await.unwrap();
    let after_down = network_ids(&schema).await;

    assert!(after_down.allow_null);
    assert_eq!(after_down.default_value, after_up.default_value);
    assert_eq!(after_down.data_type, after_up.data_type);
}

#[tokio::test]
async fn test_up_down_up_matches_single_up() {
    let types = DataTypes::new();

    let once = organizations().await;
    MakeOrganizationNetworkIdsRequired.up(&once, &types).await.unwrap();

    let cycled = organizations().await;
    MakeOrganizationNetworkIdsRequired.up(&cycled, &types).await.unwrap();
    MakeOrganizationNetworkIdsRequired.down(&cycled, &types).await.unwrap();
    MakeOrganizationNetworkIdsRequired.up(&cycled, &types).await.unwrap();

    assert_eq!(network_ids(&once).await, network_ids(&cycled).await);
}

#[tokio::test]
async fn test_up_fails_on_null_rows_and_leaves_column_unchanged() {
    let schema = organizations().await;
    schema
        .insert_row("Organizations", row(json!({"name": "legacy", "networkIDs": null})))
        .await
        .unwrap();
    let before = network_ids(&schema).await;

    let err = MakeOrganizationNetworkIdsRequired
        .up(&schema, &DataTypes::new())
        .await
        .unwrap_err();

    assert!(matches!(err, OrmError::Constraint(_)));
    assert_eq!(network_ids(&schema).await, before);
    assert_eq!(schema.rows("Organizations").await.unwrap()[0]["networkIDs"], Value::Null);
}

#[tokio::test]
async fn test_down_on_nullable_column_is_noop() {
    let schema = organizations().await;
    let before = network_ids(&schema).await;

    MakeOrganizationNetworkIdsRequired
        .down(&schema, &DataTypes::new())
        .await
        .unwrap();

    assert_eq!(network_ids(&schema).await, before);
}

#[tokio::test]
async fn test_missing_table_surfaces_unchanged() {
    let schema = InMemorySchema::new();
    let err = MakeOrganizationNetworkIdsRequired
        .up(&schema, &DataTypes::new())
        .await
        .unwrap_err();
    assert!(matches!(err, OrmError::Schema(_)));
}

#[tokio::test]
async fn test_new_rows_default_to_empty_list_after_up() {
    let schema = organizations().await;
    MakeOrganizationNetworkIdsRequired
        .up(&schema, &DataTypes::new())
        .await
        .unwrap();

    schema
        .insert_row("Organizations", row(json!({"name": "fresh"})))
        .await
        .unwrap();
    let rows = schema.rows("Organizations").await.unwrap();
    assert_eq!(rows[0]["networkIDs"], json!([]));

    let err = schema
        .insert_row("Organizations", row(json!({"name": "bad", "networkIDs": null})))
        .await
        .unwrap_err();
    assert!(matches!(err, OrmError::Constraint(_)));
}

#[tokio::test]
async fn test_runner_records_original_name() {
    let schema = organizations().await;
    let manager = nms_models::manager(MigrationConfig::default()).unwrap();
    let runner = MigrationRunner::new(manager, schema);

    let result = runner.run_migrations().await.unwrap();
    assert_eq!(
        result.applied_migrations,
        vec!["20190225030305-make-organization-networkIDs-required.js"]
    );
    assert_eq!(
        runner.backend().executed().await.unwrap(),
        vec![MakeOrganizationNetworkIdsRequired::NAME]
    );

    runner.rollback_last().await.unwrap();
    assert!(runner.backend().executed().await.unwrap().is_empty());
    assert!(network_ids(runner.backend()).await.allow_null);
}

#[tokio::test]
async fn test_up_keeps_json_string_values() {
    let schema = organizations().await;
    schema
        .insert_row("Organizations", row(json!({"name": "a", "networkIDs": "net1"})))
        .await
        .unwrap();
    schema
        .insert_row("Organizations", row(json!({"name": "b", "networkIDs": "[1]"})))
        .await
        .unwrap();
    let types = DataTypes::new();

    MakeOrganizationNetworkIdsRequired.up(&schema, &types).await.unwrap();
    MakeOrganizationNetworkIdsRequired.down(&schema, &types).await.unwrap();
    MakeOrganizationNetworkIdsRequired.up(&schema, &types).await.unwrap();

    let rows = schema.rows("Organizations").await.unwrap();
    assert_eq!(rows[0]["networkIDs"], json!("net1"));
    assert_eq!(rows[1]["networkIDs"], json!("[1]"));
}
