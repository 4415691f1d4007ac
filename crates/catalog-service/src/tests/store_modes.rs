//! Shared, separate and disabled outbox modes.

use super::harness::{create_request, TestHarness};
use crate::{OutboxMode, ServiceError, UpdateProductRequest};
use catalog_database::AsyncDatabase;
use tempfile::tempdir;

#[tokio::test]
async fn shared_mode_keeps_outbox_in_entity_database() {
    let harness = TestHarness::shared().await;
    let product = harness.service.create(create_request("A")).await.unwrap();

    assert_eq!(harness.service.outbox_mode().as_str(), "shared");
    let records = harness
        .entity_db
        .call(|conn| catalog_database::queries::count_outbox_records(conn, false))
        .await
        .unwrap();
    assert_eq!(records, 1);
    assert_eq!(harness.outbox_for(&product.id).await.len(), 1);
}

#[tokio::test]
async fn shared_mode_rolls_back_entity_when_outbox_append_fails() {
    let harness = TestHarness::shared().await;
    let existing = harness.service.create(create_request("A")).await.unwrap();

    harness
        .entity_db
        .call_sqlite(|conn| conn.execute_batch("DROP TABLE outbox_events"))
        .await
        .unwrap();

    let err = harness.service.create(create_request("B")).await.unwrap_err();
    assert!(matches!(err, ServiceError::Storage(_)), "got {:?}", err);
    assert_eq!(harness.product_count().await, 1);

    let rename = UpdateProductRequest {
        name: Some("Renamed".to_string()),
        ..Default::default()
    };
    let err = harness.service.update(&existing.id, rename).await.unwrap_err();
    assert!(matches!(err, ServiceError::Storage(_)), "got {:?}", err);

    let err = harness.service.delete(&existing.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Storage(_)), "got {:?}", err);

    let stored = harness.service.read(&existing.id).await.unwrap();
    assert_eq!(stored.name, existing.name);
    assert_eq!(stored.version, existing.version);
}

#[tokio::test]
async fn separate_mode_writes_events_to_outbox_database() {
    let harness = TestHarness::separate().await;
    let product = harness.service.create(create_request("A")).await.unwrap();
    harness
        .service
        .update(&product.id, UpdateProductRequest::default())
        .await
        .unwrap();

    assert_eq!(harness.service.outbox_mode().as_str(), "separate");
    assert_eq!(harness.outbox_for(&product.id).await.len(), 2);

    let in_entity_db = harness
        .entity_db
        .call(|conn| catalog_database::queries::count_outbox_records(conn, false))
        .await
        .unwrap();
    assert_eq!(in_entity_db, 0);
}

#[tokio::test]
async fn separate_mode_commits_entity_when_outbox_store_is_down() {
    let dir = tempdir().unwrap();
    let entity_db = AsyncDatabase::open(&dir.path().join("catalog.sqlite"))
        .await
        .unwrap();
    let outbox_db = AsyncDatabase::open(&dir.path().join("outbox.sqlite"))
        .await
        .unwrap();
    outbox_db.clone().close().await.unwrap();

    let harness = TestHarness::build(
        entity_db,
        outbox_db.clone(),
        OutboxMode::Separate(outbox_db),
    );

    let product = harness.service.create(create_request("A")).await.unwrap();

    assert_eq!(harness.service.read(&product.id).await.unwrap().sku, "A");
    assert_eq!(harness.product_count().await, 1);
}

#[tokio::test]
async fn disabled_mode_writes_no_outbox_records() {
    let harness = TestHarness::disabled().await;
    let product = harness.service.create(create_request("A")).await.unwrap();
    harness
        .service
        .update(&product.id, UpdateProductRequest::default())
        .await
        .unwrap();
    harness.service.delete(&product.id).await.unwrap();

    assert_eq!(harness.service.outbox_mode().as_str(), "disabled");
    assert!(harness.outbox().await.is_empty());
    assert_eq!(harness.product_count().await, 0);
}
