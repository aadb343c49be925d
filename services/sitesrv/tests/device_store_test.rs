//! Device store integration tests
//!
//! Exercises the SQLite-backed descriptor store end to end: round-trips,
//! class-scoped listing, full-replacement updates and transactional
//! deletes.

#![allow(clippy::disallowed_methods)] // Integration test - unwrap is acceptable

mod common;

use ampflow_common::SqliteClient;
use common::{attrs, memory_store};
use errors::AmpError;
use sitesrv::device::{name_for_id, DeviceClass, DeviceStore};
use sqlx::sqlite::SqlitePoolOptions;

#[tokio::test]
async fn test_add_get_round_trip() {
    let store = memory_store().await;
    let attributes = attrs(&[("host", "192.168.1.50"), ("port", "502")]);

    let id = store
        .add(DeviceClass::Charger, "demo", &attributes)
        .await
        .expect("add charger");
    assert_eq!(id, 1);

    let row = store.get(id).await.expect("get charger");
    assert_eq!(row.id, id);
    assert_eq!(row.class, DeviceClass::Charger);
    assert_eq!(row.device_type, "demo");
    assert_eq!(row.attributes, attributes);

    let named = row.named();
    assert_eq!(named.name, "db:1");
    assert_eq!(named.device_type, "demo");
    assert_eq!(named.attributes, attributes);

    let typed = row.typed();
    assert_eq!(typed.device_type, "demo");
    assert_eq!(typed.attributes, attributes);
}

#[tokio::test]
async fn test_list_is_class_scoped_and_id_ordered() {
    let store = memory_store().await;

    let first = store
        .add(DeviceClass::Meter, "demo", &attrs(&[("power", "1000")]))
        .await
        .expect("add first meter");
    store
        .add(DeviceClass::Charger, "demo", &attrs(&[("enabled", "true")]))
        .await
        .expect("add charger");
    let second = store
        .add(DeviceClass::Meter, "demo", &attrs(&[("power", "2000")]))
        .await
        .expect("add second meter");

    let meters = store.list_by_class(DeviceClass::Meter).await.expect("list meters");
    let ids: Vec<i64> = meters.iter().map(|row| row.id).collect();
    assert_eq!(ids, vec![first, second]);
    assert!(meters.iter().all(|row| row.class == DeviceClass::Meter));

    let chargers = store
        .list_by_class(DeviceClass::Charger)
        .await
        .expect("list chargers");
    assert_eq!(chargers.len(), 1);

    assert!(store
        .list_by_class(DeviceClass::Vehicle)
        .await
        .expect("list vehicles")
        .is_empty());
}

#[tokio::test]
async fn test_list_skips_orphaned_rows() {
    let store = memory_store().await;

    let orphan = store
        .add(DeviceClass::Meter, "demo", &attrs(&[]))
        .await
        .expect("add orphan");
    let healthy = store
        .add(DeviceClass::Meter, "demo", &attrs(&[("power", "1000")]))
        .await
        .expect("add healthy");

    let meters = store.list_by_class(DeviceClass::Meter).await.expect("list");
    assert_eq!(meters.len(), 1);
    assert_eq!(meters[0].id, healthy);

    // Lookup by id still reaches the orphan so it can be repaired or deleted
    let row = store.get(orphan).await.expect("get orphan");
    assert!(row.attributes.is_empty());
}

#[tokio::test]
async fn test_update_replaces_full_attribute_set() {
    let store = memory_store().await;

    let id = store
        .add(DeviceClass::Vehicle, "demo", &attrs(&[("soc", "50"), ("capacity", "58")]))
        .await
        .expect("add vehicle");

    store
        .update(DeviceClass::Vehicle, id, &attrs(&[("soc", "80"), ("title", "Blue EV")]))
        .await
        .expect("update vehicle");

    let row = store.get(id).await.expect("get vehicle");
    assert_eq!(row.attributes, attrs(&[("soc", "80"), ("title", "Blue EV")]));
    assert!(!row.attributes.contains_key("capacity"));
}

#[tokio::test]
async fn test_update_is_idempotent() {
    let store = memory_store().await;

    let id = store
        .add(DeviceClass::Meter, "demo", &attrs(&[("power", "1000")]))
        .await
        .expect("add meter");

    let replacement = attrs(&[("power", "1500")]);
    store
        .update(DeviceClass::Meter, id, &replacement)
        .await
        .expect("first update");
    store
        .update(DeviceClass::Meter, id, &replacement)
        .await
        .expect("second update");

    let meters = store.list_by_class(DeviceClass::Meter).await.expect("list");
    assert_eq!(meters.len(), 1);
    assert_eq!(meters[0].attributes, replacement);
}

#[tokio::test]
async fn test_missing_ids_are_reported() {
    let store = memory_store().await;

    let err = store.get(99).await.expect_err("get missing");
    assert!(matches!(err, AmpError::DeviceNotFound(99)));

    let err = store
        .update(DeviceClass::Meter, 99, &attrs(&[("power", "1")]))
        .await
        .expect_err("update missing");
    assert!(matches!(err, AmpError::DeviceNotFound(99)));

    let err = store
        .delete(DeviceClass::Meter, 99)
        .await
        .expect_err("delete missing");
    assert!(matches!(err, AmpError::DeviceNotFound(99)));
}

#[tokio::test]
async fn test_class_mismatch_is_not_found() {
    let store = memory_store().await;

    let id = store
        .add(DeviceClass::Meter, "demo", &attrs(&[("power", "1000")]))
        .await
        .expect("add meter");

    let err = store
        .update(DeviceClass::Charger, id, &attrs(&[("enabled", "true")]))
        .await
        .expect_err("update as charger");
    assert!(matches!(err, AmpError::DeviceNotFound(found) if found == id));

    let err = store
        .delete(DeviceClass::Charger, id)
        .await
        .expect_err("delete as charger");
    assert!(matches!(err, AmpError::DeviceNotFound(found) if found == id));

    // The row survives the mismatched operations untouched
    let row = store.get(id).await.expect("get");
    assert_eq!(row.class, DeviceClass::Meter);
    assert_eq!(row.attributes, attrs(&[("power", "1000")]));
}

#[tokio::test]
async fn test_delete_never_recycles_names() {
    let store = memory_store().await;

    let first = store
        .add(DeviceClass::Meter, "demo", &attrs(&[("power", "1000")]))
        .await
        .expect("add");
    store
        .delete(DeviceClass::Meter, first)
        .await
        .expect("delete");

    assert!(store.get(first).await.is_err());
    assert!(store
        .list_by_class(DeviceClass::Meter)
        .await
        .expect("list")
        .is_empty());

    // AUTOINCREMENT keeps old ids retired, so db:<id> names stay unique
    let second = store
        .add(DeviceClass::Meter, "demo", &attrs(&[("power", "2000")]))
        .await
        .expect("re-add");
    assert!(second > first);
    assert_ne!(name_for_id(first), name_for_id(second));
}

#[tokio::test]
async fn test_failed_add_leaves_no_partial_descriptor() {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("connect in-memory sqlite");
    let store = DeviceStore::new(pool.clone());
    store.init_schema().await.expect("init schema");

    // Break the second half of the add so it fails after the config insert
    sqlx::query("DROP TABLE device_config_details")
        .execute(&pool)
        .await
        .expect("drop details table");

    let err = store
        .add(DeviceClass::Meter, "demo", &attrs(&[("power", "1000")]))
        .await
        .expect_err("details insert fails");
    assert!(matches!(err, AmpError::Sqlite(_)));

    // The config row written in the same transaction rolled back with it
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM device_configs")
        .fetch_one(&pool)
        .await
        .expect("count config rows");
    assert_eq!(count, 0);
}

#[tokio::test]
async fn test_descriptors_survive_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db_path = dir.path().join("devices.db");

    let client = SqliteClient::new(&db_path).await.expect("open");
    let store = DeviceStore::new(client.pool().clone());
    store.init_schema().await.expect("init schema");
    let id = store
        .add(DeviceClass::Meter, "demo", &attrs(&[("power", "1000")]))
        .await
        .expect("add meter");
    client.pool().close().await;

    let client = SqliteClient::new(&db_path).await.expect("reopen");
    let store = DeviceStore::new(client.pool().clone());
    store.init_schema().await.expect("init schema");

    let row = store.get(id).await.expect("get after reopen");
    assert_eq!(row.class, DeviceClass::Meter);
    assert_eq!(row.attributes, attrs(&[("power", "1000")]));
    assert_eq!(row.named().name, format!("db:{id}"));
}

#[test]
fn test_name_for_id_format() {
    assert_eq!(name_for_id(1), "db:1");
    assert_eq!(name_for_id(42), "db:42");
}
