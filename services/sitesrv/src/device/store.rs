//! Persisted device configuration store.
//!
//! Device descriptors created at runtime (through the management API or the
//! marshal tool) are stored in SQLite as one config row plus one detail row
//! per attribute. Store-sourced devices are addressed by the synthesized
//! name `db:<id>`, which stays stable across restarts.

use std::collections::HashMap;

use errors::{AmpError, AmpResult};
use sqlx::sqlite::SqlitePool;
use sqlx::{Sqlite, Transaction};

use super::{Attributes, DeviceClass, NamedConfig, TypedConfig};

/// Synthesized display name for a persisted device
pub fn name_for_id(id: i64) -> String {
    format!("db:{id}")
}

/// One persisted descriptor
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceConfigRow {
    pub id: i64,
    pub class: DeviceClass,
    pub device_type: String,
    pub attributes: Attributes,
}

impl DeviceConfigRow {
    /// Named projection with the synthesized `db:<id>` name
    pub fn named(&self) -> NamedConfig {
        NamedConfig {
            name: name_for_id(self.id),
            device_type: self.device_type.clone(),
            attributes: self.attributes.clone(),
        }
    }

    /// Name-less projection
    pub fn typed(&self) -> TypedConfig {
        TypedConfig {
            device_type: self.device_type.clone(),
            attributes: self.attributes.clone(),
        }
    }
}

/// SQLite-backed descriptor store
#[derive(Clone)]
pub struct DeviceStore {
    pool: SqlitePool,
}

impl DeviceStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create the descriptor tables if they do not exist yet
    pub async fn init_schema(&self) -> AmpResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS device_configs (
                id    INTEGER PRIMARY KEY AUTOINCREMENT,
                class TEXT NOT NULL,
                type  TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS device_config_details (
                config_id INTEGER NOT NULL REFERENCES device_configs(id) ON DELETE CASCADE,
                key       TEXT NOT NULL,
                value     TEXT NOT NULL,
                UNIQUE (config_id, key)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// All descriptors of one class, ordered by id ascending.
    ///
    /// Rows without any attribute details are orphaned and skipped.
    pub async fn list_by_class(&self, class: DeviceClass) -> AmpResult<Vec<DeviceConfigRow>> {
        let rows: Vec<(i64, String)> =
            sqlx::query_as("SELECT id, type FROM device_configs WHERE class = ? ORDER BY id")
                .bind(class.as_str())
                .fetch_all(&self.pool)
                .await?;

        let details: Vec<(i64, String, String)> = sqlx::query_as(
            r#"
            SELECT d.config_id, d.key, d.value
            FROM device_config_details d
            JOIN device_configs c ON c.id = d.config_id
            WHERE c.class = ?
            "#,
        )
        .bind(class.as_str())
        .fetch_all(&self.pool)
        .await?;

        let mut by_config: HashMap<i64, Attributes> = HashMap::new();
        for (config_id, key, value) in details {
            by_config.entry(config_id).or_default().insert(key, value);
        }

        let mut configs = Vec::with_capacity(rows.len());
        for (id, device_type) in rows {
            let Some(attributes) = by_config.remove(&id) else {
                continue;
            };
            configs.push(DeviceConfigRow {
                id,
                class,
                device_type,
                attributes,
            });
        }
        Ok(configs)
    }

    /// One descriptor by id
    pub async fn get(&self, id: i64) -> AmpResult<DeviceConfigRow> {
        let row: Option<(String, String)> =
            sqlx::query_as("SELECT class, type FROM device_configs WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        let (class, device_type) = row.ok_or(AmpError::DeviceNotFound(id))?;
        let class: DeviceClass = class.parse()?;

        let details: Vec<(String, String)> =
            sqlx::query_as("SELECT key, value FROM device_config_details WHERE config_id = ?")
                .bind(id)
                .fetch_all(&self.pool)
                .await?;

        Ok(DeviceConfigRow {
            id,
            class,
            device_type,
            attributes: details.into_iter().collect(),
        })
    }

    /// Persist a new descriptor, returning its assigned id.
    ///
    /// Config row and attribute rows are written in one transaction; a
    /// failure midway leaves no partial descriptor visible.
    pub async fn add(
        &self,
        class: DeviceClass,
        device_type: &str,
        attributes: &Attributes,
    ) -> AmpResult<i64> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query("INSERT INTO device_configs (class, type) VALUES (?, ?)")
            .bind(class.as_str())
            .bind(device_type)
            .execute(&mut *tx)
            .await?;
        let id = result.last_insert_rowid();

        insert_details(&mut tx, id, attributes).await?;

        tx.commit().await?;
        Ok(id)
    }

    /// Replace the full attribute set of a persisted descriptor.
    ///
    /// Partial updates are not supported; callers supply the complete map.
    pub async fn update(
        &self,
        class: DeviceClass,
        id: i64,
        attributes: &Attributes,
    ) -> AmpResult<()> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<i64> =
            sqlx::query_scalar("SELECT id FROM device_configs WHERE id = ? AND class = ?")
                .bind(id)
                .bind(class.as_str())
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Err(AmpError::DeviceNotFound(id));
        }

        sqlx::query("DELETE FROM device_config_details WHERE config_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        insert_details(&mut tx, id, attributes).await?;

        tx.commit().await?;
        Ok(())
    }

    /// Remove a persisted descriptor and its attributes
    pub async fn delete(&self, class: DeviceClass, id: i64) -> AmpResult<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM device_config_details WHERE config_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM device_configs WHERE id = ? AND class = ?")
            .bind(id)
            .bind(class.as_str())
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AmpError::DeviceNotFound(id));
        }

        tx.commit().await?;
        Ok(())
    }
}

async fn insert_details(
    tx: &mut Transaction<'_, Sqlite>,
    config_id: i64,
    attributes: &Attributes,
) -> AmpResult<()> {
    for (key, value) in attributes {
        sqlx::query("INSERT INTO device_config_details (config_id, key, value) VALUES (?, ?, ?)")
            .bind(config_id)
            .bind(key)
            .bind(value)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}
