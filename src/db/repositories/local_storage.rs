use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, OptionalExtension};

use crate::db::{helpers::parse_datetime, models::StoredItem, Database};

impl Database {
    pub async fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(self.get_stored_item(key).await?.map(|item| item.value))
    }

    pub async fn get_stored_item(&self, key: &str) -> Result<Option<StoredItem>> {
        let key = key.to_string();
        self.execute(move |conn| {
            let row = conn
                .query_row(
                    "SELECT key, value, updated_at FROM local_storage WHERE key = ?1",
                    params![key],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                        ))
                    },
                )
                .optional()
                .with_context(|| format!("failed to read storage key {key}"))?;

            match row {
                Some((key, value, updated_at)) => Ok(Some(StoredItem {
                    key,
                    value,
                    updated_at: parse_datetime(&updated_at, "updated_at")?,
                })),
                None => Ok(None),
            }
        })
        .await
    }

    /// Overwrites the value stored under `key`.
    pub async fn set_item(&self, key: &str, value: String) -> Result<()> {
        let key = key.to_string();
        self.execute(move |conn| {
            conn.execute(
                "INSERT INTO local_storage (key, value, updated_at)
                 VALUES (?1, ?2, ?3)
                 ON CONFLICT(key) DO UPDATE SET
                     value = excluded.value,
                     updated_at = excluded.updated_at",
                params![key, value, Utc::now().to_rfc3339()],
            )
            .with_context(|| format!("failed to write storage key {key}"))?;
            Ok(())
        })
        .await
    }

    /// Drops `key`; a missing key is not an error.
    pub async fn remove_item(&self, key: &str) -> Result<()> {
        let key = key.to_string();
        self.execute(move |conn| {
            conn.execute("DELETE FROM local_storage WHERE key = ?1", params![key])
                .with_context(|| format!("failed to remove storage key {key}"))?;
            Ok(())
        })
        .await
    }
}
