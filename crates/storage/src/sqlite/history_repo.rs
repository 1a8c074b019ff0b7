use async_trait::async_trait;
use chrono::Utc;
use exam_core::model::TestHistory;
use sqlx::Row;

use crate::repository::{
    HISTORY_KEY, HistoryRepository, StorageError, decode_history, encode_history,
};

use super::SqliteRepository;

impl SqliteRepository {
    /// Read the raw value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the query fails.
    pub async fn get_value(&self, key: &str) -> Result<Option<String>, StorageError> {
        let row = sqlx::query("SELECT value FROM kv_store WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;

        row.map(|row| {
            row.try_get::<String, _>("value")
                .map_err(|err| StorageError::Serialization(err.to_string()))
        })
        .transpose()
    }

    /// Every stored key, in key order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the query fails.
    pub async fn keys(&self) -> Result<Vec<String>, StorageError> {
        sqlx::query_scalar("SELECT key FROM kv_store ORDER BY key")
            .fetch_all(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))
    }

    /// Write `value` under `key`, replacing whatever was there.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the write fails.
    pub async fn put_value(&self, key: &str, value: &str) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            ",
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }
}

#[async_trait]
impl HistoryRepository for SqliteRepository {
    async fn load_history(&self) -> Result<TestHistory, StorageError> {
        match self.get_value(HISTORY_KEY).await? {
            Some(raw) => decode_history(&raw),
            None => Ok(TestHistory::new()),
        }
    }

    async fn save_history(&self, history: &TestHistory) -> Result<(), StorageError> {
        let encoded = encode_history(history)?;
        self.put_value(HISTORY_KEY, &encoded).await
    }
}
