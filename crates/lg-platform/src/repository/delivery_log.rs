//! SQLite webhook delivery log repository
//!
//! Append-only: one row per delivery attempt sequence, inserted after the
//! retry loop terminates and never updated.

use async_trait::async_trait;
use chrono::DateTime;
use sqlx::{Row, SqlitePool};

use lg_common::DeliveryLogRecord;

use crate::error::{PlatformError, Result};
use crate::repository::DeliveryLogStore;

pub struct SqliteDeliveryLogStore {
    pool: SqlitePool,
}

impl SqliteDeliveryLogStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS webhook_logs (
                id TEXT PRIMARY KEY,
                event TEXT NOT NULL,
                payload TEXT NOT NULL,
                status INTEGER NOT NULL,
                response TEXT,
                attempts INTEGER NOT NULL,
                success INTEGER NOT NULL,
                created_at BIGINT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_webhook_logs_created ON webhook_logs(created_at);
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl DeliveryLogStore for SqliteDeliveryLogStore {
    async fn append(&self, record: DeliveryLogRecord) -> Result<String> {
        sqlx::query(
            r#"
            INSERT INTO webhook_logs (id, event, payload, status, response, attempts, success, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.event)
        .bind(serde_json::to_string(&record.payload)?)
        .bind(record.status as i64)
        .bind(&record.response)
        .bind(record.attempts as i64)
        .bind(record.success)
        .bind(record.created_at.timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(record.id)
    }

    async fn recent(&self, limit: u32) -> Result<Vec<DeliveryLogRecord>> {
        let rows = sqlx::query("SELECT * FROM webhook_logs ORDER BY created_at DESC LIMIT ?")
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;

        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let created_at_ts: i64 = row.get("created_at");
            let created_at = DateTime::from_timestamp_millis(created_at_ts)
                .ok_or_else(|| PlatformError::internal("Invalid created_at timestamp"))?;

            records.push(DeliveryLogRecord {
                id: row.get("id"),
                event: row.get("event"),
                payload: serde_json::from_str(row.get("payload"))?,
                status: row.get::<i64, _>("status") as u16,
                response: row.get("response"),
                attempts: row.get::<i64, _>("attempts") as u32,
                success: row.get("success"),
                created_at,
            });
        }
        Ok(records)
    }
}
