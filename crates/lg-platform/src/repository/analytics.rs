//! SQLite analytics event repository
//!
//! Receives batch writes from the analytics buffer flush. Every event in a
//! batch gets its id and created_at at persist time.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use lg_common::{AnalyticsEvent, StoredAnalyticsEvent};

use crate::error::{PlatformError, Result};
use crate::repository::AnalyticsStore;

pub struct SqliteAnalyticsStore {
    pool: SqlitePool,
}

impl SqliteAnalyticsStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS analytics_events (
                id TEXT PRIMARY KEY,
                event_type TEXT NOT NULL,
                label TEXT NOT NULL,
                metadata TEXT,
                session_id TEXT,
                created_at BIGINT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_analytics_event_type ON analytics_events(event_type);
            CREATE INDEX IF NOT EXISTS idx_analytics_created ON analytics_events(created_at);
            "#,
        )
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl AnalyticsStore for SqliteAnalyticsStore {
    async fn persist_batch(&self, events: &[AnalyticsEvent]) -> Result<()> {
        if events.is_empty() {
            return Ok(());
        }

        // One transaction per flush so a partial batch never lands
        let mut tx = self.pool.begin().await?;
        let now = Utc::now().timestamp_millis();

        for event in events {
            let metadata = event
                .metadata
                .as_ref()
                .map(serde_json::to_string)
                .transpose()?;

            sqlx::query(
                r#"
                INSERT INTO analytics_events (id, event_type, label, metadata, session_id, created_at)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&event.event_type)
            .bind(&event.label)
            .bind(metadata)
            .bind(&event.session_id)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn recent(&self, event_type: Option<&str>, limit: u32) -> Result<Vec<StoredAnalyticsEvent>> {
        let rows = match event_type {
            Some(event_type) => {
                sqlx::query(
                    "SELECT * FROM analytics_events WHERE event_type = ? ORDER BY created_at DESC LIMIT ?",
                )
                .bind(event_type)
                .bind(limit as i64)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query("SELECT * FROM analytics_events ORDER BY created_at DESC LIMIT ?")
                    .bind(limit as i64)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        let mut events = Vec::with_capacity(rows.len());
        for row in rows {
            let created_at_ts: i64 = row.get("created_at");
            let created_at = DateTime::from_timestamp_millis(created_at_ts)
                .ok_or_else(|| PlatformError::internal("Invalid created_at timestamp"))?;

            let metadata: Option<String> = row.get("metadata");
            let metadata = metadata.map(|m| serde_json::from_str(&m)).transpose()?;

            events.push(StoredAnalyticsEvent {
                id: row.get("id"),
                event_type: row.get("event_type"),
                label: row.get("label"),
                metadata,
                session_id: row.get("session_id"),
                created_at,
            });
        }
        Ok(events)
    }
}
