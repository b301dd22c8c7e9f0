//! Repository Layer
//!
//! Store traits consumed by the services, their SQLite implementations, and
//! in-memory implementations used by tests. The core treats every store call
//! as a fallible remote call.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use lg_common::{AnalyticsEvent, AttendanceMode, DeliveryLogRecord, StoredAnalyticsEvent};

use crate::domain::Application;
use crate::error::Result;

pub mod application;
pub mod site_config;
pub mod delivery_log;
pub mod analytics;
pub mod memory;

pub use application::SqliteApplicationStore;
pub use site_config::SqliteConfigStore;
pub use delivery_log::SqliteDeliveryLogStore;
pub use analytics::SqliteAnalyticsStore;
pub use memory::{
    MemoryApplicationStore, MemoryConfigStore, MemoryDeliveryLogStore, MemoryAnalyticsStore,
};

/// Singleton key/value site configuration
#[async_trait]
pub trait ConfigStore: Send + Sync {
    async fn get_value(&self, key: &str) -> Result<Option<serde_json::Value>>;
    async fn upsert(&self, key: &str, value: serde_json::Value) -> Result<()>;
}

/// Append-only webhook delivery log
#[async_trait]
pub trait DeliveryLogStore: Send + Sync {
    /// Append one record, returning its id. Records are never updated.
    async fn append(&self, record: DeliveryLogRecord) -> Result<String>;
    /// Most recent records first
    async fn recent(&self, limit: u32) -> Result<Vec<DeliveryLogRecord>>;
}

/// Batch sink for flushed analytics events
#[async_trait]
pub trait AnalyticsStore: Send + Sync {
    async fn persist_batch(&self, events: &[AnalyticsEvent]) -> Result<()>;
    /// Most recent events first, optionally filtered by event type
    async fn recent(&self, event_type: Option<&str>, limit: u32) -> Result<Vec<StoredAnalyticsEvent>>;
}

/// Count of applications sharing one status
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StatusCount {
    pub status: String,
    pub count: i64,
}

/// Listing filters for the admin review table. All fields combine with AND;
/// `search` matches name, email, or mobile number case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct ApplicationFilter {
    pub status: Option<String>,
    pub search: Option<String>,
    pub attendance_mode: Option<AttendanceMode>,
    pub selected_session: Option<String>,
    pub tag: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ApplicationSortField {
    #[default]
    CreatedAt,
    FullName,
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Business-record store the qualification result attaches to
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    /// Insert a new application; duplicate email yields `PlatformError::Duplicate`
    async fn insert(&self, application: &Application) -> Result<()>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Application>>;
    async fn email_exists(&self, email: &str) -> Result<bool>;
    /// Manual review override: status, review note and timestamp only.
    /// Tags are deliberately left untouched.
    async fn update_status(
        &self,
        id: &str,
        status: &str,
        note: Option<&str>,
        reviewed_at: DateTime<Utc>,
    ) -> Result<()>;
    /// Stamp the review fields without touching the status. The note
    /// overwrites any previous one, clearing it when absent.
    async fn mark_reviewed(
        &self,
        id: &str,
        note: Option<&str>,
        reviewed_at: DateTime<Utc>,
    ) -> Result<()>;
    /// One page of filtered, sorted applications plus the total match count
    async fn find_page(
        &self,
        filter: &ApplicationFilter,
        sort: ApplicationSortField,
        order: SortOrder,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<Application>, i64)>;
    async fn count_total(&self) -> Result<i64>;
    async fn count_by_status(&self) -> Result<Vec<StatusCount>>;
}
