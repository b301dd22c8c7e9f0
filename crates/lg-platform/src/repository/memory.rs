//! In-memory store implementations
//!
//! Used by unit and API tests, and handy for local development without a
//! database file. The analytics store can be told to fail its next writes
//! so flush-failure handling can be exercised.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use uuid::Uuid;

use lg_common::{AnalyticsEvent, DeliveryLogRecord, StoredAnalyticsEvent};

use crate::domain::Application;
use crate::error::{PlatformError, Result};
use crate::repository::{
    AnalyticsStore, ApplicationFilter, ApplicationSortField, ApplicationStore, ConfigStore,
    DeliveryLogStore, SortOrder, StatusCount,
};

#[derive(Default)]
pub struct MemoryConfigStore {
    values: Mutex<HashMap<String, serde_json::Value>>,
}

impl MemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(key: &str, value: serde_json::Value) -> Self {
        let store = Self::new();
        store.values.lock().insert(key.to_string(), value);
        store
    }
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
    async fn get_value(&self, key: &str) -> Result<Option<serde_json::Value>> {
        Ok(self.values.lock().get(key).cloned())
    }

    async fn upsert(&self, key: &str, value: serde_json::Value) -> Result<()> {
        self.values.lock().insert(key.to_string(), value);
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryDeliveryLogStore {
    records: Mutex<Vec<DeliveryLogRecord>>,
}

impl MemoryDeliveryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<DeliveryLogRecord> {
        self.records.lock().clone()
    }
}

#[async_trait]
impl DeliveryLogStore for MemoryDeliveryLogStore {
    async fn append(&self, record: DeliveryLogRecord) -> Result<String> {
        let id = record.id.clone();
        self.records.lock().push(record);
        Ok(id)
    }

    async fn recent(&self, limit: u32) -> Result<Vec<DeliveryLogRecord>> {
        let records = self.records.lock();
        Ok(records.iter().rev().take(limit as usize).cloned().collect())
    }
}

#[derive(Default)]
pub struct MemoryAnalyticsStore {
    events: Mutex<Vec<StoredAnalyticsEvent>>,
    fail_writes: Mutex<u32>,
}

impl MemoryAnalyticsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `count` persist calls fail
    pub fn fail_next_writes(&self, count: u32) {
        *self.fail_writes.lock() = count;
    }

    pub fn persisted(&self) -> Vec<StoredAnalyticsEvent> {
        self.events.lock().clone()
    }

    pub fn persisted_count(&self) -> usize {
        self.events.lock().len()
    }
}

#[async_trait]
impl AnalyticsStore for MemoryAnalyticsStore {
    async fn persist_batch(&self, events: &[AnalyticsEvent]) -> Result<()> {
        {
            let mut remaining = self.fail_writes.lock();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(PlatformError::internal("Injected analytics write failure"));
            }
        }

        let now = Utc::now();
        let mut stored = self.events.lock();
        for event in events {
            stored.push(StoredAnalyticsEvent {
                id: Uuid::new_v4().to_string(),
                event_type: event.event_type.clone(),
                label: event.label.clone(),
                metadata: event.metadata.clone(),
                session_id: event.session_id.clone(),
                created_at: now,
            });
        }
        Ok(())
    }

    async fn recent(&self, event_type: Option<&str>, limit: u32) -> Result<Vec<StoredAnalyticsEvent>> {
        let events = self.events.lock();
        Ok(events
            .iter()
            .rev()
            .filter(|e| event_type.map(|t| e.event_type == t).unwrap_or(true))
            .take(limit as usize)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MemoryApplicationStore {
    applications: Mutex<Vec<Application>>,
}

impl MemoryApplicationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ApplicationStore for MemoryApplicationStore {
    async fn insert(&self, application: &Application) -> Result<()> {
        let mut applications = self.applications.lock();
        if applications.iter().any(|a| a.email == application.email) {
            return Err(PlatformError::duplicate("Application", "email", &application.email));
        }
        applications.push(application.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Application>> {
        Ok(self.applications.lock().iter().find(|a| a.id == id).cloned())
    }

    async fn email_exists(&self, email: &str) -> Result<bool> {
        let email = email.to_lowercase();
        Ok(self.applications.lock().iter().any(|a| a.email == email))
    }

    async fn update_status(
        &self,
        id: &str,
        status: &str,
        note: Option<&str>,
        reviewed_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut applications = self.applications.lock();
        let application = applications
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| PlatformError::not_found("Application", id))?;

        application.status = status.to_string();
        application.reviewed_at = Some(reviewed_at);
        if let Some(note) = note {
            application.review_notes = Some(note.to_string());
        }
        Ok(())
    }

    async fn mark_reviewed(
        &self,
        id: &str,
        note: Option<&str>,
        reviewed_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut applications = self.applications.lock();
        let application = applications
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| PlatformError::not_found("Application", id))?;

        application.reviewed_at = Some(reviewed_at);
        application.review_notes = note.map(str::to_string);
        Ok(())
    }

    async fn find_page(
        &self,
        filter: &ApplicationFilter,
        sort: ApplicationSortField,
        order: SortOrder,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<Application>, i64)> {
        let applications = self.applications.lock();
        let mut matched: Vec<Application> = applications
            .iter()
            .filter(|a| {
                filter.status.as_ref().map_or(true, |s| &a.status == s)
                    && filter.attendance_mode.map_or(true, |m| a.attendance_mode == m)
                    && filter
                        .selected_session
                        .as_ref()
                        .map_or(true, |s| &a.selected_session == s)
                    && filter.tag.as_ref().map_or(true, |t| a.tags.iter().any(|x| x == t))
                    && filter.date_from.map_or(true, |d| a.created_at >= d)
                    && filter.date_to.map_or(true, |d| a.created_at <= d)
                    && filter.search.as_ref().map_or(true, |q| {
                        let q = q.to_lowercase();
                        a.full_name.to_lowercase().contains(&q)
                            || a.email.to_lowercase().contains(&q)
                            || a.mobile_number.contains(&q)
                    })
            })
            .cloned()
            .collect();

        matched.sort_by(|a, b| {
            let ordering = match sort {
                ApplicationSortField::CreatedAt => a.created_at.cmp(&b.created_at),
                ApplicationSortField::FullName => a.full_name.cmp(&b.full_name),
                ApplicationSortField::Status => a.status.cmp(&b.status),
            };
            match order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            }
        });

        let total = matched.len() as i64;
        let offset = (page.max(1) as usize - 1) * limit as usize;
        let data = matched
            .into_iter()
            .skip(offset)
            .take(limit as usize)
            .collect();
        Ok((data, total))
    }

    async fn count_total(&self) -> Result<i64> {
        Ok(self.applications.lock().len() as i64)
    }

    async fn count_by_status(&self) -> Result<Vec<StatusCount>> {
        let applications = self.applications.lock();
        let mut counts: Vec<StatusCount> = Vec::new();
        for application in applications.iter() {
            match counts.iter_mut().find(|c| c.status == application.status) {
                Some(entry) => entry.count += 1,
                None => counts.push(StatusCount {
                    status: application.status.clone(),
                    count: 1,
                }),
            }
        }
        counts.sort_by(|a, b| b.count.cmp(&a.count));
        Ok(counts)
    }
}
