//! Application Intake Service
//!
//! Orchestrates a submission: evaluates qualification, persists the record,
//! then fires the lifecycle webhook and the best-effort admin notification.
//! Neither side-channel can fail the business operation; the submission
//! succeeds or fails purely on its own merits.

use std::sync::Arc;
use async_trait::async_trait;
use chrono::Utc;
use tracing::{error, info};

use lg_common::events;

use crate::domain::{evaluate, Application, ApplicationSubmission, QualificationInput};
use crate::error::{PlatformError, Result};
use crate::repository::{
    ApplicationFilter, ApplicationSortField, ApplicationStore, SortOrder, StatusCount,
};
use crate::service::webhook::WebhookDispatcher;

/// Black-box notification channel for new applications (email in
/// production). Called fire-and-forget; failures are logged only.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn application_received(&self, application: &Application) -> anyhow::Result<()>;
}

/// Notifier that only writes a log line. Used when no outbound channel is
/// configured, and as the development default.
pub struct TracingNotifier;

#[async_trait]
impl Notifier for TracingNotifier {
    async fn application_received(&self, application: &Application) -> anyhow::Result<()> {
        info!(
            id = %application.id,
            email = %application.email,
            status = %application.status,
            "New application received"
        );
        Ok(())
    }
}

/// Aggregate intake counts for the admin dashboard
#[derive(Debug, Clone, serde::Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IntakeStats {
    pub total: i64,
    pub by_status: Vec<StatusCount>,
}

/// One page of the admin review table
#[derive(Debug, Clone)]
pub struct ApplicationPage {
    pub data: Vec<Application>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: i64,
}

pub struct IntakeService {
    applications: Arc<dyn ApplicationStore>,
    webhooks: WebhookDispatcher,
    notifier: Arc<dyn Notifier>,
}

impl IntakeService {
    pub fn new(
        applications: Arc<dyn ApplicationStore>,
        webhooks: WebhookDispatcher,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            applications,
            webhooks,
            notifier,
        }
    }

    /// Process one screening-form submission
    pub async fn create(&self, submission: ApplicationSubmission) -> Result<Application> {
        let input = QualificationInput::from(&submission);
        let result = evaluate(&input);
        let application = Application::from_submission(submission, result);

        self.applications.insert(&application).await?;
        info!(id = %application.id, status = %application.status, "Application created");

        self.webhooks.fire_event(
            events::APPLICATION_CREATED,
            serde_json::to_value(&application)?,
            false,
        );

        // Best-effort notification, never awaited by the request
        let notifier = self.notifier.clone();
        let snapshot = application.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.application_received(&snapshot).await {
                error!(id = %snapshot.id, error = %e, "Admin notification failed");
            }
        });

        Ok(application)
    }

    /// Manual review override. Overwrites `status` only; the automated
    /// evaluation's tags are kept for audit.
    pub async fn update_status(
        &self,
        id: &str,
        status: &str,
        note: Option<&str>,
    ) -> Result<Application> {
        let previous = self
            .applications
            .find_by_id(id)
            .await?
            .ok_or_else(|| PlatformError::not_found("Application", id))?;

        self.applications
            .update_status(id, status, note, Utc::now())
            .await?;

        let updated = self
            .applications
            .find_by_id(id)
            .await?
            .ok_or_else(|| PlatformError::not_found("Application", id))?;

        let mut payload = serde_json::to_value(&updated)?;
        if let Some(object) = payload.as_object_mut() {
            object.insert(
                "previousStatus".to_string(),
                serde_json::Value::String(previous.status),
            );
        }
        self.webhooks
            .fire_event(events::APPLICATION_STATUS_CHANGED, payload, false);

        Ok(updated)
    }

    /// Stamp an application as reviewed without changing its status. The
    /// note replaces any previous one; omitting it clears the field.
    pub async fn review(&self, id: &str, note: Option<&str>) -> Result<Application> {
        self.applications
            .mark_reviewed(id, note, Utc::now())
            .await?;

        let reviewed = self
            .applications
            .find_by_id(id)
            .await?
            .ok_or_else(|| PlatformError::not_found("Application", id))?;

        self.webhooks.fire_event(
            events::APPLICATION_REVIEWED,
            serde_json::to_value(&reviewed)?,
            false,
        );
        Ok(reviewed)
    }

    /// Apply one status to many applications, firing a status-changed event
    /// per updated record. Unknown ids are skipped; returns the updated count.
    pub async fn bulk_update_status(&self, ids: &[String], status: &str) -> Result<u64> {
        let mut updated = 0;
        for id in ids {
            match self.update_status(id, status, None).await {
                Ok(_) => updated += 1,
                Err(PlatformError::NotFound { .. }) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(updated)
    }

    pub async fn check_email(&self, email: &str) -> Result<bool> {
        self.applications.email_exists(email).await
    }

    pub async fn get(&self, id: &str) -> Result<Application> {
        self.applications
            .find_by_id(id)
            .await?
            .ok_or_else(|| PlatformError::not_found("Application", id))
    }

    pub async fn list(
        &self,
        filter: &ApplicationFilter,
        sort: ApplicationSortField,
        order: SortOrder,
        page: u32,
        limit: u32,
    ) -> Result<ApplicationPage> {
        let page = page.max(1);
        let (data, total) = self
            .applications
            .find_page(filter, sort, order, page, limit)
            .await?;

        Ok(ApplicationPage {
            data,
            total,
            page,
            limit,
            total_pages: (total + limit as i64 - 1) / limit.max(1) as i64,
        })
    }

    pub async fn stats(&self) -> Result<IntakeStats> {
        Ok(IntakeStats {
            total: self.applications.count_total().await?,
            by_status: self.applications.count_by_status().await?,
        })
    }
}
