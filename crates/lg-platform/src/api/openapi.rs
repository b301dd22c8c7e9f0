//! OpenAPI Documentation
//!
//! Central OpenAPI specification for all platform APIs, served through
//! swagger-ui by the server binary.

use utoipa::OpenApi;

use lg_common::{AnalyticsEvent, AttendanceMode, DeliveryLogRecord, StoredAnalyticsEvent, WebhookConfig};

use crate::repository::StatusCount;
use crate::service::IntakeStats;

/// Platform API OpenAPI Documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leadgate Platform API",
        version = "0.1.0",
        description = "Lead intake, webhook delivery, and analytics ingestion"
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development")
    ),
    tags(
        (name = "applications", description = "Intake and application review"),
        (name = "analytics", description = "Telemetry tracking"),
        (name = "webhooks", description = "Webhook delivery logs and testing"),
        (name = "config", description = "Site configuration"),
        (name = "monitoring", description = "Health and monitoring")
    ),
    paths(
        // Applications API
        super::applications::submit_application,
        super::applications::check_email,
        super::applications::list_applications,
        super::applications::get_application,
        super::applications::update_status,
        super::applications::review_application,
        super::applications::bulk_update_status,
        super::applications::get_stats,
        // Analytics API
        super::analytics::track_event,
        super::analytics::track_batch,
        super::analytics::list_events,
        // Webhooks Admin API
        super::webhooks::get_logs,
        super::webhooks::send_test,
        // Config Admin API
        super::config::get_config,
        super::config::upsert_config,
        // Monitoring API
        super::health::health,
    ),
    components(
        schemas(
            // Application schemas
            super::applications::SubmitApplicationRequest,
            super::applications::ApplicationResponse,
            super::applications::ApplicationListResponse,
            super::applications::UpdateStatusRequest,
            super::applications::ReviewApplicationRequest,
            super::applications::BulkUpdateStatusRequest,
            super::applications::BulkUpdateResponse,
            super::applications::CheckEmailResponse,
            IntakeStats,
            StatusCount,
            AttendanceMode,
            // Analytics schemas
            super::analytics::TrackEventRequest,
            super::analytics::TrackBatchRequest,
            super::analytics::TrackResponse,
            super::analytics::TrackBatchResponse,
            AnalyticsEvent,
            StoredAnalyticsEvent,
            // Webhook schemas
            DeliveryLogRecord,
            WebhookConfig,
            // Config schemas
            super::config::UpsertConfigRequest,
            super::config::ConfigResponse,
            // Common schemas
            super::common::ApiError,
            super::common::SuccessResponse,
            super::health::HealthResponse,
        )
    )
)]
pub struct PlatformApiDoc;
