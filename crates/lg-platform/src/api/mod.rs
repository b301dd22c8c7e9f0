//! API Layer
//!
//! REST endpoints: public intake/tracking plus the admin panel APIs.

use axum::{Extension, Router};
use std::sync::Arc;

pub mod common;
pub mod middleware;

pub mod applications;
pub mod analytics;
pub mod webhooks;
pub mod config;
pub mod health;
pub mod openapi;

pub use common::*;
pub use openapi::PlatformApiDoc;
pub use middleware::{ApiKeyConfig, RequireApiKey};

pub use applications::{ApplicationsState, applications_router};
pub use analytics::{AnalyticsState, analytics_router};
pub use webhooks::{WebhooksState, webhooks_router};
pub use config::{ConfigState, config_router};
pub use health::health_router;

use crate::repository::{AnalyticsStore, ConfigStore, DeliveryLogStore};
use crate::service::{AnalyticsBuffer, IntakeService, WebhookDispatcher};

/// Assemble the full platform router. Used by the server binary and the
/// API tests.
#[allow(clippy::too_many_arguments)]
pub fn platform_router(
    intake: Arc<IntakeService>,
    buffer: Arc<AnalyticsBuffer>,
    analytics_store: Arc<dyn AnalyticsStore>,
    dispatcher: WebhookDispatcher,
    delivery_logs: Arc<dyn DeliveryLogStore>,
    config_store: Arc<dyn ConfigStore>,
    api_key: ApiKeyConfig,
) -> Router {
    Router::new()
        .nest("/api/applications", applications_router(ApplicationsState { intake }))
        .nest(
            "/api/analytics",
            analytics_router(AnalyticsState {
                buffer,
                store: analytics_store,
            }),
        )
        .nest(
            "/api/webhooks",
            webhooks_router(WebhooksState {
                dispatcher,
                logs: delivery_logs,
            }),
        )
        .nest("/api/config", config_router(ConfigState { store: config_store }))
        .merge(health_router())
        .layer(Extension(api_key))
}
