//! Webhooks Admin API
//!
//! Delivery log inspection and the operator "fire test event" trigger.

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

use lg_common::{events, DeliveryLogRecord};

use crate::api::common::SuccessResponse;
use crate::api::middleware::RequireApiKey;
use crate::error::PlatformError;
use crate::repository::DeliveryLogStore;
use crate::service::WebhookDispatcher;

#[derive(Debug, Default, Deserialize)]
pub struct LogsQuery {
    pub limit: Option<u32>,
}

/// Webhooks service state
#[derive(Clone)]
pub struct WebhooksState {
    pub dispatcher: WebhookDispatcher,
    pub logs: Arc<dyn DeliveryLogStore>,
}

/// List recent webhook delivery log records
#[utoipa::path(
    get,
    path = "/api/webhooks/logs",
    tag = "webhooks",
    params(("limit" = Option<u32>, Query, description = "Max records to return (default 50)")),
    responses((status = 200, description = "Most recent records first", body = [DeliveryLogRecord])),
    security(("api_key" = []))
)]
pub async fn get_logs(
    _auth: RequireApiKey,
    State(state): State<WebhooksState>,
    Query(query): Query<LogsQuery>,
) -> Result<Json<Vec<DeliveryLogRecord>>, PlatformError> {
    let limit = query.limit.unwrap_or(50).clamp(1, 500);
    Ok(Json(state.logs.recent(limit).await?))
}

/// Fire a synthetic event for operator verification. Bypasses the
/// allow-list so a fresh endpoint can be checked before opting into events.
#[utoipa::path(
    post,
    path = "/api/webhooks/test",
    tag = "webhooks",
    responses((status = 200, description = "Test event fired", body = SuccessResponse)),
    security(("api_key" = []))
)]
pub async fn send_test(
    _auth: RequireApiKey,
    State(state): State<WebhooksState>,
) -> Result<Json<SuccessResponse>, PlatformError> {
    state.dispatcher.fire_event(
        events::WEBHOOK_TEST,
        serde_json::json!({
            "message": "This is a test webhook delivery",
            "timestamp": Utc::now().to_rfc3339(),
        }),
        true,
    );
    Ok(Json(SuccessResponse::with_message("Test webhook fired")))
}

pub fn webhooks_router(state: WebhooksState) -> Router {
    Router::new()
        .route("/logs", get(get_logs))
        .route("/test", post(send_test))
        .with_state(state)
}
