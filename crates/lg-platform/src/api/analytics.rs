//! Analytics API
//!
//! Public tracking endpoints feeding the in-memory buffer, and an admin
//! endpoint over the persisted events.

use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use lg_common::{AnalyticsEvent, StoredAnalyticsEvent};

use crate::api::middleware::RequireApiKey;
use crate::error::PlatformError;
use crate::repository::AnalyticsStore;
use crate::service::AnalyticsBuffer;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TrackEventRequest {
    pub event_type: String,
    pub label: String,
    pub metadata: Option<serde_json::Value>,
    pub session_id: Option<String>,
}

impl From<TrackEventRequest> for AnalyticsEvent {
    fn from(r: TrackEventRequest) -> Self {
        Self {
            event_type: r.event_type,
            label: r.label,
            metadata: r.metadata,
            session_id: r.session_id,
        }
    }
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct TrackBatchRequest {
    pub events: Vec<TrackEventRequest>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TrackResponse {
    pub accepted: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TrackBatchResponse {
    pub accepted: usize,
    pub dropped: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventsQuery {
    pub event_type: Option<String>,
    pub limit: Option<u32>,
}

/// Analytics service state
#[derive(Clone)]
pub struct AnalyticsState {
    pub buffer: Arc<AnalyticsBuffer>,
    pub store: Arc<dyn AnalyticsStore>,
}

/// Track one telemetry event
#[utoipa::path(
    post,
    path = "/api/analytics/track",
    tag = "analytics",
    request_body = TrackEventRequest,
    responses((status = 200, description = "Acceptance flag (false when the buffer is full)", body = TrackResponse))
)]
pub async fn track_event(
    State(state): State<AnalyticsState>,
    Json(req): Json<TrackEventRequest>,
) -> Result<Json<TrackResponse>, PlatformError> {
    if req.event_type.trim().is_empty() {
        return Err(PlatformError::validation("eventType must not be empty"));
    }

    let accepted = state.buffer.track(req.into()).await;
    Ok(Json(TrackResponse { accepted }))
}

/// Track a batch of telemetry events
#[utoipa::path(
    post,
    path = "/api/analytics/track/batch",
    tag = "analytics",
    request_body = TrackBatchRequest,
    responses((status = 200, description = "Accepted and dropped counts", body = TrackBatchResponse))
)]
pub async fn track_batch(
    State(state): State<AnalyticsState>,
    Json(req): Json<TrackBatchRequest>,
) -> Result<Json<TrackBatchResponse>, PlatformError> {
    let events: Vec<AnalyticsEvent> = req.events.into_iter().map(Into::into).collect();
    let outcome = state.buffer.track_batch(events).await;

    Ok(Json(TrackBatchResponse {
        accepted: outcome.accepted,
        dropped: outcome.dropped,
    }))
}

/// List persisted analytics events
#[utoipa::path(
    get,
    path = "/api/analytics/events",
    tag = "analytics",
    params(
        ("eventType" = Option<String>, Query, description = "Filter by event type"),
        ("limit" = Option<u32>, Query, description = "Max events to return (default 100)")
    ),
    responses((status = 200, description = "Most recent events first", body = [StoredAnalyticsEvent])),
    security(("api_key" = []))
)]
pub async fn list_events(
    _auth: RequireApiKey,
    State(state): State<AnalyticsState>,
    Query(query): Query<EventsQuery>,
) -> Result<Json<Vec<StoredAnalyticsEvent>>, PlatformError> {
    let limit = query.limit.unwrap_or(100).clamp(1, 1000);
    let events = state.store.recent(query.event_type.as_deref(), limit).await?;
    Ok(Json(events))
}

pub fn analytics_router(state: AnalyticsState) -> Router {
    Router::new()
        .route("/track", post(track_event))
        .route("/track/batch", post(track_batch))
        .route("/events", get(list_events))
        .with_state(state)
}
