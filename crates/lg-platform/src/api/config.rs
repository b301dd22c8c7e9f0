//! Site Config Admin API
//!
//! Key/value JSON configuration. The webhook config document gets shape
//! validation on write; everything else is stored as-is.

use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use lg_common::{WebhookConfig, CONFIG_KEY_WEBHOOK};

use crate::api::common::{ApiError, SuccessResponse};
use crate::api::middleware::RequireApiKey;
use crate::error::PlatformError;
use crate::repository::ConfigStore;

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpsertConfigRequest {
    /// Configuration value (arbitrary JSON)
    pub value: serde_json::Value,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ConfigResponse {
    pub key: String,
    pub value: serde_json::Value,
}

/// Config service state
#[derive(Clone)]
pub struct ConfigState {
    pub store: Arc<dyn ConfigStore>,
}

fn validate_webhook_config(value: &serde_json::Value) -> Result<(), PlatformError> {
    let config: WebhookConfig = serde_json::from_value(value.clone())
        .map_err(|e| PlatformError::validation(format!("Invalid webhook config: {e}")))?;

    if !config.url.starts_with("https://") {
        return Err(PlatformError::validation("Webhook URL must use https"));
    }
    if config.enabled && config.secret.trim().is_empty() {
        return Err(PlatformError::validation("Webhook secret must not be empty"));
    }
    Ok(())
}

/// Fetch one site config value
#[utoipa::path(
    get,
    path = "/api/config/{key}",
    tag = "config",
    params(("key" = String, Path, description = "Config key")),
    responses(
        (status = 200, description = "The stored value", body = ConfigResponse),
        (status = 404, description = "Unknown key", body = ApiError)
    ),
    security(("api_key" = []))
)]
pub async fn get_config(
    _auth: RequireApiKey,
    State(state): State<ConfigState>,
    Path(key): Path<String>,
) -> Result<Json<ConfigResponse>, PlatformError> {
    let value = state
        .store
        .get_value(&key)
        .await?
        .ok_or_else(|| PlatformError::not_found("SiteConfig", &key))?;
    Ok(Json(ConfigResponse { key, value }))
}

/// Create or replace one site config value
#[utoipa::path(
    put,
    path = "/api/config/{key}",
    tag = "config",
    params(("key" = String, Path, description = "Config key")),
    request_body = UpsertConfigRequest,
    responses(
        (status = 200, description = "Value stored", body = SuccessResponse),
        (status = 400, description = "Validation failure", body = ApiError)
    ),
    security(("api_key" = []))
)]
pub async fn upsert_config(
    _auth: RequireApiKey,
    State(state): State<ConfigState>,
    Path(key): Path<String>,
    Json(req): Json<UpsertConfigRequest>,
) -> Result<Json<SuccessResponse>, PlatformError> {
    if key == CONFIG_KEY_WEBHOOK {
        validate_webhook_config(&req.value)?;
    }

    state.store.upsert(&key, req.value).await?;
    Ok(Json(SuccessResponse::ok()))
}

pub fn config_router(state: ConfigState) -> Router {
    Router::new()
        .route("/:key", get(get_config).put(upsert_config))
        .with_state(state)
}
