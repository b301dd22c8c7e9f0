//! Webhook Event Dispatcher
//!
//! Delivers lifecycle events to the configured external endpoint:
//! - Re-reads the live webhook config per fired event (it can change between events)
//! - Signs the canonical JSON body with HMAC-SHA256
//! - Bounded retries with a short, fixed backoff schedule
//! - Appends exactly one delivery log record per non-discarded event
//!
//! Delivery runs on an independent task the caller never awaits; the only
//! way to observe the outcome is the delivery log.

use std::sync::Arc;
use std::time::Duration;
use chrono::{SecondsFormat, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use lg_common::{DeliveryLogRecord, WebhookConfig, CONFIG_KEY_WEBHOOK, RESPONSE_EXCERPT_MAX};

use crate::error::Result;
use crate::repository::{ConfigStore, DeliveryLogStore};

type HmacSha256 = Hmac<Sha256>;

/// Dispatcher tuning. The defaults are the production schedule: three
/// attempts, ten-second attempt timeout, 1s then 4s between attempts.
#[derive(Debug, Clone)]
pub struct WebhookDispatcherConfig {
    pub max_attempts: u32,
    /// Per-attempt request timeout
    pub attempt_timeout: Duration,
    pub connect_timeout: Duration,
    /// Delay after attempt N is `backoff_delays[N-1]`; no delay after the last attempt
    pub backoff_delays: Vec<Duration>,
    pub response_excerpt_max: usize,
}

impl Default for WebhookDispatcherConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            attempt_timeout: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(10),
            backoff_delays: vec![Duration::from_secs(1), Duration::from_secs(4)],
            response_excerpt_max: RESPONSE_EXCERPT_MAX,
        }
    }
}

/// Hex-encoded HMAC-SHA256 of the exact serialized body
pub fn sign_body(secret: &str, body: &str) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(body.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Event dispatcher with fire-and-forget delivery
#[derive(Clone)]
pub struct WebhookDispatcher {
    config_store: Arc<dyn ConfigStore>,
    log_store: Arc<dyn DeliveryLogStore>,
    client: reqwest::Client,
    config: WebhookDispatcherConfig,
}

impl WebhookDispatcher {
    pub fn new(
        config_store: Arc<dyn ConfigStore>,
        log_store: Arc<dyn DeliveryLogStore>,
        config: WebhookDispatcherConfig,
    ) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.attempt_timeout)
            .build()?;

        Ok(Self {
            config_store,
            log_store,
            client,
            config,
        })
    }

    /// Fire an event without blocking the caller. The config check, the
    /// delivery attempts and the log write all happen on a spawned task;
    /// the caller holds no handle to it and its failures never propagate.
    pub fn fire_event(&self, event: impl Into<String>, payload: serde_json::Value, skip_allow_list: bool) {
        let dispatcher = self.clone();
        let event = event.into();

        tokio::spawn(async move {
            if let Err(e) = dispatcher.deliver(&event, payload, skip_allow_list).await {
                error!(event, error = %e, "Webhook delivery task failed");
            }
        });
    }

    /// Run one delivery attempt sequence for an event. Discards silently
    /// when the webhook is disabled, unconfigured, or the event type is not
    /// allow-listed; otherwise appends exactly one log record.
    async fn deliver(&self, event: &str, payload: serde_json::Value, skip_allow_list: bool) -> Result<()> {
        let config = match self.load_config().await? {
            Some(config) if config.enabled => config,
            _ => {
                debug!(event, "Webhook disabled or unconfigured, discarding event");
                return Ok(());
            }
        };

        if !skip_allow_list && !config.enabled_events.iter().any(|e| e == event) {
            debug!(event, "Event type not allow-listed, discarding event");
            return Ok(());
        }

        let body = serde_json::to_string(&serde_json::json!({
            "event": event,
            "data": payload.clone(),
            "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }))?;
        let signature = sign_body(&config.secret, &body);

        let mut last_status: u16 = 0;
        let mut last_response: Option<String> = None;
        let mut success = false;
        let mut attempts_used = 0;

        for attempt in 1..=self.config.max_attempts {
            attempts_used = attempt;

            match self
                .client
                .post(&config.url)
                .header("Content-Type", "application/json")
                .header("X-Webhook-Signature", &signature)
                .header("X-Webhook-Event", event)
                .body(body.clone())
                .send()
                .await
            {
                Ok(response) => {
                    let status = response.status();
                    last_status = status.as_u16();
                    let text = response.text().await.unwrap_or_default();
                    last_response = Some(self.excerpt(&text));
                    success = status.is_success();

                    if success {
                        info!(event, attempt, "Webhook delivered");
                        break;
                    }
                    warn!(event, attempt, status = last_status, "Webhook attempt failed");
                }
                Err(e) => {
                    // Transport failure: DNS, connection refused, timeout
                    last_status = 0;
                    last_response = Some(self.excerpt(&e.to_string()));
                    warn!(event, attempt, error = %e, "Webhook attempt errored");
                }
            }

            if attempt < self.config.max_attempts {
                if let Some(delay) = self.config.backoff_delays.get(attempt as usize - 1) {
                    sleep(*delay).await;
                }
            }
        }

        let record = DeliveryLogRecord {
            id: Uuid::new_v4().to_string(),
            event: event.to_string(),
            payload,
            status: last_status,
            response: last_response,
            attempts: attempts_used,
            success,
            created_at: Utc::now(),
        };

        // A failed log write must not re-trigger delivery
        if let Err(e) = self.log_store.append(record).await {
            error!(event, error = %e, "Failed to append webhook delivery log");
        }
        Ok(())
    }

    async fn load_config(&self) -> Result<Option<WebhookConfig>> {
        let value = match self.config_store.get_value(CONFIG_KEY_WEBHOOK).await? {
            Some(value) => value,
            None => return Ok(None),
        };

        match serde_json::from_value::<WebhookConfig>(value) {
            Ok(config) => Ok(Some(config)),
            Err(e) => {
                warn!(error = %e, "Ignoring malformed webhook config");
                Ok(None)
            }
        }
    }

    fn excerpt(&self, text: &str) -> String {
        text.chars().take(self.config.response_excerpt_max).collect()
    }
}
