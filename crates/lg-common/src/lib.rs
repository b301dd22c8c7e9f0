use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use utoipa::ToSchema;

// ============================================================================
// Notification Event Types
// ============================================================================

/// A lifecycle event produced by a business operation and consumed by the
/// webhook dispatcher. Created at the moment of the state change; delivery
/// may be attempted multiple times but the event itself is dispatched once.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationEvent {
    /// Dot-namespaced event type, e.g. `application.created`
    pub event_type: String,
    pub payload: serde_json::Value,
    pub occurred_at: DateTime<Utc>,
}

impl NotificationEvent {
    pub fn new(event_type: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
            occurred_at: Utc::now(),
        }
    }
}

/// Well-known event types fired by the platform
pub mod events {
    pub const APPLICATION_CREATED: &str = "application.created";
    pub const APPLICATION_STATUS_CHANGED: &str = "application.status_changed";
    pub const APPLICATION_REVIEWED: &str = "application.reviewed";
    pub const WEBHOOK_TEST: &str = "webhook.test";
}

// ============================================================================
// Webhook Configuration
// ============================================================================

/// Site-config key under which the webhook configuration is stored
pub const CONFIG_KEY_WEBHOOK: &str = "webhook_config";

/// Webhook endpoint configuration, stored as a site-config value and
/// externally mutable at any time. The dispatcher re-reads it per fired
/// event rather than caching it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WebhookConfig {
    /// Delivery endpoint (https only)
    pub url: String,
    /// Shared secret for HMAC-SHA256 signatures
    pub secret: String,
    pub enabled: bool,
    /// Allow-list of event types this endpoint has opted into
    #[serde(default)]
    pub enabled_events: Vec<String>,
}

// ============================================================================
// Delivery Log Types
// ============================================================================

/// Maximum number of characters of an endpoint response (or transport error
/// message) retained on a delivery log record
pub const RESPONSE_EXCERPT_MAX: usize = 500;

/// Append-only record summarizing one delivery attempt sequence, written
/// exactly once after the retry loop terminates. Never updated.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryLogRecord {
    pub id: String,
    pub event: String,
    /// Snapshot of the payload as it was sent
    pub payload: serde_json::Value,
    /// Last observed HTTP status; 0 means a transport failure
    pub status: u16,
    /// Truncated response body or transport error message
    pub response: Option<String>,
    /// Number of HTTP attempts actually made
    pub attempts: u32,
    pub success: bool,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Analytics Types
// ============================================================================

/// A telemetry event accepted into the in-memory analytics buffer
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsEvent {
    pub event_type: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// An analytics event after a batch flush has persisted it
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoredAnalyticsEvent {
    pub id: String,
    pub event_type: String,
    pub label: String,
    pub metadata: Option<serde_json::Value>,
    pub session_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Qualification Types
// ============================================================================

/// How an applicant intends to attend the info session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceMode {
    InPerson,
    Online,
}

impl AttendanceMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceMode::InPerson => "IN_PERSON",
            AttendanceMode::Online => "ONLINE",
        }
    }
}

impl std::str::FromStr for AttendanceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IN_PERSON" => Ok(AttendanceMode::InPerson),
            "ONLINE" => Ok(AttendanceMode::Online),
            other => Err(format!("Unknown attendance mode: {other}")),
        }
    }
}

/// Canonical status and tag strings produced by the qualification rules.
/// Disqualifying tags can become the application status; attendance tags
/// are informational only.
pub mod tags {
    pub const QUALIFIED: &str = "Qualified – Invite";
    pub const NOT_SUITABLE_CRITERIA: &str = "Not Suitable – Criteria";
    pub const NOT_SUITABLE_DRIVING: &str = "Not Suitable – Driving Requirement";
    pub const NOT_SUITABLE_EXPECTATIONS: &str = "Not Suitable – Expectations";
    pub const NOT_SUITABLE_FINANCIAL: &str = "Not Suitable – Financial Expectations";
    pub const ATTENDANCE_IN_PERSON: &str = "Attendance – In Person";
    pub const ATTENDANCE_ONLINE: &str = "Attendance – Online";

    /// Reference nationality the criteria rule matches against
    pub const REFERENCE_NATIONALITY: &str = "filipino";
}
