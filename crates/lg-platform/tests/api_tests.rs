//! API Endpoint Tests
//!
//! Tests for:
//! - Health endpoint
//! - Public intake (submit, validation, duplicate handling, check-email)
//! - Admin authentication
//! - Paginated listing, review stamp, manual and bulk status overrides
//! - Analytics tracking and buffer backpressure
//! - Webhook test-fire and delivery logs
//! - Site config validation

use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use lg_common::{WebhookConfig, CONFIG_KEY_WEBHOOK};
use lg_platform::api::{platform_router, ApiKeyConfig};
use lg_platform::repository::{
    ConfigStore, MemoryAnalyticsStore, MemoryApplicationStore, MemoryConfigStore,
    MemoryDeliveryLogStore,
};
use lg_platform::service::{
    AnalyticsBuffer, AnalyticsBufferConfig, IntakeService, TracingNotifier, WebhookDispatcher,
    WebhookDispatcherConfig,
};

const API_KEY: &str = "test-api-key";

struct TestApp {
    router: Router,
    delivery_logs: Arc<MemoryDeliveryLogStore>,
    analytics_store: Arc<MemoryAnalyticsStore>,
    config_store: Arc<MemoryConfigStore>,
    buffer: Arc<AnalyticsBuffer>,
}

fn create_test_app(buffer_config: AnalyticsBufferConfig) -> TestApp {
    let config_store = Arc::new(MemoryConfigStore::new());
    let delivery_logs = Arc::new(MemoryDeliveryLogStore::new());
    let analytics_store = Arc::new(MemoryAnalyticsStore::new());
    let applications = Arc::new(MemoryApplicationStore::new());

    let dispatcher = WebhookDispatcher::new(
        config_store.clone(),
        delivery_logs.clone(),
        WebhookDispatcherConfig {
            backoff_delays: vec![Duration::from_millis(10), Duration::from_millis(10)],
            ..WebhookDispatcherConfig::default()
        },
    )
    .unwrap();

    let buffer = AnalyticsBuffer::new(analytics_store.clone(), buffer_config);
    let intake = Arc::new(IntakeService::new(
        applications,
        dispatcher.clone(),
        Arc::new(TracingNotifier),
    ));

    let router = platform_router(
        intake,
        buffer.clone(),
        analytics_store.clone(),
        dispatcher,
        delivery_logs.clone(),
        config_store.clone(),
        ApiKeyConfig::new(API_KEY),
    );

    TestApp {
        router,
        delivery_logs,
        analytics_store,
        config_store,
        buffer,
    }
}

fn default_test_app() -> TestApp {
    create_test_app(AnalyticsBufferConfig {
        batch_size: 100,
        capacity: 100,
        flush_interval: Duration::from_secs(3600),
    })
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

fn admin_request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("x-api-key", API_KEY);
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(&body).unwrap()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_json(body: Body) -> Value {
    let bytes = body.collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn submission(email: &str) -> Value {
    json!({
        "fullName": "Maria Santos",
        "mobileNumber": "+971500000000",
        "email": email,
        "currentCity": "Dubai",
        "nationality": "Filipino",
        "uaeResident": true,
        "caregivingExperience": ["Home health care"],
        "willingToWork": true,
        "willingToDrive": true,
        "acceptsTimeframe": true,
        "seeksPermanentRelocation": true,
        "understandsInfoOnly": true,
        "acceptsFinancialCosts": true,
        "attendanceMode": "IN_PERSON",
        "selectedSession": "2026-09-05",
        "acknowledgedAccuracy": true,
    })
}

// ============================================================================
// Health
// ============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = default_test_app();

    let response = app
        .router
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response.into_body()).await;
    assert_eq!(body["status"], "UP");
}

// ============================================================================
// Intake
// ============================================================================

#[tokio::test]
async fn test_submit_application_qualifies() {
    let app = default_test_app();

    let response = app
        .router
        .oneshot(json_request("POST", "/api/applications", submission("maria@example.com")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response.into_body()).await;
    assert_eq!(body["status"], "Qualified – Invite");
    assert_eq!(body["tags"], json!(["Attendance – In Person"]));
    assert_eq!(body["email"], "maria@example.com");
    assert_eq!(body["caregivingExperience"], json!(["Home health care"]));
}

#[tokio::test]
async fn test_submit_rejects_malformed_fields() {
    let app = default_test_app();

    // Mobile number without a leading country code
    let mut body = submission("maria@example.com");
    body["mobileNumber"] = json!("0500000000");
    let response = app
        .router
        .clone()
        .oneshot(json_request("POST", "/api/applications", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut body = submission("maria@example.com");
    body["email"] = json!("not-an-email");
    let response = app
        .router
        .clone()
        .oneshot(json_request("POST", "/api/applications", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut body = submission("maria@example.com");
    body["caregivingExperience"] = json!([]);
    let response = app
        .router
        .oneshot(json_request("POST", "/api/applications", body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_submit_disqualified_application() {
    let app = default_test_app();

    let mut body = submission("maria@example.com");
    body["willingToDrive"] = json!(false);

    let response = app
        .router
        .oneshot(json_request("POST", "/api/applications", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response.into_body()).await;
    assert_eq!(body["status"], "Not Suitable – Driving Requirement");
}

#[tokio::test]
async fn test_duplicate_email_conflicts() {
    let app = default_test_app();

    let first = app
        .router
        .clone()
        .oneshot(json_request("POST", "/api/applications", submission("maria@example.com")))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);

    let second = app
        .router
        .oneshot(json_request("POST", "/api/applications", submission("maria@example.com")))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_submit_requires_acknowledgment() {
    let app = default_test_app();

    let mut body = submission("maria@example.com");
    body["acknowledgedAccuracy"] = json!(false);

    let response = app
        .router
        .oneshot(json_request("POST", "/api/applications", body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_check_email() {
    let app = default_test_app();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::get("/api/applications/check-email?email=maria@example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(body_json(response.into_body()).await["exists"], false);

    app.router
        .clone()
        .oneshot(json_request("POST", "/api/applications", submission("maria@example.com")))
        .await
        .unwrap();

    let response = app
        .router
        .oneshot(
            Request::get("/api/applications/check-email?email=maria@example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(body_json(response.into_body()).await["exists"], true);
}

// ============================================================================
// Admin auth + review
// ============================================================================

#[tokio::test]
async fn test_admin_endpoints_require_api_key() {
    let app = default_test_app();

    let no_key = app
        .router
        .clone()
        .oneshot(Request::get("/api/applications").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(no_key.status(), StatusCode::UNAUTHORIZED);

    let wrong_key = app
        .router
        .oneshot(
            Request::get("/api/webhooks/logs")
                .header("x-api-key", "nope")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(wrong_key.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_manual_status_override() {
    let app = default_test_app();

    let created = app
        .router
        .clone()
        .oneshot(json_request("POST", "/api/applications", submission("maria@example.com")))
        .await
        .unwrap();
    let created = body_json(created.into_body()).await;
    let id = created["id"].as_str().unwrap();

    let response = app
        .router
        .clone()
        .oneshot(admin_request(
            "PATCH",
            &format!("/api/applications/{id}/status"),
            Some(json!({"status": "Not Suitable – Criteria", "note": "manual review"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response.into_body()).await;
    assert_eq!(body["status"], "Not Suitable – Criteria");
    // Tags keep the automated evaluation
    assert_eq!(body["tags"], created["tags"]);
    assert_eq!(body["reviewNotes"], "manual review");
}

#[tokio::test]
async fn test_list_applications_paginated() {
    let app = default_test_app();

    for email in ["a@example.com", "b@example.com", "c@example.com"] {
        app.router
            .clone()
            .oneshot(json_request("POST", "/api/applications", submission(email)))
            .await
            .unwrap();
    }

    let response = app
        .router
        .clone()
        .oneshot(admin_request("GET", "/api/applications?page=2&limit=2", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response.into_body()).await;
    assert_eq!(body["total"], 3);
    assert_eq!(body["page"], 2);
    assert_eq!(body["limit"], 2);
    assert_eq!(body["totalPages"], 2);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    // Search matches names and emails case-insensitively
    let response = app
        .router
        .clone()
        .oneshot(admin_request("GET", "/api/applications?search=B@EXAMPLE", None))
        .await
        .unwrap();
    let body = body_json(response.into_body()).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["data"][0]["email"], "b@example.com");

    let response = app
        .router
        .oneshot(admin_request("GET", "/api/applications?sortBy=sideways", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_review_stamps_without_changing_status() {
    let app = default_test_app();

    let created = app
        .router
        .clone()
        .oneshot(json_request("POST", "/api/applications", submission("maria@example.com")))
        .await
        .unwrap();
    let created = body_json(created.into_body()).await;
    let id = created["id"].as_str().unwrap();

    let response = app
        .router
        .clone()
        .oneshot(admin_request(
            "POST",
            &format!("/api/applications/{id}/review"),
            Some(json!({"reviewNotes": "call scheduled"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response.into_body()).await;
    assert_eq!(body["status"], created["status"]);
    assert_eq!(body["reviewNotes"], "call scheduled");
    assert!(!body["reviewedAt"].is_null());

    let missing = app
        .router
        .oneshot(admin_request(
            "POST",
            "/api/applications/missing/review",
            Some(json!({})),
        ))
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_bulk_status_update_skips_unknown_ids() {
    let app = default_test_app();

    let mut ids = Vec::new();
    for email in ["a@example.com", "b@example.com"] {
        let created = app
            .router
            .clone()
            .oneshot(json_request("POST", "/api/applications", submission(email)))
            .await
            .unwrap();
        let created = body_json(created.into_body()).await;
        ids.push(created["id"].as_str().unwrap().to_string());
    }
    ids.push("missing".to_string());

    let response = app
        .router
        .clone()
        .oneshot(admin_request(
            "PATCH",
            "/api/applications/bulk/status",
            Some(json!({"ids": ids, "status": "Contacted"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response.into_body()).await;
    assert_eq!(body["updated"], 2);

    let listed = app
        .router
        .oneshot(admin_request("GET", "/api/applications?status=Contacted", None))
        .await
        .unwrap();
    let listed = body_json(listed.into_body()).await;
    assert_eq!(listed["total"], 2);
}

#[tokio::test]
async fn test_stats_endpoint() {
    let app = default_test_app();

    app.router
        .clone()
        .oneshot(json_request("POST", "/api/applications", submission("a@example.com")))
        .await
        .unwrap();
    app.router
        .clone()
        .oneshot(json_request("POST", "/api/applications", submission("b@example.com")))
        .await
        .unwrap();

    let response = app
        .router
        .oneshot(admin_request("GET", "/api/applications/stats", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response.into_body()).await;
    assert_eq!(body["total"], 2);
    assert_eq!(body["byStatus"][0]["status"], "Qualified – Invite");
    assert_eq!(body["byStatus"][0]["count"], 2);
}

// ============================================================================
// Analytics
// ============================================================================

#[tokio::test]
async fn test_track_event_accepted() {
    let app = default_test_app();

    let response = app
        .router
        .oneshot(json_request(
            "POST",
            "/api/analytics/track",
            json!({"eventType": "cta_click", "label": "hero"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response.into_body()).await;
    assert_eq!(body["accepted"], true);
    assert_eq!(app.buffer.buffered(), 1);
}

#[tokio::test]
async fn test_track_batch_reports_drops_at_capacity() {
    let app = create_test_app(AnalyticsBufferConfig {
        batch_size: 100,
        capacity: 5,
        flush_interval: Duration::from_secs(3600),
    });

    let events: Vec<Value> = (0..8)
        .map(|i| json!({"eventType": "cta_click", "label": format!("e{i}")}))
        .collect();

    let response = app
        .router
        .oneshot(json_request(
            "POST",
            "/api/analytics/track/batch",
            json!({"events": events}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response.into_body()).await;
    assert_eq!(body["accepted"], 5);
    assert_eq!(body["dropped"], 3);
}

#[tokio::test]
async fn test_admin_lists_persisted_events() {
    let app = default_test_app();

    app.router
        .clone()
        .oneshot(json_request(
            "POST",
            "/api/analytics/track",
            json!({"eventType": "cta_click", "label": "hero", "sessionId": "s1"}),
        ))
        .await
        .unwrap();
    app.buffer.flush().await;
    assert_eq!(app.analytics_store.persisted_count(), 1);

    let response = app
        .router
        .oneshot(admin_request("GET", "/api/analytics/events?eventType=cta_click", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response.into_body()).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["label"], "hero");
}

// ============================================================================
// Webhooks
// ============================================================================

#[tokio::test]
async fn test_fire_test_webhook_bypasses_allow_list() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let app = default_test_app();
    let config = WebhookConfig {
        url: format!("{}/hook", server.uri()),
        secret: "s3cret".to_string(),
        enabled: true,
        // Empty allow-list: only the skip flag lets the test event through
        enabled_events: vec![],
    };
    app.config_store
        .upsert(CONFIG_KEY_WEBHOOK, serde_json::to_value(config).unwrap())
        .await
        .unwrap();

    let response = app
        .router
        .clone()
        .oneshot(admin_request("POST", "/api/webhooks/test", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Delivery is fire-and-forget; the log is the only completion signal
    for _ in 0..100 {
        if !app.delivery_logs.records().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let records = app.delivery_logs.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].event, "webhook.test");
    assert!(records[0].success);

    let logs_response = app
        .router
        .oneshot(admin_request("GET", "/api/webhooks/logs", None))
        .await
        .unwrap();
    let body = body_json(logs_response.into_body()).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["event"], "webhook.test");
}

#[tokio::test]
async fn test_application_created_event_delivered() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let app = default_test_app();
    let config = WebhookConfig {
        url: format!("{}/hook", server.uri()),
        secret: "s3cret".to_string(),
        enabled: true,
        enabled_events: vec!["application.created".to_string()],
    };
    app.config_store
        .upsert(CONFIG_KEY_WEBHOOK, serde_json::to_value(config).unwrap())
        .await
        .unwrap();

    app.router
        .oneshot(json_request("POST", "/api/applications", submission("maria@example.com")))
        .await
        .unwrap();

    for _ in 0..100 {
        if !app.delivery_logs.records().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let records = app.delivery_logs.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].event, "application.created");
    assert!(records[0].success);
    assert_eq!(records[0].payload["email"], "maria@example.com");
}

#[tokio::test]
async fn test_application_reviewed_event_delivered() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/hook"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let app = default_test_app();
    let config = WebhookConfig {
        url: format!("{}/hook", server.uri()),
        secret: "s3cret".to_string(),
        enabled: true,
        enabled_events: vec!["application.reviewed".to_string()],
    };
    app.config_store
        .upsert(CONFIG_KEY_WEBHOOK, serde_json::to_value(config).unwrap())
        .await
        .unwrap();

    let created = app
        .router
        .clone()
        .oneshot(json_request("POST", "/api/applications", submission("maria@example.com")))
        .await
        .unwrap();
    let created = body_json(created.into_body()).await;
    let id = created["id"].as_str().unwrap();

    app.router
        .clone()
        .oneshot(admin_request(
            "POST",
            &format!("/api/applications/{id}/review"),
            Some(json!({"reviewNotes": "looks strong"})),
        ))
        .await
        .unwrap();

    // application.created is filtered out by the allow-list, only the review lands
    for _ in 0..100 {
        if !app.delivery_logs.records().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    let records = app.delivery_logs.records();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].event, "application.reviewed");
    assert!(records[0].success);
    assert_eq!(records[0].payload["reviewNotes"], "looks strong");
}

// ============================================================================
// Site config
// ============================================================================

#[tokio::test]
async fn test_webhook_config_upsert_validation() {
    let app = default_test_app();

    let invalid = app
        .router
        .clone()
        .oneshot(admin_request(
            "PUT",
            "/api/config/webhook_config",
            Some(json!({"value": {
                "url": "http://insecure.example.com",
                "secret": "s3cret",
                "enabled": true,
                "enabledEvents": [],
            }})),
        ))
        .await
        .unwrap();
    assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

    let valid = app
        .router
        .clone()
        .oneshot(admin_request(
            "PUT",
            "/api/config/webhook_config",
            Some(json!({"value": {
                "url": "https://example.com/hook",
                "secret": "s3cret",
                "enabled": true,
                "enabledEvents": ["application.created"],
            }})),
        ))
        .await
        .unwrap();
    assert_eq!(valid.status(), StatusCode::OK);

    let fetched = app
        .router
        .oneshot(admin_request("GET", "/api/config/webhook_config", None))
        .await
        .unwrap();
    assert_eq!(fetched.status(), StatusCode::OK);
    let body = body_json(fetched.into_body()).await;
    assert_eq!(body["value"]["url"], "https://example.com/hook");
}

#[tokio::test]
async fn test_unknown_config_key_not_found() {
    let app = default_test_app();

    let response = app
        .router
        .oneshot(admin_request("GET", "/api/config/missing_key", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
