//! Service Layer
//!
//! Webhook dispatch, analytics buffering, and intake orchestration.

pub mod webhook;
pub mod analytics;
pub mod intake;

pub use webhook::{sign_body, WebhookDispatcher, WebhookDispatcherConfig};
pub use analytics::{AnalyticsBuffer, AnalyticsBufferConfig, BatchOutcome};
pub use intake::{ApplicationPage, IntakeService, IntakeStats, Notifier, TracingNotifier};
