//! Application Entity
//!
//! A screening-form submission together with its automated qualification
//! outcome. `status` may later be overwritten by a human reviewer; `tags`
//! always remain the original automated evaluation for audit purposes.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use lg_common::AttendanceMode;

use crate::domain::qualification::QualificationResult;

/// The raw answers submitted through the screening form.
/// Immutable once evaluated.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSubmission {
    pub full_name: String,
    pub mobile_number: String,
    pub email: String,
    pub current_city: String,
    pub nationality: String,
    pub uae_resident: bool,
    /// Experience areas, e.g. "Home health care". Never empty.
    pub caregiving_experience: Vec<String>,
    pub willing_to_work: bool,
    pub willing_to_drive: bool,
    pub accepts_timeframe: bool,
    pub seeks_permanent_relocation: bool,
    pub understands_info_only: bool,
    pub accepts_financial_costs: bool,
    pub attendance_mode: AttendanceMode,
    pub selected_session: String,
    pub acknowledged_accuracy: bool,
}

/// Persisted application record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Application {
    pub id: String,

    pub full_name: String,
    pub mobile_number: String,
    pub email: String,
    pub current_city: String,
    pub nationality: String,
    pub uae_resident: bool,
    pub caregiving_experience: Vec<String>,
    pub willing_to_work: bool,
    pub willing_to_drive: bool,
    pub accepts_timeframe: bool,
    pub seeks_permanent_relocation: bool,
    pub understands_info_only: bool,
    pub accepts_financial_costs: bool,
    pub attendance_mode: AttendanceMode,
    pub selected_session: String,
    pub acknowledged_accuracy: bool,

    /// Current status: the qualified sentinel, the first disqualifying tag,
    /// or whatever a reviewer set manually
    pub status: String,

    /// Ordered, deduplicated tags from the automated evaluation
    pub tags: Vec<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

impl Application {
    /// Build a new record from a submission and its qualification result.
    /// Emails are stored lowercased so the uniqueness check is case-insensitive.
    pub fn from_submission(submission: ApplicationSubmission, result: QualificationResult) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            full_name: submission.full_name,
            mobile_number: submission.mobile_number,
            email: submission.email.to_lowercase(),
            current_city: submission.current_city,
            nationality: submission.nationality,
            uae_resident: submission.uae_resident,
            caregiving_experience: submission.caregiving_experience,
            willing_to_work: submission.willing_to_work,
            willing_to_drive: submission.willing_to_drive,
            accepts_timeframe: submission.accepts_timeframe,
            seeks_permanent_relocation: submission.seeks_permanent_relocation,
            understands_info_only: submission.understands_info_only,
            accepts_financial_costs: submission.accepts_financial_costs,
            attendance_mode: submission.attendance_mode,
            selected_session: submission.selected_session,
            acknowledged_accuracy: submission.acknowledged_accuracy,
            status: result.status,
            tags: result.tags,
            review_notes: None,
            reviewed_at: None,
            created_at: Utc::now(),
        }
    }
}
