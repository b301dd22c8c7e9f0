//! Applications API
//!
//! Public intake endpoints (submit, check-email) and admin review
//! endpoints (list, get, status override, review, stats).

use axum::extract::{Path, Query, State};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use lg_common::AttendanceMode;

use crate::api::common::ApiError;
use crate::api::middleware::RequireApiKey;
use crate::domain::{Application, ApplicationSubmission};
use crate::error::PlatformError;
use crate::repository::{ApplicationFilter, ApplicationSortField, SortOrder};
use crate::service::{IntakeService, IntakeStats};

const MAX_NAME_LEN: usize = 255;
const MAX_EMAIL_LEN: usize = 320;
const MAX_CITY_LEN: usize = 255;
const MAX_NATIONALITY_LEN: usize = 100;
const MAX_SESSION_LEN: usize = 255;
const MAX_EXPERIENCE_LEN: usize = 255;
const MAX_NOTE_LEN: usize = 1000;
const MAX_BULK_IDS: usize = 100;

/// Screening-form submission request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitApplicationRequest {
    pub full_name: String,
    pub mobile_number: String,
    pub email: String,
    pub current_city: String,
    pub nationality: String,
    pub uae_resident: bool,
    /// Experience areas, at least one required
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

impl From<SubmitApplicationRequest> for ApplicationSubmission {
    fn from(r: SubmitApplicationRequest) -> Self {
        Self {
            full_name: r.full_name,
            mobile_number: r.mobile_number,
            email: r.email,
            current_city: r.current_city,
            nationality: r.nationality,
            uae_resident: r.uae_resident,
            caregiving_experience: r.caregiving_experience,
            willing_to_work: r.willing_to_work,
            willing_to_drive: r.willing_to_drive,
            accepts_timeframe: r.accepts_timeframe,
            seeks_permanent_relocation: r.seeks_permanent_relocation,
            understands_info_only: r.understands_info_only,
            accepts_financial_costs: r.accepts_financial_costs,
            attendance_mode: r.attendance_mode,
            selected_session: r.selected_session,
            acknowledged_accuracy: r.acknowledged_accuracy,
        }
    }
}

/// Application response DTO
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationResponse {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub mobile_number: String,
    pub current_city: String,
    pub nationality: String,
    pub caregiving_experience: Vec<String>,
    pub attendance_mode: AttendanceMode,
    pub selected_session: String,
    pub status: String,
    pub tags: Vec<String>,
    pub review_notes: Option<String>,
    pub reviewed_at: Option<String>,
    pub created_at: String,
}

impl From<Application> for ApplicationResponse {
    fn from(a: Application) -> Self {
        Self {
            id: a.id,
            full_name: a.full_name,
            email: a.email,
            mobile_number: a.mobile_number,
            current_city: a.current_city,
            nationality: a.nationality,
            caregiving_experience: a.caregiving_experience,
            attendance_mode: a.attendance_mode,
            selected_session: a.selected_session,
            status: a.status,
            tags: a.tags,
            review_notes: a.review_notes,
            reviewed_at: a.reviewed_at.map(|t| t.to_rfc3339()),
            created_at: a.created_at.to_rfc3339(),
        }
    }
}

/// One page of the admin review table
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationListResponse {
    pub data: Vec<ApplicationResponse>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: i64,
}

/// Manual status override request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub status: String,
    pub note: Option<String>,
}

/// Review stamp request. The note is optional and replaces any previous one.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReviewApplicationRequest {
    pub review_notes: Option<String>,
}

/// Bulk status override request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkUpdateStatusRequest {
    pub ids: Vec<String>,
    pub status: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BulkUpdateResponse {
    pub updated: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckEmailQuery {
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckEmailResponse {
    pub exists: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub attendance_mode: Option<AttendanceMode>,
    pub selected_session: Option<String>,
    pub tag: Option<String>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
}

fn validate_submission(req: &SubmitApplicationRequest) -> Result<(), PlatformError> {
    let name = req.full_name.trim();
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(PlatformError::validation("Full name is required (max 255 characters)"));
    }
    if !is_valid_mobile(&req.mobile_number) {
        return Err(PlatformError::validation(
            "Mobile number must include a country code (e.g. +971XXXXXXXXX)",
        ));
    }
    if !is_valid_email(&req.email) || req.email.len() > MAX_EMAIL_LEN {
        return Err(PlatformError::validation("A valid email address is required"));
    }
    let city = req.current_city.trim();
    if city.is_empty() || city.len() > MAX_CITY_LEN {
        return Err(PlatformError::validation("Current city is required (max 255 characters)"));
    }
    let nationality = req.nationality.trim();
    if nationality.is_empty() || nationality.len() > MAX_NATIONALITY_LEN {
        return Err(PlatformError::validation("Nationality is required (max 100 characters)"));
    }
    if req.caregiving_experience.is_empty()
        || req
            .caregiving_experience
            .iter()
            .any(|e| e.trim().is_empty() || e.len() > MAX_EXPERIENCE_LEN)
    {
        return Err(PlatformError::validation(
            "At least one caregiving experience area is required",
        ));
    }
    let session = req.selected_session.trim();
    if session.is_empty() || session.len() > MAX_SESSION_LEN {
        return Err(PlatformError::validation("Selected session is required (max 255 characters)"));
    }
    if !req.acknowledged_accuracy {
        return Err(PlatformError::validation(
            "You must acknowledge the accuracy of your information",
        ));
    }
    Ok(())
}

/// Country code required: `+` followed by 7 to 20 digits, spaces, dashes,
/// parentheses, or dots.
fn is_valid_mobile(mobile: &str) -> bool {
    let Some(rest) = mobile.strip_prefix('+') else {
        return false;
    };
    (7..=20).contains(&rest.len())
        && rest
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, ' ' | '-' | '(' | ')' | '.'))
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && domain.contains('.')
        && !email.chars().any(char::is_whitespace)
}

fn parse_query_date(value: &str, field: &str) -> Result<DateTime<Utc>, PlatformError> {
    DateTime::parse_from_rfc3339(value)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|_| PlatformError::validation(format!("{field} must be an RFC 3339 timestamp")))
}

fn parse_sort(query: &ListQuery) -> Result<(ApplicationSortField, SortOrder), PlatformError> {
    let sort = match query.sort_by.as_deref() {
        None | Some("createdAt") => ApplicationSortField::CreatedAt,
        Some("fullName") => ApplicationSortField::FullName,
        Some("status") => ApplicationSortField::Status,
        Some(other) => {
            return Err(PlatformError::validation(format!("Unknown sortBy field: {other}")))
        }
    };
    let order = match query.sort_order.as_deref() {
        None | Some("desc") => SortOrder::Desc,
        Some("asc") => SortOrder::Asc,
        Some(other) => {
            return Err(PlatformError::validation(format!("Unknown sortOrder: {other}")))
        }
    };
    Ok((sort, order))
}

/// Applications service state
#[derive(Clone)]
pub struct ApplicationsState {
    pub intake: Arc<IntakeService>,
}

/// Submit a screening-form application
#[utoipa::path(
    post,
    path = "/api/applications",
    tag = "applications",
    request_body = SubmitApplicationRequest,
    responses(
        (status = 200, description = "Application accepted and evaluated", body = ApplicationResponse),
        (status = 400, description = "Validation failure", body = ApiError),
        (status = 409, description = "Email already registered", body = ApiError)
    )
)]
pub async fn submit_application(
    State(state): State<ApplicationsState>,
    Json(req): Json<SubmitApplicationRequest>,
) -> Result<Json<ApplicationResponse>, PlatformError> {
    validate_submission(&req)?;

    let application = state.intake.create(req.into()).await?;
    Ok(Json(application.into()))
}

/// Check whether an email has already applied
#[utoipa::path(
    get,
    path = "/api/applications/check-email",
    tag = "applications",
    params(("email" = String, Query, description = "Email address to check")),
    responses((status = 200, description = "Existence flag", body = CheckEmailResponse))
)]
pub async fn check_email(
    State(state): State<ApplicationsState>,
    Query(query): Query<CheckEmailQuery>,
) -> Result<Json<CheckEmailResponse>, PlatformError> {
    let exists = state.intake.check_email(&query.email).await?;
    Ok(Json(CheckEmailResponse { exists }))
}

/// List applications with filters and pagination
#[utoipa::path(
    get,
    path = "/api/applications",
    tag = "applications",
    params(
        ("page" = Option<u32>, Query, description = "Page number (1-based)"),
        ("limit" = Option<u32>, Query, description = "Items per page (max 100)"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("search" = Option<String>, Query, description = "Match name, email, or mobile number"),
        ("attendanceMode" = Option<String>, Query, description = "IN_PERSON or ONLINE"),
        ("selectedSession" = Option<String>, Query, description = "Filter by session"),
        ("tag" = Option<String>, Query, description = "Filter by qualification tag"),
        ("dateFrom" = Option<String>, Query, description = "Created-at lower bound (RFC 3339)"),
        ("dateTo" = Option<String>, Query, description = "Created-at upper bound (RFC 3339)"),
        ("sortBy" = Option<String>, Query, description = "createdAt, fullName, or status"),
        ("sortOrder" = Option<String>, Query, description = "asc or desc")
    ),
    responses((status = 200, description = "One page of applications", body = ApplicationListResponse)),
    security(("api_key" = []))
)]
pub async fn list_applications(
    _auth: RequireApiKey,
    State(state): State<ApplicationsState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApplicationListResponse>, PlatformError> {
    let page = query.page.unwrap_or(1).max(1);
    let limit = query.limit.unwrap_or(20).clamp(1, 100);
    let (sort, order) = parse_sort(&query)?;

    let filter = ApplicationFilter {
        status: query.status,
        search: query.search,
        attendance_mode: query.attendance_mode,
        selected_session: query.selected_session,
        tag: query.tag,
        date_from: query
            .date_from
            .as_deref()
            .map(|d| parse_query_date(d, "dateFrom"))
            .transpose()?,
        date_to: query
            .date_to
            .as_deref()
            .map(|d| parse_query_date(d, "dateTo"))
            .transpose()?,
    };

    let result = state.intake.list(&filter, sort, order, page, limit).await?;
    Ok(Json(ApplicationListResponse {
        data: result.data.into_iter().map(Into::into).collect(),
        total: result.total,
        page: result.page,
        limit: result.limit,
        total_pages: result.total_pages,
    }))
}

/// Get one application
#[utoipa::path(
    get,
    path = "/api/applications/{id}",
    tag = "applications",
    params(("id" = String, Path, description = "Application id")),
    responses(
        (status = 200, description = "The application", body = ApplicationResponse),
        (status = 404, description = "Unknown id", body = ApiError)
    ),
    security(("api_key" = []))
)]
pub async fn get_application(
    _auth: RequireApiKey,
    State(state): State<ApplicationsState>,
    Path(id): Path<String>,
) -> Result<Json<ApplicationResponse>, PlatformError> {
    let application = state.intake.get(&id).await?;
    Ok(Json(application.into()))
}

/// Manually override an application's status
#[utoipa::path(
    patch,
    path = "/api/applications/{id}/status",
    tag = "applications",
    params(("id" = String, Path, description = "Application id")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Updated application", body = ApplicationResponse),
        (status = 404, description = "Unknown id", body = ApiError)
    ),
    security(("api_key" = []))
)]
pub async fn update_status(
    _auth: RequireApiKey,
    State(state): State<ApplicationsState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<ApplicationResponse>, PlatformError> {
    if req.status.trim().is_empty() {
        return Err(PlatformError::validation("Status must not be empty"));
    }
    if req.note.as_ref().is_some_and(|n| n.len() > MAX_NOTE_LEN) {
        return Err(PlatformError::validation("Note must be at most 1000 characters"));
    }

    let application = state
        .intake
        .update_status(&id, &req.status, req.note.as_deref())
        .await?;
    Ok(Json(application.into()))
}

/// Mark an application as reviewed
#[utoipa::path(
    post,
    path = "/api/applications/{id}/review",
    tag = "applications",
    params(("id" = String, Path, description = "Application id")),
    request_body = ReviewApplicationRequest,
    responses(
        (status = 200, description = "Reviewed application", body = ApplicationResponse),
        (status = 404, description = "Unknown id", body = ApiError)
    ),
    security(("api_key" = []))
)]
pub async fn review_application(
    _auth: RequireApiKey,
    State(state): State<ApplicationsState>,
    Path(id): Path<String>,
    Json(req): Json<ReviewApplicationRequest>,
) -> Result<Json<ApplicationResponse>, PlatformError> {
    if req
        .review_notes
        .as_ref()
        .is_some_and(|n| n.len() > MAX_NOTE_LEN)
    {
        return Err(PlatformError::validation("Review notes must be at most 1000 characters"));
    }

    let application = state
        .intake
        .review(&id, req.review_notes.as_deref())
        .await?;
    Ok(Json(application.into()))
}

/// Apply one status to many applications
#[utoipa::path(
    patch,
    path = "/api/applications/bulk/status",
    tag = "applications",
    request_body = BulkUpdateStatusRequest,
    responses((status = 200, description = "Count of updated records", body = BulkUpdateResponse)),
    security(("api_key" = []))
)]
pub async fn bulk_update_status(
    _auth: RequireApiKey,
    State(state): State<ApplicationsState>,
    Json(req): Json<BulkUpdateStatusRequest>,
) -> Result<Json<BulkUpdateResponse>, PlatformError> {
    if req.ids.is_empty() || req.ids.len() > MAX_BULK_IDS {
        return Err(PlatformError::validation("Between 1 and 100 ids are required"));
    }
    if req.status.trim().is_empty() {
        return Err(PlatformError::validation("Status must not be empty"));
    }

    let updated = state.intake.bulk_update_status(&req.ids, &req.status).await?;
    Ok(Json(BulkUpdateResponse { updated }))
}

/// Intake statistics
#[utoipa::path(
    get,
    path = "/api/applications/stats",
    tag = "applications",
    responses((status = 200, description = "Aggregate counts", body = IntakeStats)),
    security(("api_key" = []))
)]
pub async fn get_stats(
    _auth: RequireApiKey,
    State(state): State<ApplicationsState>,
) -> Result<Json<IntakeStats>, PlatformError> {
    Ok(Json(state.intake.stats().await?))
}

pub fn applications_router(state: ApplicationsState) -> Router {
    Router::new()
        .route("/", post(submit_application).get(list_applications))
        .route("/check-email", get(check_email))
        .route("/stats", get(get_stats))
        .route("/bulk/status", patch(bulk_update_status))
        .route("/:id", get(get_application))
        .route("/:id/status", patch(update_status))
        .route("/:id/review", post(review_application))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_request() -> SubmitApplicationRequest {
        SubmitApplicationRequest {
            full_name: "Maria Santos".to_string(),
            mobile_number: "+971 50 000 0000".to_string(),
            email: "maria@example.com".to_string(),
            current_city: "Dubai".to_string(),
            nationality: "Filipino".to_string(),
            uae_resident: true,
            caregiving_experience: vec!["Home health care".to_string()],
            willing_to_work: true,
            willing_to_drive: true,
            accepts_timeframe: true,
            seeks_permanent_relocation: true,
            understands_info_only: true,
            accepts_financial_costs: true,
            attendance_mode: AttendanceMode::InPerson,
            selected_session: "2026-09-05".to_string(),
            acknowledged_accuracy: true,
        }
    }

    #[test]
    fn test_valid_submission_passes() {
        assert!(validate_submission(&valid_request()).is_ok());
    }

    #[test]
    fn test_mobile_number_requires_country_code() {
        let mut req = valid_request();
        req.mobile_number = "0501234567".to_string();
        assert!(validate_submission(&req).is_err());

        req.mobile_number = "+9715x0000000".to_string();
        assert!(validate_submission(&req).is_err());

        // Too short after the plus
        req.mobile_number = "+12345".to_string();
        assert!(validate_submission(&req).is_err());
    }

    #[test]
    fn test_email_shape_checked() {
        for bad in ["maria", "maria@", "@example.com", "maria@nodot", "ma ria@example.com"] {
            let mut req = valid_request();
            req.email = bad.to_string();
            assert!(validate_submission(&req).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn test_caregiving_experience_must_be_non_empty() {
        let mut req = valid_request();
        req.caregiving_experience = vec![];
        assert!(validate_submission(&req).is_err());

        req.caregiving_experience = vec!["  ".to_string()];
        assert!(validate_submission(&req).is_err());
    }

    #[test]
    fn test_acknowledgment_required() {
        let mut req = valid_request();
        req.acknowledged_accuracy = false;
        assert!(validate_submission(&req).is_err());
    }

    #[test]
    fn test_sort_parsing() {
        let mut query = ListQuery::default();
        assert_eq!(
            parse_sort(&query).unwrap(),
            (ApplicationSortField::CreatedAt, SortOrder::Desc)
        );

        query.sort_by = Some("fullName".to_string());
        query.sort_order = Some("asc".to_string());
        assert_eq!(
            parse_sort(&query).unwrap(),
            (ApplicationSortField::FullName, SortOrder::Asc)
        );

        query.sort_by = Some("nope".to_string());
        assert!(parse_sort(&query).is_err());
    }
}
