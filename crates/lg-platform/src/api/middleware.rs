//! API Middleware
//!
//! Admin authentication for Axum: a shared API key presented in the
//! `x-api-key` header, compared in constant time.

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use subtle::ConstantTimeEq;

use crate::api::common::ApiError;

const API_KEY_HEADER: &str = "x-api-key";

/// Configured admin API key, added to the router as an Extension
#[derive(Clone)]
pub struct ApiKeyConfig {
    key: String,
}

impl ApiKeyConfig {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    fn matches(&self, presented: &str) -> bool {
        // ct_eq on slices already yields false for mismatched lengths
        bool::from(self.key.as_bytes().ct_eq(presented.as_bytes()))
    }
}

/// Extractor guarding admin endpoints
pub struct RequireApiKey;

fn unauthorized(message: &str) -> Response {
    let error = ApiError {
        error: "UNAUTHORIZED".to_string(),
        message: message.to_string(),
        details: None,
    };
    (StatusCode::UNAUTHORIZED, Json(error)).into_response()
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for RequireApiKey
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let presented = parts
            .headers
            .get(API_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| unauthorized("Missing API key"))?;

        let config = parts.extensions.get::<ApiKeyConfig>().ok_or_else(|| {
            let error = ApiError {
                error: "INTERNAL_ERROR".to_string(),
                message: "API key not configured".to_string(),
                details: None,
            };
            (StatusCode::INTERNAL_SERVER_ERROR, Json(error)).into_response()
        })?;

        if !config.matches(presented) {
            return Err(unauthorized("Invalid API key"));
        }

        Ok(RequireApiKey)
    }
}
