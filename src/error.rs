// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    http::{HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Response header carrying the failure detail in diagnostics mode.
pub const DIAGNOSTIC_HEADER: HeaderName = HeaderName::from_static("x-content-extend");

/// The only authentication failure callers ever see.
///
/// `detail` is populated only when diagnostics mode is enabled.
#[derive(Debug, thiserror::Error)]
#[error("must authenticate")]
pub struct AuthRejection {
    detail: Option<String>,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    error_code: &'static str,
}

impl AuthRejection {
    pub fn new() -> Self {
        Self { detail: None }
    }

    pub fn with_detail(detail: impl Into<String>) -> Self {
        Self {
            detail: Some(detail.into()),
        }
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::UNAUTHORIZED
    }
}

impl Default for AuthRejection {
    fn default() -> Self {
        Self::new()
    }
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorBody {
            error: self.to_string(),
            error_code: "unauthenticated",
        });
        let mut response = (status, body).into_response();

        if let Some(detail) = self.detail {
            if let Ok(value) = HeaderValue::from_str(&detail) {
                response.headers_mut().insert(DIAGNOSTIC_HEADER, value);
            }
        }

        response
    }
}
