// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Credential extraction and the outbound response channel.
//!
//! Absent credentials are `None`, never errors. Only the token itself can
//! fail later, during verification.

use std::sync::Mutex;

use axum::http::{
    header::{AUTHORIZATION, COOKIE},
    HeaderMap, HeaderName, HeaderValue,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Raw credentials presented by one call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Credentials {
    /// Bearer token, if any
    pub token: Option<String>,
    /// Correlation identifier from the cookie-equivalent channel, if any
    pub correlation_id: Option<String>,
}

impl Credentials {
    /// Extract credentials from request headers.
    pub fn from_headers(headers: &HeaderMap, cookie_name: &str) -> Self {
        Self {
            token: headers
                .get(AUTHORIZATION)
                .and_then(|v| v.to_str().ok())
                .and_then(bearer_token),
            correlation_id: cookie_value(headers, cookie_name),
        }
    }

    /// Extract credentials from message-stream connection parameters.
    ///
    /// These channels carry no cookie, so there is never an identifier.
    pub fn from_connection_params(params: &ConnectionParams) -> Self {
        Self {
            token: params.authorization.as_deref().and_then(bearer_token),
            correlation_id: None,
        }
    }
}

/// Parameters sent when a message-stream connection is established.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConnectionParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authorization: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn bearer_token(value: &str) -> Option<String> {
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    for header in headers.get_all(COOKIE) {
        let Ok(value) = header.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            let Some((key, val)) = pair.trim().split_once('=') else {
                continue;
            };
            if key.trim() == name {
                let val = val.trim();
                return if val.is_empty() { None } else { Some(val.to_string()) };
            }
        }
    }
    None
}

/// Outbound channel of a request-style call.
///
/// Writes are buffered and only reach the client if the call succeeds.
pub trait ResponseSink: Send + Sync {
    /// Set `name`, replacing earlier values.
    fn insert_header(&self, name: HeaderName, value: HeaderValue);

    /// Add a value for `name`, keeping earlier ones.
    fn append_header(&self, name: HeaderName, value: HeaderValue);
}

/// [`ResponseSink`] buffering into a [`HeaderMap`].
#[derive(Debug, Default)]
pub struct HeaderSink {
    pending: Mutex<HeaderMap>,
}

impl HeaderSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy every buffered header into `headers`.
    pub fn merge_into(&self, headers: &mut HeaderMap) {
        if let Ok(pending) = self.pending.lock() {
            for name in pending.keys() {
                headers.remove(name);
            }
            for (name, value) in pending.iter() {
                headers.append(name.clone(), value.clone());
            }
        }
    }

    /// Snapshot of the buffered headers.
    pub fn headers(&self) -> HeaderMap {
        self.pending.lock().map(|h| h.clone()).unwrap_or_default()
    }
}

impl ResponseSink for HeaderSink {
    fn insert_header(&self, name: HeaderName, value: HeaderValue) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.insert(name, value);
        }
    }

    fn append_header(&self, name: HeaderName, value: HeaderValue) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.append(name, value);
        }
    }
}
