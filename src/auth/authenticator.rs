// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Per-call authentication.
//!
//! ## Flow
//!
//! 1. No token: anonymous, not an error
//! 2. Verify the token; any failure is final (no anonymous fallback)
//! 3. Binding check: the presented identifier must equal the token's
//!    correlation id. Skipped only for calls with neither a response channel
//!    nor an identifier (message-stream handshakes)
//! 4. Renewal: once more than an hour of the token's lifetime has elapsed,
//!    rotate the correlation secret and deliver a new token. Without a
//!    response channel the token is refused as unsafe instead
//!
//! Every failure surfaces as the same [`AuthRejection`].

use std::sync::Arc;

use axum::http::{
    header::{AUTHORIZATION, SET_COOKIE},
    HeaderMap, HeaderValue,
};
use chrono::Utc;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use super::claims::{CorrelationClaim, SessionClaims};
use super::error::AuthError;
use super::token::{SignOptions, TokenCodec, Verified};
use super::user::UserCodec;
use crate::config::AuthSettings;
use crate::correlation::{CorrelationLifecycle, CorrelationRecord, CorrelationStore, StoreContext};
use crate::error::AuthRejection;
use crate::transport::{ConnectionParams, Credentials, ResponseSink};

struct Inner<S, C> {
    codec: TokenCodec,
    lifecycle: CorrelationLifecycle<S>,
    users: C,
    settings: AuthSettings,
}

/// Shared authenticator; cheap to clone.
pub struct Authenticator<S, C> {
    inner: Arc<Inner<S, C>>,
}

impl<S, C> Clone for Authenticator<S, C> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

/// Result of [`AuthContext::sign_in`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignInOutcome {
    pub correlation: CorrelationRecord,
    /// `None` while the correlation is still unfamiliar
    pub token: Option<String>,
}

impl<S: CorrelationStore, C: UserCodec> Authenticator<S, C> {
    pub fn new(codec: TokenCodec, store: Arc<S>, users: C, settings: AuthSettings) -> Self {
        Self {
            inner: Arc::new(Inner {
                codec,
                lifecycle: CorrelationLifecycle::new(store),
                users,
                settings,
            }),
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.inner.codec
    }

    pub fn lifecycle(&self) -> &CorrelationLifecycle<S> {
        &self.inner.lifecycle
    }

    pub fn settings(&self) -> &AuthSettings {
        &self.inner.settings
    }

    /// Resolve the caller's identity, renewing the token when due.
    ///
    /// `Ok(None)` is an anonymous caller. `sink` is the response channel of
    /// request-style calls; `None` for message-stream handshakes.
    pub async fn resolve_identity(
        &self,
        credentials: &Credentials,
        sink: Option<&dyn ResponseSink>,
    ) -> Result<Option<C::User>, AuthError> {
        let Some(token) = credentials.token.as_deref() else {
            return Ok(None);
        };

        let verified: Verified<SessionClaims> = self.inner.codec.verify(token)?;
        let SessionClaims {
            correlation,
            user: values,
        } = verified.claims;

        if (sink.is_some() || credentials.correlation_id.is_some())
            && credentials.correlation_id.as_deref() != Some(correlation.id.as_str())
        {
            return Err(AuthError::BindingMismatch);
        }

        let user = self.inner.users.to_model(values.clone())?;

        let now = Utc::now().timestamp();
        if self.inner.codec.options().renewal_due(verified.expires_at, now) {
            let Some(sink) = sink else {
                return Err(AuthError::UnsafeToken);
            };
            let secret = correlation
                .secret
                .as_deref()
                .ok_or(AuthError::SecretMismatch)?;

            let ctx = StoreContext::for_user(values.clone());
            let renewed = self.inner.lifecycle.renew(&correlation.id, secret, &ctx).await?;

            // The old secret is gone from here on; a delivery failure ends the session.
            let delivered = self
                .sign_session(&renewed, values)
                .and_then(|token| header_value(&token));
            match delivered {
                Ok(value) => sink.insert_header(AUTHORIZATION, value),
                Err(e) => {
                    error!(
                        correlation_id = %renewed.id,
                        error = %e,
                        "Secret rotated but renewed token could not be delivered"
                    );
                    return Err(e);
                }
            }
            debug!(correlation_id = %renewed.id, "Session token renewed");
        }

        Ok(Some(user))
    }

    /// Build the call context, collapsing any failure into [`AuthRejection`].
    pub async fn context(
        &self,
        credentials: Credentials,
        sink: Option<Arc<dyn ResponseSink>>,
    ) -> Result<AuthContext<S, C>, AuthRejection> {
        match self.resolve_identity(&credentials, sink.as_deref()).await {
            Ok(user) => Ok(AuthContext {
                authenticator: self.clone(),
                correlation_id: credentials.correlation_id,
                sink,
                user,
            }),
            Err(cause) => Err(self.reject(&cause)),
        }
    }

    /// Context for a request-style call.
    pub async fn parse_request(
        &self,
        headers: &HeaderMap,
        sink: Arc<dyn ResponseSink>,
    ) -> Result<AuthContext<S, C>, AuthRejection> {
        let credentials = Credentials::from_headers(headers, &self.inner.settings.correlation_cookie);
        self.context(credentials, Some(sink)).await
    }

    /// Context for a message-stream handshake (no cookie, no response channel).
    pub async fn parse_connection(
        &self,
        params: &ConnectionParams,
    ) -> Result<AuthContext<S, C>, AuthRejection> {
        self.context(Credentials::from_connection_params(params), None)
            .await
    }

    /// Sign a session token for `record` carrying the serialized user.
    pub fn sign_session(&self, record: &CorrelationRecord, user: Value) -> Result<String, AuthError> {
        let claims = SessionClaims::new(CorrelationClaim::from(record), user);
        Ok(self.inner.codec.sign(&claims, &SignOptions::default())?)
    }

    fn reject(&self, cause: &AuthError) -> AuthRejection {
        match cause {
            AuthError::Store(_)
            | AuthError::Signing(_)
            | AuthError::Transport(_)
            | AuthError::Randomness => {
                error!(error_code = cause.error_code(), error = %cause, "Authentication aborted");
            }
            _ => warn!(error_code = cause.error_code(), "Authentication failed"),
        }

        if self.inner.settings.diagnostics {
            AuthRejection::with_detail(cause.to_string())
        } else {
            AuthRejection::new()
        }
    }

    fn correlation_cookie(&self, id: &str) -> Result<HeaderValue, AuthError> {
        let settings = &self.inner.settings;
        let mut cookie = format!(
            "{}={id}; Path=/; Max-Age={}; HttpOnly; SameSite=Lax",
            settings.correlation_cookie,
            settings.correlation_max_age.num_seconds()
        );
        if settings.secure_cookie {
            cookie.push_str("; Secure");
        }
        header_value(&cookie)
    }
}

fn header_value(value: &str) -> Result<HeaderValue, AuthError> {
    HeaderValue::from_str(value).map_err(|e| AuthError::Transport(e.to_string()))
}

/// Authentication state of one call, handed to resolvers and handlers.
pub struct AuthContext<S, C: UserCodec> {
    authenticator: Authenticator<S, C>,
    correlation_id: Option<String>,
    sink: Option<Arc<dyn ResponseSink>>,
    user: Option<C::User>,
}

impl<S, C: UserCodec> Clone for AuthContext<S, C> {
    fn clone(&self) -> Self {
        Self {
            authenticator: self.authenticator.clone(),
            correlation_id: self.correlation_id.clone(),
            sink: self.sink.clone(),
            user: self.user.clone(),
        }
    }
}

impl<S: CorrelationStore, C: UserCodec> AuthContext<S, C> {
    pub fn user(&self) -> Option<&C::User> {
        self.user.as_ref()
    }

    pub fn into_user(self) -> Option<C::User> {
        self.user
    }

    pub fn is_authenticated(&self) -> bool {
        self.user.is_some()
    }

    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    /// Whether this call can deliver a cookie or token back to the client.
    ///
    /// Message-stream handshakes cannot, so they cannot sign in.
    pub fn can_sign_in(&self) -> bool {
        self.sink.is_some()
    }

    /// Sign in a user authenticated by an external action (e.g. a login
    /// mutation).
    ///
    /// Sets the identifier cookie when the correlation is new, and issues a
    /// token only once the correlation is established. Fails on contexts
    /// without a response channel.
    pub async fn sign_in(&mut self, user: C::User) -> Result<SignInOutcome, AuthRejection> {
        match self.try_sign_in(&user).await {
            Ok(outcome) => {
                self.user = Some(user);
                Ok(outcome)
            }
            Err(cause) => Err(self.authenticator.reject(&cause)),
        }
    }

    async fn try_sign_in(&mut self, user: &C::User) -> Result<SignInOutcome, AuthError> {
        let Some(sink) = self.sink.clone() else {
            return Err(AuthError::SignInUnavailable);
        };
        let authenticator = self.authenticator.clone();
        let values = authenticator.inner.users.to_values(user)?;
        let ctx = StoreContext::for_user(values.clone());

        let record = authenticator
            .inner
            .lifecycle
            .register(self.correlation_id.as_deref(), &ctx)
            .await?;

        if self.correlation_id.as_deref() != Some(record.id.as_str()) {
            sink.append_header(SET_COOKIE, authenticator.correlation_cookie(&record.id)?);
            self.correlation_id = Some(record.id.clone());
        }

        if record.is_unfamiliar() {
            info!(correlation_id = %record.id, "Token withheld until correlation is confirmed");
            return Ok(SignInOutcome {
                correlation: record,
                token: None,
            });
        }

        let token = authenticator.sign_session(&record, values)?;
        sink.insert_header(AUTHORIZATION, header_value(&token)?);
        info!(correlation_id = %record.id, "Signed in");

        Ok(SignInOutcome {
            correlation: record,
            token: Some(token),
        })
    }

    /// Forget the user and tell the client to drop its token.
    ///
    /// The correlation and its cookie survive for the next sign-in.
    pub fn sign_out(&mut self) {
        self.user = None;
        if let Some(sink) = &self.sink {
            sink.insert_header(AUTHORIZATION, HeaderValue::from_static(""));
        }
    }
}
