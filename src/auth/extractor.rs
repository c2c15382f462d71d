// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors for the authenticated call.
//!
//! All of them read what [`super::middleware::auth_context`] left in the
//! request extensions. Without the middleware they reject.
//!
//! ```rust,ignore
//! async fn viewer(Auth(member): Auth<Member>) -> Json<Member> {
//!     Json(member)
//! }
//!
//! async fn sign_in(Session(mut session): Session<MyStore, MyCodec>) -> StatusCode {
//!     session.sign_in(member).await?;
//!     StatusCode::NO_CONTENT
//! }
//! ```

use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::error;

use super::authenticator::AuthContext;
use super::user::UserCodec;
use crate::correlation::CorrelationStore;
use crate::error::AuthRejection;

/// Resolved user of the call, `None` for anonymous callers.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity<U>(pub Option<U>);

/// Extractor for the call's [`AuthContext`], used to sign in or out.
pub struct Session<S, C: UserCodec>(pub AuthContext<S, C>);

impl<S, C, St> FromRequestParts<St> for Session<S, C>
where
    S: CorrelationStore,
    C: UserCodec,
    St: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &St) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthContext<S, C>>()
            .cloned()
            .map(Session)
            .ok_or_else(missing_middleware)
    }
}

/// Extractor requiring an authenticated user.
pub struct Auth<U>(pub U);

impl<U, St> FromRequestParts<St> for Auth<U>
where
    U: Clone + Send + Sync + 'static,
    St: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &St) -> Result<Self, Self::Rejection> {
        let Identity(user) = identity(parts)?;
        user.map(Auth).ok_or_else(AuthRejection::new)
    }
}

/// Optional authentication extractor.
///
/// Returns `None` for anonymous callers instead of rejecting.
pub struct OptionalAuth<U>(pub Option<U>);

impl<U, St> FromRequestParts<St> for OptionalAuth<U>
where
    U: Clone + Send + Sync + 'static,
    St: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &St) -> Result<Self, Self::Rejection> {
        let Identity(user) = identity(parts)?;
        Ok(OptionalAuth(user))
    }
}

fn identity<U: Clone + Send + Sync + 'static>(parts: &Parts) -> Result<Identity<U>, AuthRejection> {
    parts
        .extensions
        .get::<Identity<U>>()
        .cloned()
        .ok_or_else(missing_middleware)
}

fn missing_middleware() -> AuthRejection {
    error!("Authentication middleware is not installed for this route");
    AuthRejection::new()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[derive(Debug, Clone, PartialEq)]
    struct Member {
        id: String,
    }

    fn parts() -> Parts {
        Request::builder()
            .uri("/test")
            .body(())
            .unwrap()
            .into_parts()
            .0
    }

    fn member() -> Member {
        Member {
            id: "1".to_string(),
        }
    }

    #[tokio::test]
    async fn auth_returns_resolved_user() {
        let mut parts = parts();
        parts.extensions.insert(Identity(Some(member())));

        let Auth(user) = Auth::<Member>::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(user, member());
    }

    #[tokio::test]
    async fn auth_rejects_anonymous_caller() {
        let mut parts = parts();
        parts.extensions.insert(Identity::<Member>(None));

        let result = Auth::<Member>::from_request_parts(&mut parts, &()).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn optional_auth_returns_none_for_anonymous_caller() {
        let mut parts = parts();
        parts.extensions.insert(Identity::<Member>(None));

        let OptionalAuth(user) = OptionalAuth::<Member>::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert!(user.is_none());
    }

    #[tokio::test]
    async fn extractors_fail_closed_without_middleware() {
        let mut parts = parts();

        assert!(Auth::<Member>::from_request_parts(&mut parts, &()).await.is_err());
        assert!(OptionalAuth::<Member>::from_request_parts(&mut parts, &())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn identity_of_another_type_is_not_picked_up() {
        let mut parts = parts();
        parts.extensions.insert(Identity(Some("1".to_string())));

        assert!(Auth::<Member>::from_request_parts(&mut parts, &()).await.is_err());
    }
}
