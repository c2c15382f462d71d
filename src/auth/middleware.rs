// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication middleware for Axum.
//!
//! Runs the [`Authenticator`] before every handler of the router subtree it
//! wraps. Anonymous callers pass through; failed authentication
//! short-circuits with the generic rejection.
//!
//! Headers written during the call (renewed token, identifier cookie) are
//! buffered and merged into the handler's response.
//!
//! ```rust,ignore
//! let app = Router::new()
//!     .route("/viewer", get(viewer))
//!     .layer(axum::middleware::from_fn_with_state(
//!         authenticator.clone(),
//!         auth_context::<MyStore, JsonUserCodec<Member>>,
//!     ));
//! ```

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::authenticator::Authenticator;
use super::extractor::Identity;
use super::user::UserCodec;
use crate::correlation::CorrelationStore;
use crate::transport::HeaderSink;

/// Authentication middleware function.
pub async fn auth_context<S, C>(
    State(authenticator): State<Authenticator<S, C>>,
    mut request: Request,
    next: Next,
) -> Response
where
    S: CorrelationStore,
    C: UserCodec,
{
    let sink = Arc::new(HeaderSink::new());

    let context = match authenticator
        .parse_request(request.headers(), sink.clone())
        .await
    {
        Ok(context) => context,
        Err(rejection) => return rejection.into_response(),
    };

    request
        .extensions_mut()
        .insert(Identity(context.user().cloned()));
    request.extensions_mut().insert(context);

    let mut response = next.run(request).await;
    sink.merge_into(response.headers_mut());
    response
}
