// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Module
//!
//! Bearer-token sessions bound to a server-tracked correlation.
//!
//! ## Auth Flow
//!
//! 1. First sign-in creates an `Unfamiliar` correlation and sets its
//!    identifier cookie. No token yet
//! 2. The client comes back with the cookie; the correlation is confirmed
//!    and sign-in issues a signed token carrying the correlation id, the
//!    current correlation secret and the serialized user
//! 3. Every call sends `Authorization: Bearer <token>` plus the cookie:
//!    - signature, expiry, issuer, audience and subject are verified
//!    - the token's correlation id must equal the cookie
//!    - an aging token is renewed by rotating the correlation secret
//!
//! ## Security
//!
//! - Every failure surfaces as the same "must authenticate" rejection
//! - A stolen token is useless without the matching cookie
//! - Secret rotation is compare-and-swap, so a renewed token invalidates
//!   every replay of the old one
//! - Zero clock skew tolerance by default

pub mod authenticator;
pub mod claims;
pub mod error;
pub mod extractor;
pub mod middleware;
pub mod token;
pub mod user;

pub use authenticator::{AuthContext, Authenticator, SignInOutcome};
pub use claims::{CorrelationClaim, SessionClaims};
pub use error::AuthError;
pub use extractor::{Auth, Identity, OptionalAuth, Session};
pub use middleware::auth_context;
pub use token::{SignOptions, SigningIdentity, TokenCodec, TokenError, TokenOptions, Verified};
pub use user::{JsonUserCodec, UserCodec, UserCodecError};
