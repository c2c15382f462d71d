// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication failure causes.
//!
//! These never leave the process as-is. The orchestration boundary collapses
//! every variant into [`crate::error::AuthRejection`].

use crate::correlation::StoreError;

use super::token::TokenError;
use super::user::UserCodecError;

/// Internal authentication error type.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Token could not be parsed
    #[error("jwt malformed")]
    Malformed,

    /// Signature, algorithm or registered claims do not match this codec
    #[error("invalid signature")]
    InvalidSignature,

    /// Token is past its hard expiry
    #[error("jwt expired")]
    Expired,

    /// Presented correlation identifier differs from the one in the token
    #[error("not match to correlation id")]
    BindingMismatch,

    /// Token secret was already rotated away (or lost a concurrent renewal)
    #[error("not match to secret")]
    SecretMismatch,

    /// Token is due for renewal on a channel that cannot deliver a new one
    #[error("token is not safe")]
    UnsafeToken,

    /// Embedded user payload was rejected by the host codec
    #[error(transparent)]
    UserPayload(#[from] UserCodecError),

    /// Correlation store failure
    #[error("correlation store failed: {0}")]
    Store(#[from] StoreError),

    /// Sign-in attempted on a call that cannot deliver a cookie or token
    #[error("sign in is not available")]
    SignInUnavailable,

    /// Token could not be signed
    #[error("token signing failed: {0}")]
    Signing(String),

    /// Outbound header could not be encoded
    #[error("response header rejected: {0}")]
    Transport(String),

    /// Secure randomness unavailable
    #[error("secret generation failed")]
    Randomness,
}

impl AuthError {
    /// Stable code for logs and the diagnostics channel.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::Malformed => "malformed_token",
            AuthError::InvalidSignature => "invalid_signature",
            AuthError::Expired => "token_expired",
            AuthError::BindingMismatch => "binding_mismatch",
            AuthError::SecretMismatch => "secret_mismatch",
            AuthError::UnsafeToken => "unsafe_token",
            AuthError::SignInUnavailable => "sign_in_unavailable",
            AuthError::UserPayload(_) => "user_payload",
            AuthError::Store(_) => "store_error",
            AuthError::Signing(_) => "signing_error",
            AuthError::Transport(_) => "transport_error",
            AuthError::Randomness => "randomness_error",
        }
    }
}

impl From<TokenError> for AuthError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Malformed => AuthError::Malformed,
            TokenError::InvalidSignature => AuthError::InvalidSignature,
            TokenError::Expired => AuthError::Expired,
            TokenError::Serialization(msg) | TokenError::InvalidKey(msg) => AuthError::Signing(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_errors_map_to_causes() {
        assert!(matches!(AuthError::from(TokenError::Malformed), AuthError::Malformed));
        assert!(matches!(
            AuthError::from(TokenError::InvalidSignature),
            AuthError::InvalidSignature
        ));
        assert!(matches!(AuthError::from(TokenError::Expired), AuthError::Expired));
        assert!(matches!(
            AuthError::from(TokenError::Serialization("x".to_string())),
            AuthError::Signing(_)
        ));
    }

    #[test]
    fn messages_name_the_cause() {
        assert_eq!(AuthError::BindingMismatch.to_string(), "not match to correlation id");
        assert_eq!(AuthError::SecretMismatch.to_string(), "not match to secret");
        assert_eq!(AuthError::UnsafeToken.to_string(), "token is not safe");
        assert_eq!(AuthError::Expired.to_string(), "jwt expired");
    }

    #[test]
    fn error_codes_are_distinct() {
        let codes = [
            AuthError::Malformed.error_code(),
            AuthError::InvalidSignature.error_code(),
            AuthError::Expired.error_code(),
            AuthError::BindingMismatch.error_code(),
            AuthError::SecretMismatch.error_code(),
            AuthError::UnsafeToken.error_code(),
            AuthError::SignInUnavailable.error_code(),
        ];
        let unique: std::collections::HashSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), codes.len());
    }
}
