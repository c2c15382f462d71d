// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Signed token codec.
//!
//! ## Algorithms
//!
//! - `HS256` when constructed with a shared secret
//! - `RS256` when constructed with an RSA key pair
//!
//! Verification accepts either algorithm as long as a key of the matching
//! family is registered, which lets a deployment move from a shared secret to
//! a key pair without invalidating live sessions (see
//! [`TokenCodec::with_verification_key`]). Anything else is rejected.

use std::fmt;

use chrono::{TimeDelta, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;

/// Default token lifetime (14 days).
pub const DEFAULT_LIFETIME_SECS: i64 = 14 * 24 * 60 * 60;

/// Elapsed lifetime after which a still-valid token is due for renewal (1 hour).
pub const RENEWAL_THRESHOLD_SECS: i64 = 60 * 60;

pub const DEFAULT_ISSUER: &str = "jwt";
pub const DEFAULT_SUBJECT: &str = "jwt";
pub const DEFAULT_AUDIENCE: &str = "everyone";

/// Algorithms a presented token may carry in its header.
const ACCEPTED_ALGORITHMS: [Algorithm; 2] = [Algorithm::HS256, Algorithm::RS256];

/// Token codec errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("jwt malformed")]
    Malformed,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("jwt expired")]
    Expired,

    #[error("claims could not be serialized: {0}")]
    Serialization(String),

    #[error("invalid signing key: {0}")]
    InvalidKey(String),
}

impl TokenError {
    fn from_verification(error: &jsonwebtoken::errors::Error) -> Self {
        match error.kind() {
            ErrorKind::ExpiredSignature => TokenError::Expired,
            ErrorKind::InvalidSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidIssuer
            | ErrorKind::InvalidAudience
            | ErrorKind::InvalidSubject => TokenError::InvalidSignature,
            _ => TokenError::Malformed,
        }
    }
}

/// Key material the codec signs with.
///
/// Chosen once at construction; the variant fixes the signing algorithm.
#[derive(Clone)]
pub enum SigningIdentity {
    /// Symmetric secret (`HS256`).
    SharedSecret(String),
    /// RSA key pair in PEM form (`RS256`).
    KeyPair {
        private_pem: String,
        public_pem: String,
    },
}

impl SigningIdentity {
    /// The algorithm tokens signed by this identity carry.
    pub fn algorithm(&self) -> Algorithm {
        match self {
            SigningIdentity::SharedSecret(_) => Algorithm::HS256,
            SigningIdentity::KeyPair { .. } => Algorithm::RS256,
        }
    }

    fn encoding_key(&self) -> Result<EncodingKey, TokenError> {
        match self {
            SigningIdentity::SharedSecret(secret) => {
                if secret.is_empty() {
                    return Err(TokenError::InvalidKey("shared secret is empty".to_string()));
                }
                Ok(EncodingKey::from_secret(secret.as_bytes()))
            }
            SigningIdentity::KeyPair { private_pem, .. } => {
                EncodingKey::from_rsa_pem(private_pem.as_bytes())
                    .map_err(|e| TokenError::InvalidKey(format!("RSA private key: {e}")))
            }
        }
    }

    fn verifying_key(&self) -> Result<VerifyingKey, TokenError> {
        let key = match self {
            SigningIdentity::SharedSecret(secret) => {
                if secret.is_empty() {
                    return Err(TokenError::InvalidKey("shared secret is empty".to_string()));
                }
                DecodingKey::from_secret(secret.as_bytes())
            }
            SigningIdentity::KeyPair { public_pem, .. } => {
                DecodingKey::from_rsa_pem(public_pem.as_bytes())
                    .map_err(|e| TokenError::InvalidKey(format!("RSA public key: {e}")))?
            }
        };
        Ok(VerifyingKey {
            algorithm: self.algorithm(),
            key,
        })
    }
}

impl fmt::Debug for SigningIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SigningIdentity::SharedSecret(_) => f.write_str("SharedSecret(<redacted>)"),
            SigningIdentity::KeyPair { .. } => f.write_str("KeyPair(<redacted>)"),
        }
    }
}

/// Registered claim defaults applied to every token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenOptions {
    /// Lifetime of a freshly signed token.
    pub lifetime: TimeDelta,
    pub issuer: String,
    pub subject: String,
    pub audience: String,
    /// Clock skew tolerance in seconds when checking `exp`.
    pub leeway: u64,
}

impl Default for TokenOptions {
    fn default() -> Self {
        Self {
            lifetime: TimeDelta::seconds(DEFAULT_LIFETIME_SECS),
            issuer: DEFAULT_ISSUER.to_string(),
            subject: DEFAULT_SUBJECT.to_string(),
            audience: DEFAULT_AUDIENCE.to_string(),
            leeway: 0,
        }
    }
}

impl TokenOptions {
    /// Whether a token expiring at `expires_at` has used up more than the
    /// renewal threshold of its lifetime at `now` (both Unix seconds).
    pub fn renewal_due(&self, expires_at: i64, now: i64) -> bool {
        let remaining = expires_at - now;
        remaining < self.lifetime.num_seconds() - RENEWAL_THRESHOLD_SECS
    }
}

/// Per-token overrides.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignOptions {
    /// Overrides [`TokenOptions::lifetime`]. Negative values yield a token
    /// that is already expired.
    pub expires_in: Option<TimeDelta>,
}

impl SignOptions {
    pub fn expires_in(expires_in: TimeDelta) -> Self {
        Self {
            expires_in: Some(expires_in),
        }
    }
}

/// A verified token payload together with its temporal claims.
#[derive(Debug, Clone, PartialEq)]
pub struct Verified<P> {
    pub claims: P,
    pub issued_at: i64,
    pub expires_at: i64,
}

/// Wire layout: the payload's fields next to the registered claims.
#[derive(Serialize, Deserialize)]
struct Envelope<P> {
    #[serde(flatten)]
    claims: P,
    iat: i64,
    exp: i64,
    iss: String,
    sub: String,
    aud: String,
}

struct VerifyingKey {
    algorithm: Algorithm,
    key: DecodingKey,
}

/// Signs and verifies compact tokens.
///
/// Read-only after construction and safe to share across concurrent calls.
pub struct TokenCodec {
    algorithm: Algorithm,
    signing: EncodingKey,
    verifying: Vec<VerifyingKey>,
    options: TokenOptions,
}

impl TokenCodec {
    /// Create a codec signing with `identity`.
    pub fn new(identity: SigningIdentity, options: TokenOptions) -> Result<Self, TokenError> {
        Ok(Self {
            algorithm: identity.algorithm(),
            signing: identity.encoding_key()?,
            verifying: vec![identity.verifying_key()?],
            options,
        })
    }

    /// Also accept tokens signed by `identity` (never used for signing).
    pub fn with_verification_key(mut self, identity: SigningIdentity) -> Result<Self, TokenError> {
        self.verifying.push(identity.verifying_key()?);
        Ok(self)
    }

    pub fn options(&self) -> &TokenOptions {
        &self.options
    }

    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// Sign `claims` with the configured registered-claim defaults.
    pub fn sign<P: Serialize>(&self, claims: &P, options: &SignOptions) -> Result<String, TokenError> {
        let now = Utc::now().timestamp();
        let lifetime = options.expires_in.unwrap_or(self.options.lifetime);
        let envelope = Envelope {
            claims,
            iat: now,
            exp: now + lifetime.num_seconds(),
            iss: self.options.issuer.clone(),
            sub: self.options.subject.clone(),
            aud: self.options.audience.clone(),
        };

        encode(&Header::new(self.algorithm), &envelope, &self.signing)
            .map_err(|e| TokenError::Serialization(e.to_string()))
    }

    /// Verify `token` and decode its payload.
    pub fn verify<P: DeserializeOwned>(&self, token: &str) -> Result<Verified<P>, TokenError> {
        let header = decode_header(token).map_err(|_| TokenError::Malformed)?;
        if !ACCEPTED_ALGORITHMS.contains(&header.alg) {
            return Err(TokenError::InvalidSignature);
        }

        let validation = self.validation(header.alg);
        let mut outcome = Err(TokenError::InvalidSignature);

        for candidate in self.verifying.iter().filter(|k| k.algorithm == header.alg) {
            // Payload shape is checked after expiry and signature.
            match decode::<Envelope<Value>>(token, &candidate.key, &validation) {
                Ok(data) => {
                    let claims = serde_json::from_value(data.claims.claims)
                        .map_err(|_| TokenError::Malformed)?;
                    return Ok(Verified {
                        claims,
                        issued_at: data.claims.iat,
                        expires_at: data.claims.exp,
                    });
                }
                Err(e) => {
                    let error = TokenError::from_verification(&e);
                    // Only a signature failure means another key might fit.
                    if error != TokenError::InvalidSignature {
                        return Err(error);
                    }
                    outcome = Err(error);
                }
            }
        }

        outcome
    }

    fn validation(&self, algorithm: Algorithm) -> Validation {
        let mut validation = Validation::new(algorithm);
        validation.leeway = self.options.leeway;
        validation.set_issuer(&[&self.options.issuer]);
        validation.set_audience(&[&self.options.audience]);
        validation.sub = Some(self.options.subject.clone());
        validation.set_required_spec_claims(&["exp", "iss", "sub", "aud"]);
        validation
    }
}
