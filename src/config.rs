// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Environment variable names and defaults. Signing keys are not read here;
//! the host builds a [`crate::auth::SigningIdentity`] itself.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `JWT_EXPIRES_IN` | Token lifetime in seconds, at most ten years | `1209600` (14 days) |
//! | `JWT_ISSUER` | `iss` claim | `jwt` |
//! | `JWT_SUBJECT` | `sub` claim | `jwt` |
//! | `JWT_AUDIENCE` | `aud` claim | `everyone` |
//! | `AUTH_DIAGNOSTICS` | Expose failure detail in `x-content-extend` | off |
//! | `CORRELATION_COOKIE_NAME` | Identifier cookie name | `x-correlation-id` |
//! | `CORRELATION_COOKIE_SECURE` | Mark the identifier cookie `Secure` | off |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use chrono::TimeDelta;
use tracing::warn;

use crate::auth::TokenOptions;

pub const JWT_EXPIRES_IN_ENV: &str = "JWT_EXPIRES_IN";
pub const JWT_ISSUER_ENV: &str = "JWT_ISSUER";
pub const JWT_SUBJECT_ENV: &str = "JWT_SUBJECT";
pub const JWT_AUDIENCE_ENV: &str = "JWT_AUDIENCE";
pub const AUTH_DIAGNOSTICS_ENV: &str = "AUTH_DIAGNOSTICS";
pub const CORRELATION_COOKIE_NAME_ENV: &str = "CORRELATION_COOKIE_NAME";
pub const CORRELATION_COOKIE_SECURE_ENV: &str = "CORRELATION_COOKIE_SECURE";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_CORRELATION_COOKIE: &str = "x-correlation-id";

/// Identifier cookie lifetime (one year).
pub const CORRELATION_COOKIE_MAX_AGE_SECS: i64 = 365 * 24 * 60 * 60;

/// Upper bound for `JWT_EXPIRES_IN` (10 years).
pub const MAX_TOKEN_LIFETIME_SECS: i64 = 10 * 365 * 24 * 60 * 60;

/// Authenticator behavior outside the token codec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSettings {
    /// Attach failure detail to rejections (test/verification harnesses only)
    pub diagnostics: bool,
    pub correlation_cookie: String,
    pub correlation_max_age: TimeDelta,
    pub secure_cookie: bool,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            diagnostics: false,
            correlation_cookie: DEFAULT_CORRELATION_COOKIE.to_string(),
            correlation_max_age: TimeDelta::seconds(CORRELATION_COOKIE_MAX_AGE_SECS),
            secure_cookie: false,
        }
    }
}

/// Everything configurable through the environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub token: TokenOptions,
    pub auth: AuthSettings,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Settings::default();

        if let Some(raw) = lookup(JWT_EXPIRES_IN_ENV) {
            match parse_lifetime(&raw) {
                Some(lifetime) => settings.token.lifetime = lifetime,
                None => warn!(value = %raw, "Ignoring invalid {JWT_EXPIRES_IN_ENV}"),
            }
        }
        if let Some(issuer) = lookup(JWT_ISSUER_ENV) {
            settings.token.issuer = issuer;
        }
        if let Some(subject) = lookup(JWT_SUBJECT_ENV) {
            settings.token.subject = subject;
        }
        if let Some(audience) = lookup(JWT_AUDIENCE_ENV) {
            settings.token.audience = audience;
        }
        if let Some(raw) = lookup(AUTH_DIAGNOSTICS_ENV) {
            settings.auth.diagnostics = parse_flag(AUTH_DIAGNOSTICS_ENV, &raw);
        }
        if let Some(name) = lookup(CORRELATION_COOKIE_NAME_ENV) {
            if name.is_empty() {
                warn!("Ignoring empty {CORRELATION_COOKIE_NAME_ENV}");
            } else {
                settings.auth.correlation_cookie = name;
            }
        }
        if let Some(raw) = lookup(CORRELATION_COOKIE_SECURE_ENV) {
            settings.auth.secure_cookie = parse_flag(CORRELATION_COOKIE_SECURE_ENV, &raw);
        }

        settings
    }
}

/// Positive seconds, at most [`MAX_TOKEN_LIFETIME_SECS`].
fn parse_lifetime(raw: &str) -> Option<TimeDelta> {
    let secs = raw.trim().parse::<i64>().ok()?;
    if secs <= 0 || secs > MAX_TOKEN_LIFETIME_SECS {
        return None;
    }
    TimeDelta::try_seconds(secs)
}

fn parse_flag(name: &str, raw: &str) -> bool {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" | "" => false,
        _ => {
            warn!(value = %raw, "Ignoring invalid {name}");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_without_variables() {
        let settings = Settings::from_lookup(lookup(&[]));
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.token.lifetime, TimeDelta::days(14));
        assert_eq!(settings.auth.correlation_cookie, "x-correlation-id");
        assert!(!settings.auth.diagnostics);
    }

    #[test]
    fn variables_override_defaults() {
        let settings = Settings::from_lookup(lookup(&[
            (JWT_EXPIRES_IN_ENV, "3600"),
            (JWT_ISSUER_ENV, "issuer"),
            (JWT_SUBJECT_ENV, "subject"),
            (JWT_AUDIENCE_ENV, "audience"),
            (AUTH_DIAGNOSTICS_ENV, "true"),
            (CORRELATION_COOKIE_NAME_ENV, "cid"),
            (CORRELATION_COOKIE_SECURE_ENV, "1"),
        ]));

        assert_eq!(settings.token.lifetime, TimeDelta::hours(1));
        assert_eq!(settings.token.issuer, "issuer");
        assert_eq!(settings.token.subject, "subject");
        assert_eq!(settings.token.audience, "audience");
        assert!(settings.auth.diagnostics);
        assert_eq!(settings.auth.correlation_cookie, "cid");
        assert!(settings.auth.secure_cookie);
    }

    #[test]
    fn invalid_values_fall_back() {
        let settings = Settings::from_lookup(lookup(&[
            (JWT_EXPIRES_IN_ENV, "soon"),
            (AUTH_DIAGNOSTICS_ENV, "maybe"),
            (CORRELATION_COOKIE_NAME_ENV, ""),
        ]));
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn out_of_range_lifetime_falls_back() {
        for raw in ["9223372036854775807", "-5", "0", "315360001"] {
            let settings = Settings::from_lookup(lookup(&[(JWT_EXPIRES_IN_ENV, raw)]));
            assert_eq!(settings.token.lifetime, TimeDelta::days(14), "{raw}");
        }

        let settings = Settings::from_lookup(lookup(&[(JWT_EXPIRES_IN_ENV, "315360000")]));
        assert_eq!(settings.token.lifetime, TimeDelta::days(3650));
    }
}
