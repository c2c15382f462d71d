// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Session token claims.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::correlation::CorrelationRecord;

/// Correlation binding embedded in a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CorrelationClaim {
    /// Correlation identifier the client also holds in its identifier cookie
    pub id: String,

    /// Secret current at signing time; required to renew the token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

impl From<&CorrelationRecord> for CorrelationClaim {
    fn from(record: &CorrelationRecord) -> Self {
        Self {
            id: record.id.clone(),
            secret: record.secret.clone(),
        }
    }
}

/// Payload of a session token.
///
/// The registered claims (`exp`, `iss`, `sub`, `aud`, `iat`) are added by the
/// codec. The token is the only carrier of these values; nothing here is
/// stored server-side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub correlation: CorrelationClaim,

    /// Serialized user as produced by the host's `UserCodec::to_values`
    pub user: Value,
}

impl SessionClaims {
    pub fn new(correlation: CorrelationClaim, user: Value) -> Self {
        Self { correlation, user }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::correlation::CorrelationState;
    use serde_json::json;

    #[test]
    fn claim_from_record_copies_id_and_secret() {
        let record = CorrelationRecord {
            id: "10".to_string(),
            secret: Some("OpenDoor".to_string()),
            state: CorrelationState::Established,
        };
        let claim = CorrelationClaim::from(&record);
        assert_eq!(claim.id, "10");
        assert_eq!(claim.secret.as_deref(), Some("OpenDoor"));
    }

    #[test]
    fn secretless_claim_omits_secret_field() {
        let claims = SessionClaims::new(
            CorrelationClaim {
                id: "10".to_string(),
                secret: None,
            },
            json!({ "id": "1" }),
        );
        let value = serde_json::to_value(&claims).unwrap();
        assert_eq!(value, json!({ "correlation": { "id": "10" }, "user": { "id": "1" } }));

        let parsed: SessionClaims = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, claims);
    }

    #[test]
    fn claims_without_correlation_do_not_parse() {
        let result = serde_json::from_value::<SessionClaims>(json!({ "id": "10" }));
        assert!(result.is_err());
    }
}
