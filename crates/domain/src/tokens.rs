//! Access/refresh token pair and refresh endpoint wire types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The credentials held for the current session.
///
/// The access token is short-lived and attached as a bearer credential; the
/// refresh token is long-lived and used only against the refresh endpoint.
/// The pair is rotated in place on every successful refresh and cleared
/// entirely on refresh failure or logout. A store holds zero or one pair,
/// never a history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Bearer credential for API requests
    pub access_token: String,

    /// Credential exchanged for a new pair at the refresh endpoint
    pub refresh_token: String,

    /// When this pair was stored locally (not a server-side expiry)
    pub issued_at: DateTime<Utc>,
}

impl TokenPair {
    /// Create a pair stamped with the current time.
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            issued_at: Utc::now(),
        }
    }
}

/// Request body for the refresh endpoint.
#[derive(Debug, Serialize)]
pub struct RefreshRequest<'a> {
    #[serde(rename = "refreshToken")]
    pub refresh_token: &'a str,
}

/// Success body returned by the refresh endpoint.
#[derive(Debug, Deserialize)]
pub struct RefreshResponse {
    #[serde(rename = "accessToken")]
    pub access_token: String,

    #[serde(rename = "refreshToken")]
    pub refresh_token: String,
}

impl From<RefreshResponse> for TokenPair {
    fn from(response: RefreshResponse) -> Self {
        Self::new(response.access_token, response.refresh_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_pair_creation_stamps_issue_time() {
        let pair = TokenPair::new("access", "refresh");
        assert_eq!(pair.access_token, "access");
        assert_eq!(pair.refresh_token, "refresh");
        assert!((Utc::now() - pair.issued_at).num_seconds() < 5);
    }

    #[test]
    fn refresh_request_uses_camel_case_field() {
        let request = RefreshRequest { refresh_token: "r1" };
        let json = serde_json::to_value(&request).expect("serialize");
        assert_eq!(json, serde_json::json!({ "refreshToken": "r1" }));
    }

    #[test]
    fn refresh_response_parses_camel_case_fields() {
        let body = r#"{"accessToken":"a2","refreshToken":"r2"}"#;
        let response: RefreshResponse = serde_json::from_str(body).expect("parse");
        let pair = TokenPair::from(response);
        assert_eq!(pair.access_token, "a2");
        assert_eq!(pair.refresh_token, "r2");
    }
}
