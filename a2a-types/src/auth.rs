//! Step-up authentication payload types.
//!
//! A skill that needs a secondary credential parks its task in the
//! `auth-required` state and attaches an [`AuthChallenge`] as a data part on
//! the status message. The client completes an OAuth2 authorization-code
//! exchange out of band and resumes the task with a [`StepUpCredential`]
//! embedded as a data part on the resume message. The credential never rides
//! the Authorization transport header; the user's primary session token keeps
//! authenticating the HTTP request itself.

use crate::Part;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Key under which a skill nests an [`AuthChallenge`] inside a data part.
pub const AUTH_REQUEST_KEY: &str = "auth_request";

/// Key under which the resume message carries the step-up credential.
pub const AUTH_CREDENTIALS_KEY: &str = "auth_credentials";

fn default_response_type() -> String {
    "code".to_string()
}

/// Emitted by a remote skill instead of a normal task state when it needs a
/// secondary credential. Single use, tied to one task.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthChallenge {
    /// The authorization server's authorization endpoint.
    pub authorization_endpoint: String,
    /// The authorization server's token endpoint.
    pub token_endpoint: String,
    /// Scopes the skill requires for the escalated operation.
    #[serde(default)]
    pub scopes: Vec<String>,
    /// Redirect target the skill suggests; the coordinator's configured
    /// redirect URI is used when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_uri: Option<String>,
    /// OAuth2 response type. Always `code` for this flow.
    #[serde(default = "default_response_type")]
    pub response_type: String,
}

impl AuthChallenge {
    /// Extract a challenge from a message's parts.
    ///
    /// Accepts both the nested form `{"auth_request": {...}}` and a bare data
    /// part whose object is the challenge itself.
    pub fn from_parts(parts: &[Part]) -> Option<Self> {
        parts.iter().filter_map(Part::as_data).find_map(|data| {
            let candidate = data.get(AUTH_REQUEST_KEY).unwrap_or(data);
            serde_json::from_value(candidate.clone()).ok()
        })
    }
}

/// An access token obtained from the external token endpoint, scoped to one
/// escalated operation. Distinct from the user's primary session credential.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StepUpCredential {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl StepUpCredential {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: None,
            expires_in: None,
            scope: None,
        }
    }

    /// The data part carried by a resume message:
    /// `{"auth_credentials": {"accessToken": ...}}`.
    pub fn to_part(&self) -> Part {
        Part::data(json!({
            AUTH_CREDENTIALS_KEY: {
                "accessToken": self.access_token,
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn challenge_value() -> serde_json::Value {
        json!({
            "authorizationEndpoint": "https://auth.example.com/authorize",
            "tokenEndpoint": "https://auth.example.com/token",
            "scopes": ["booking:write"],
            "redirectUri": "https://app.example.com/auth/callback"
        })
    }

    #[test]
    fn challenge_parses_nested_and_bare_forms() {
        let nested = vec![Part::data(json!({ AUTH_REQUEST_KEY: challenge_value() }))];
        let bare = vec![Part::data(challenge_value())];

        for parts in [nested, bare] {
            let challenge = AuthChallenge::from_parts(&parts).unwrap();
            assert_eq!(
                challenge.authorization_endpoint,
                "https://auth.example.com/authorize"
            );
            assert_eq!(challenge.response_type, "code");
            assert_eq!(challenge.scopes, vec!["booking:write"]);
        }
    }

    #[test]
    fn challenge_ignores_text_parts_and_unrelated_data() {
        let parts = vec![
            Part::text("please sign in"),
            Part::data(json!({"weather": "sunny"})),
        ];
        assert!(AuthChallenge::from_parts(&parts).is_none());
    }

    #[test]
    fn credential_part_shape() {
        let part = StepUpCredential::new("tok-123").to_part();
        let data = part.as_data().unwrap();
        assert_eq!(data[AUTH_CREDENTIALS_KEY]["accessToken"], json!("tok-123"));
    }
}
