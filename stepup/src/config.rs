//! Step-up flow configuration.

use crate::error::{StepUpError, StepUpResult};

pub const CLIENT_ID_ENV: &str = "STEPUP_CLIENT_ID";
pub const REDIRECT_URI_ENV: &str = "STEPUP_REDIRECT_URI";
pub const RETURN_PATH_ENV: &str = "STEPUP_RETURN_PATH";

const DEFAULT_RETURN_PATH: &str = "/chat";

/// Static configuration for the step-up OAuth2 client.
#[derive(Debug, Clone)]
pub struct StepUpConfig {
    /// OAuth2 client identifier registered with the authorization server.
    pub client_id: String,
    /// The app's callback URL, registered as the redirect URI.
    pub redirect_uri: String,
    /// Where the reconciler sends the browser after a successful resume.
    pub return_path: String,
}

impl StepUpConfig {
    pub fn new(client_id: impl Into<String>, redirect_uri: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            redirect_uri: redirect_uri.into(),
            return_path: DEFAULT_RETURN_PATH.to_string(),
        }
    }

    pub fn with_return_path(mut self, return_path: impl Into<String>) -> Self {
        self.return_path = return_path.into();
        self
    }

    /// Load from the environment, failing fast on missing required variables.
    pub fn from_env() -> StepUpResult<Self> {
        let client_id = require_env(CLIENT_ID_ENV)?;
        let redirect_uri = require_env(REDIRECT_URI_ENV)?;
        let return_path =
            std::env::var(RETURN_PATH_ENV).unwrap_or_else(|_| DEFAULT_RETURN_PATH.to_string());
        Ok(Self {
            client_id,
            redirect_uri,
            return_path,
        })
    }
}

fn require_env(key: &str) -> StepUpResult<String> {
    match std::env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(StepUpError::MissingConfiguration {
            field: key.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_return_path_to_chat() {
        let config = StepUpConfig::new("client-1", "https://app.example.com/auth/callback");
        assert_eq!(config.return_path, "/chat");
    }
}
