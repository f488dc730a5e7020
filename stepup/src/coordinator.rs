//! Step-up coordination: turning an `auth-required` challenge into an
//! authorization URL, and a returned code into a resumed task.

use std::sync::Arc;

use concierge_a2a_client::{Skill, SendOutcome, TaskClient};
use concierge_a2a_types::{AuthChallenge, StepUpCredential};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::StepUpConfig;
use crate::error::{StepUpError, StepUpResult};
use crate::pkce;
use crate::session::{PendingAuthStore, PkceSession};

/// Where the conversation left off when the challenge arrived. Fed back into
/// the resume turn verbatim once the credential is in hand.
#[derive(Debug, Clone)]
pub struct ResumePoint {
    pub skill: Skill,
    pub task_id: Option<String>,
    pub context_id: Option<String>,
    /// The user message that provoked the challenge, replayed on resume.
    pub original_message: String,
}

/// Outcome of a completed exchange: the resumed task's reply, still tagged
/// with the skill it belongs to.
#[derive(Debug)]
pub struct ResumedTask {
    pub skill: Skill,
    pub outcome: SendOutcome,
    /// The scope string the token endpoint actually granted, when reported.
    pub credential_scope: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorBody {
    error: String,
    error_description: Option<String>,
}

/// Drives the OAuth2 authorization-code + PKCE exchange for one conversation.
///
/// `begin` stashes a [`PkceSession`] and hands back the URL the browser is
/// sent to; `complete` claims the session, exchanges the code at the token
/// endpoint, and resumes the suspended task with the upgraded credential.
pub struct StepUpCoordinator {
    config: StepUpConfig,
    store: Arc<dyn PendingAuthStore>,
    http: reqwest::Client,
}

impl StepUpCoordinator {
    pub fn new(config: StepUpConfig, store: Arc<dyn PendingAuthStore>) -> Self {
        Self::with_http_client(config, store, reqwest::Client::new())
    }

    pub fn with_http_client(
        config: StepUpConfig,
        store: Arc<dyn PendingAuthStore>,
        http: reqwest::Client,
    ) -> Self {
        Self {
            config,
            store,
            http,
        }
    }

    pub fn config(&self) -> &StepUpConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn PendingAuthStore> {
        &self.store
    }

    /// Start a step-up: mint a fresh verifier and state, stash the session,
    /// and return the authorization URL.
    ///
    /// A still-pending session from an abandoned attempt is displaced; only
    /// the newest attempt can ever complete.
    pub fn begin(&self, challenge: &AuthChallenge, resume: ResumePoint) -> StepUpResult<String> {
        let verifier = pkce::generate_verifier();
        let state = pkce::generate_state();
        let code_challenge = pkce::generate_challenge(&verifier);

        let redirect_uri = challenge
            .redirect_uri
            .clone()
            .unwrap_or_else(|| self.config.redirect_uri.clone());

        // Build the URL before stashing so a configuration failure leaves no
        // half-initialized session behind.
        let url = pkce::build_authorization_url(
            challenge,
            &self.config.client_id,
            &redirect_uri,
            &code_challenge,
            &state,
        )?;

        let session = PkceSession {
            verifier,
            state,
            skill: resume.skill,
            task_id: resume.task_id,
            context_id: resume.context_id,
            original_message: resume.original_message,
            token_endpoint: challenge.token_endpoint.clone(),
            redirect_uri,
            created_at: chrono::Utc::now(),
        };

        if let Some(displaced) = self.store.stash(session) {
            debug!(
                skill = %displaced.skill,
                "displacing abandoned step-up session"
            );
        }

        info!(skill = %resume.skill, "step-up authorization started");
        Ok(url)
    }

    /// Finish a step-up: claim the pending session, verify `state`, exchange
    /// the code for a credential, and resume the suspended task.
    ///
    /// The session is consumed before verification, so a failed attempt
    /// cannot be replayed; recovery restarts from [`begin`](Self::begin).
    pub async fn complete(
        &self,
        code: &str,
        state: &str,
        client: &TaskClient,
    ) -> StepUpResult<ResumedTask> {
        let session = self.store.claim().ok_or(StepUpError::NoPendingAuth)?;

        if session.state != state {
            warn!(skill = %session.skill, "authorization state mismatch, discarding session");
            return Err(StepUpError::StateMismatch);
        }

        let credential = self.exchange_code(&session, code).await?;
        let credential_scope = credential.scope.clone();
        info!(skill = %session.skill, "step-up credential obtained, resuming task");

        let outcome = client
            .resume(
                session.skill,
                session.original_message,
                session.context_id,
                session.task_id,
                credential,
            )
            .await?;

        Ok(ResumedTask {
            skill: session.skill,
            outcome,
            credential_scope,
        })
    }

    async fn exchange_code(
        &self,
        session: &PkceSession,
        code: &str,
    ) -> StepUpResult<StepUpCredential> {
        let response = self
            .http
            .post(&session.token_endpoint)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", &session.redirect_uri),
                ("code_verifier", &session.verifier),
                ("client_id", &self.config.client_id),
            ])
            .send()
            .await
            .map_err(|e| StepUpError::Transport {
                message: e.to_string(),
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| StepUpError::Transport {
                message: e.to_string(),
            })?;

        if !status.is_success() {
            let (error, description) = match serde_json::from_str::<TokenErrorBody>(&body) {
                Ok(parsed) => (parsed.error, parsed.error_description),
                Err(_) => (format!("HTTP {status}"), None),
            };
            warn!(%error, "token exchange rejected");
            return Err(StepUpError::TokenExchangeFailed { error, description });
        }

        serde_json::from_str(&body).map_err(|e| StepUpError::TokenExchangeFailed {
            error: "malformed token response".to_string(),
            description: Some(e.to_string()),
        })
    }
}
