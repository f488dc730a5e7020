//! Callback reconciliation.
//!
//! The browser lands on the app's redirect URI with either a code + state
//! pair or a provider error. The reconciler validates the pair, drives the
//! coordinator, parks the resumed reply for the conversation layer, and
//! answers with where to send the browser next. Replays of the same code are
//! short-circuited instead of re-exchanged.

use std::collections::HashMap;
use std::sync::Mutex;

use concierge_a2a_client::{SendOutcome, TaskClient};
use tracing::{debug, warn};

use crate::coordinator::StepUpCoordinator;
use crate::error::StepUpError;
use crate::session::ResumedReply;

/// Query parameters of the authorization callback.
#[derive(Debug, Clone, Default)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
}

impl CallbackParams {
    /// Build from decoded query pairs; unrecognized keys are ignored.
    pub fn from_query_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut params = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "code" => params.code = Some(value),
                "state" => params.state = Some(value),
                "error" => params.error = Some(value),
                "error_description" => params.error_description = Some(value),
                _ => {}
            }
        }
        params
    }
}

/// What the callback handler should do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Exchange and resume succeeded; redirect the browser back into the
    /// conversation. The resumed reply waits in the store.
    Resumed { redirect_to: String },
    /// The provider declined or the user canceled. Surfaced verbatim.
    Denied {
        error: String,
        description: Option<String>,
    },
    /// The callback could not be honored. State mismatches deliberately
    /// surface the same generic message as other failures.
    Failed { message: String },
}

/// Processes authorization callbacks exactly once per code.
pub struct CallbackReconciler {
    coordinator: StepUpCoordinator,
    processed: Mutex<HashMap<String, ReconcileOutcome>>,
}

impl CallbackReconciler {
    pub fn new(coordinator: StepUpCoordinator) -> Self {
        Self {
            coordinator,
            processed: Mutex::new(HashMap::new()),
        }
    }

    pub fn coordinator(&self) -> &StepUpCoordinator {
        &self.coordinator
    }

    /// Reconcile one callback. Idempotent per authorization code: the first
    /// outcome is recorded and replays get it back without a second token
    /// exchange.
    pub async fn reconcile(&self, params: CallbackParams, client: &TaskClient) -> ReconcileOutcome {
        if let Some(error) = params.error {
            warn!(%error, "authorization denied by provider");
            return ReconcileOutcome::Denied {
                error,
                description: params.error_description,
            };
        }

        let (code, state) = match (params.code, params.state) {
            (Some(code), Some(state)) => (code, state),
            _ => {
                return ReconcileOutcome::Failed {
                    message: "callback is missing code or state".to_string(),
                }
            }
        };

        if let Some(previous) = self.recorded(&code) {
            debug!("authorization code already processed, short-circuiting");
            return previous;
        }

        let outcome = match self.coordinator.complete(&code, &state, client).await {
            Ok(resumed) => {
                let store = self.coordinator.store();
                store.stash_resumed(resumed_reply(&resumed.outcome, resumed.skill));
                ReconcileOutcome::Resumed {
                    redirect_to: self.coordinator.config().return_path.clone(),
                }
            }
            Err(StepUpError::StateMismatch | StepUpError::NoPendingAuth) => {
                ReconcileOutcome::Failed {
                    message: "the sign-in response could not be verified; please try again"
                        .to_string(),
                }
            }
            Err(error) => ReconcileOutcome::Failed {
                message: error.to_string(),
            },
        };

        self.record(code, outcome.clone());
        outcome
    }

    fn recorded(&self, code: &str) -> Option<ReconcileOutcome> {
        self.processed
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .get(code)
            .cloned()
    }

    fn record(&self, code: String, outcome: ReconcileOutcome) {
        self.processed
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .insert(code, outcome);
    }
}

fn resumed_reply(outcome: &SendOutcome, skill: concierge_a2a_client::Skill) -> ResumedReply {
    match outcome {
        SendOutcome::Reply(reply) => ResumedReply {
            skill,
            text: reply.text.clone(),
            task_id: reply.task_id.clone(),
            context_id: reply.context_id.clone(),
            degraded: false,
        },
        SendOutcome::Degraded(degraded) => ResumedReply {
            skill,
            text: degraded.text.clone(),
            task_id: None,
            context_id: None,
            degraded: true,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_parse_from_query_pairs() {
        let params = CallbackParams::from_query_pairs([
            ("code".to_string(), "abc".to_string()),
            ("state".to_string(), "xyz".to_string()),
            ("utm_source".to_string(), "mail".to_string()),
        ]);

        assert_eq!(params.code.as_deref(), Some("abc"));
        assert_eq!(params.state.as_deref(), Some("xyz"));
        assert!(params.error.is_none());
    }
}
