//! Task client for calling remote A2A skills.
//!
//! One `TaskClient` serves one user conversation. It builds `message/send`
//! requests, correlates the long-lived conversation context with per-skill
//! tasks, recovers when the remote side forgets a task, and degrades to a
//! locally synthesized reply when the transport is down.

use crate::error::{ClientResult, TaskClientError};
use crate::outcome::{fallback_reply, DegradedReply, ReplyState, SendOutcome, TaskReply};
use crate::skill::Skill;
use concierge_a2a_types::{
    AuthChallenge, JsonRpcErrorResponse, JsonRpcId, Message, MessageRole, MessageSendConfiguration,
    MessageSendParams, SendMessageResult, StepUpCredential, Task, TaskState, JSONRPC_VERSION,
    MESSAGE_KIND,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, warn};
use uuid::Uuid;

const SEND_MESSAGE_METHOD: &str = "message/send";

/// JSON-RPC 2.0 request structure
#[derive(Debug, Serialize)]
struct JsonRpcRequest<T> {
    jsonrpc: String,
    id: JsonRpcId,
    method: String,
    params: T,
}

/// JSON-RPC 2.0 response structure
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonRpcResponse<T> {
    Success {
        #[allow(dead_code)]
        jsonrpc: String,
        #[allow(dead_code)]
        id: Option<JsonRpcId>,
        result: T,
    },
    Error(JsonRpcErrorResponse),
}

/// One outgoing conversational turn with explicit correlation identifiers.
///
/// `send` fills the identifiers from the client's caches; the step-up resume
/// path supplies them from the persisted session instead, since the in-memory
/// caches do not survive the authorization redirect.
#[derive(Debug, Clone)]
pub struct OutboundTurn {
    pub skill: Skill,
    pub text: String,
    pub context_id: Option<String>,
    pub task_id: Option<String>,
    /// Present on the resume turn after step-up; travels as a data part.
    pub step_up: Option<StepUpCredential>,
}

/// Client for one conversation with the remote travel skills.
///
/// Explicitly constructed and dependency-injected per conversation; sharing an
/// instance across conversations would leak task correlation state between
/// users.
pub struct TaskClient {
    http: Client,
    endpoints: HashMap<Skill, String>,
    /// The user's primary session token, sent as a Bearer header. Unaffected
    /// by step-up: the upgraded credential rides the message payload instead.
    bearer_token: Option<String>,
    request_id_counter: AtomicU64,
    task_ids: Mutex<HashMap<Skill, String>>,
    context_id: Mutex<Option<String>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl TaskClient {
    /// Create a client with a default `reqwest::Client`.
    pub fn new(endpoints: HashMap<Skill, String>) -> Self {
        Self::with_client(endpoints, Client::new())
    }

    /// Create a client with a preconfigured `reqwest::Client` (timeouts,
    /// proxies, TLS config).
    pub fn with_client(endpoints: HashMap<Skill, String>, http: Client) -> Self {
        Self {
            http,
            endpoints,
            bearer_token: None,
            request_id_counter: AtomicU64::new(1),
            task_ids: Mutex::new(HashMap::new()),
            context_id: Mutex::new(None),
        }
    }

    /// Set the user's primary session token (builder pattern).
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    // === Correlation caches ===
    //
    // Exposed for inspection and reset: the caches are rebuildable from the
    // next server response and must be treated as stale after the step-up
    // redirect returns in a fresh process.

    pub fn task_id(&self, skill: Skill) -> Option<String> {
        lock(&self.task_ids).get(&skill).cloned()
    }

    pub fn set_task_id(&self, skill: Skill, task_id: impl Into<String>) {
        lock(&self.task_ids).insert(skill, task_id.into());
    }

    pub fn clear_task_id(&self, skill: Skill) {
        lock(&self.task_ids).remove(&skill);
    }

    pub fn context_id(&self) -> Option<String> {
        lock(&self.context_id).clone()
    }

    pub fn set_context_id(&self, context_id: impl Into<String>) {
        *lock(&self.context_id) = Some(context_id.into());
    }

    /// Drop all correlation state, e.g. when the conversation restarts.
    pub fn reset(&self) {
        lock(&self.task_ids).clear();
        *lock(&self.context_id) = None;
    }

    /// Send one user turn to a skill, correlating with the cached context and
    /// task identifiers.
    pub async fn send(&self, skill: Skill, text: impl Into<String>) -> ClientResult<SendOutcome> {
        let text = text.into();
        let turn = OutboundTurn {
            skill,
            context_id: self.context_id(),
            task_id: self.task_id(skill),
            text,
            step_up: None,
        };
        self.send_turn(turn).await
    }

    /// Resume a suspended task after step-up, embedding the upgraded
    /// credential as a structured data part of the outgoing message.
    ///
    /// The identifiers come from the persisted pending-auth session, not from
    /// the in-memory caches.
    pub async fn resume(
        &self,
        skill: Skill,
        text: impl Into<String>,
        context_id: Option<String>,
        task_id: Option<String>,
        credential: StepUpCredential,
    ) -> ClientResult<SendOutcome> {
        let turn = OutboundTurn {
            skill,
            text: text.into(),
            context_id,
            task_id,
            step_up: Some(credential),
        };
        self.send_turn(turn).await
    }

    /// Send one turn with explicit correlation identifiers.
    ///
    /// Retries exactly once when the remote reports the referenced task as
    /// unknown: the cached task id is cleared and the turn is replayed with
    /// the same context id and no task id, starting a new task in the same
    /// conversation. A second failure of the same kind is fatal.
    pub async fn send_turn(&self, turn: OutboundTurn) -> ClientResult<SendOutcome> {
        let endpoint = self.endpoints.get(&turn.skill).cloned().ok_or_else(|| {
            TaskClientError::InvalidParameter {
                message: format!("no endpoint configured for skill '{}'", turn.skill),
            }
        })?;

        match self.dispatch(&endpoint, &turn).await? {
            Dispatch::Result(result) => Ok(SendOutcome::Reply(self.absorb(turn.skill, result))),
            Dispatch::Degraded(reason) => Ok(self.degrade(turn.skill, reason)),
            Dispatch::Error(error) => {
                if !(error.is_task_not_found() && turn.task_id.is_some()) {
                    return Err(TaskClientError::Protocol {
                        code: error.code,
                        message: error.message,
                    });
                }

                warn!(
                    skill = %turn.skill,
                    task_id = turn.task_id.as_deref(),
                    "remote forgot task; retrying once without a task id"
                );
                self.clear_task_id(turn.skill);

                let retry = OutboundTurn {
                    task_id: None,
                    ..turn
                };
                match self.dispatch(&endpoint, &retry).await? {
                    Dispatch::Result(result) => {
                        Ok(SendOutcome::Reply(self.absorb(retry.skill, result)))
                    }
                    Dispatch::Degraded(reason) => Ok(self.degrade(retry.skill, reason)),
                    // No further auto-retry: a permanently broken remote must
                    // not trap us in a loop.
                    Dispatch::Error(second) => Err(TaskClientError::Protocol {
                        code: second.code,
                        message: second.message,
                    }),
                }
            }
        }
    }

    /// One HTTP round trip: build the message, post it, classify the response.
    async fn dispatch(&self, endpoint: &str, turn: &OutboundTurn) -> ClientResult<Dispatch> {
        let params = MessageSendParams {
            message: build_message(turn),
            configuration: Some(MessageSendConfiguration {
                blocking: Some(true),
                history_length: None,
                accepted_output_modes: vec!["text".to_string()],
            }),
        };

        let request_id = self.next_request_id();
        let rpc_request = JsonRpcRequest {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id: request_id,
            method: SEND_MESSAGE_METHOD.to_string(),
            params,
        };

        let mut req = self
            .http
            .post(endpoint)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .json(&rpc_request);

        if let Some(token) = &self.bearer_token {
            req = req.bearer_auth(token);
        }

        let response = match req.send().await {
            Ok(response) => response,
            Err(error) => return Ok(Dispatch::Degraded(error.to_string())),
        };

        let status = response.status();
        if !status.is_success() {
            // Some gateways return a JSON-RPC error body with a non-2xx
            // status; treat that as a protocol error rather than an outage.
            let body = response.text().await.unwrap_or_default();
            if let Ok(error_response) = serde_json::from_str::<JsonRpcErrorResponse>(&body) {
                return Ok(Dispatch::Error(error_response.error));
            }
            return Ok(Dispatch::Degraded(format!("HTTP {status}")));
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(error) => return Ok(Dispatch::Degraded(error.to_string())),
        };

        let parsed: JsonRpcResponse<SendMessageResult> =
            serde_json::from_str(&body).map_err(|error| TaskClientError::Serialization {
                message: format!("failed to parse {SEND_MESSAGE_METHOD} response: {error}"),
            })?;

        match parsed {
            JsonRpcResponse::Success { result, .. } => Ok(Dispatch::Result(result)),
            JsonRpcResponse::Error(error_response) => Ok(Dispatch::Error(error_response.error)),
        }
    }

    /// Normalize a successful result and refresh the correlation caches.
    fn absorb(&self, skill: Skill, result: SendMessageResult) -> TaskReply {
        match result {
            SendMessageResult::Task(task) => {
                self.set_context_id(task.context_id.clone());
                self.set_task_id(skill, task.id.clone());

                let state = ReplyState::from(task.status.state);
                let challenge = if task.status.state == TaskState::AuthRequired {
                    task.status
                        .message
                        .as_ref()
                        .and_then(|message| AuthChallenge::from_parts(&message.parts))
                } else {
                    None
                };

                debug!(skill = %skill, task_id = %task.id, state = ?state, "task reply");
                TaskReply {
                    text: extract_reply_text(&task),
                    state,
                    task_id: Some(task.id),
                    context_id: Some(task.context_id),
                    challenge,
                }
            }
            SendMessageResult::Message(message) => {
                if let Some(context_id) = &message.context_id {
                    self.set_context_id(context_id.clone());
                }
                let challenge = AuthChallenge::from_parts(&message.parts);
                let state = if challenge.is_some() {
                    ReplyState::NeedsAuth
                } else {
                    ReplyState::Completed
                };
                TaskReply {
                    text: message.text(),
                    state,
                    task_id: message.task_id.clone(),
                    context_id: message.context_id.clone(),
                    challenge,
                }
            }
        }
    }

    /// Build the degraded outcome. Leaves every cache untouched.
    fn degrade(&self, skill: Skill, reason: String) -> SendOutcome {
        warn!(skill = %skill, reason = %reason, "transport failure; returning degraded reply");
        SendOutcome::Degraded(DegradedReply {
            skill,
            text: fallback_reply(skill),
            reason,
        })
    }

    fn next_request_id(&self) -> JsonRpcId {
        let id = self.request_id_counter.fetch_add(1, Ordering::SeqCst);
        JsonRpcId::Integer(id as i64)
    }
}

/// Assemble the outgoing user message for one turn.
fn build_message(turn: &OutboundTurn) -> Message {
    let mut parts = vec![concierge_a2a_types::Part::text(turn.text.clone())];
    if let Some(credential) = &turn.step_up {
        parts.push(credential.to_part());
    }

    Message {
        kind: MESSAGE_KIND.to_string(),
        message_id: format!("msg_{}", Uuid::new_v4()),
        role: MessageRole::User,
        parts,
        context_id: turn.context_id.clone(),
        task_id: turn.task_id.clone(),
        metadata: None,
    }
}

/// Extract the response text: completed-task artifacts first, status message
/// parts as the fallback. Artifacts and status messages represent two
/// different points in the task state machine (completed vs. awaiting input).
fn extract_reply_text(task: &Task) -> String {
    let artifact_text: Vec<&str> = task
        .artifacts
        .iter()
        .flat_map(|artifact| artifact.parts.iter())
        .filter_map(concierge_a2a_types::Part::as_text)
        .collect();

    if !artifact_text.is_empty() {
        return artifact_text.join("\n");
    }

    task.status
        .message
        .as_ref()
        .map(Message::text)
        .unwrap_or_default()
}

enum Dispatch {
    /// Successful JSON-RPC result.
    Result(SendMessageResult),
    /// Transport-level failure, recovered as a degraded outcome.
    Degraded(String),
    /// Well-formed JSON-RPC error object from the remote.
    Error(concierge_a2a_types::JsonRpcError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use concierge_a2a_types::{Artifact, Part, TaskStatus};

    fn agent_message(parts: Vec<Part>) -> Message {
        Message {
            kind: MESSAGE_KIND.to_string(),
            message_id: "msg-a".to_string(),
            role: MessageRole::Agent,
            parts,
            context_id: Some("ctx-1".to_string()),
            task_id: Some("task-1".to_string()),
            metadata: None,
        }
    }

    fn task(state: TaskState, artifacts: Vec<Artifact>, status_message: Option<Message>) -> Task {
        Task {
            kind: "task".to_string(),
            id: "task-1".to_string(),
            context_id: "ctx-1".to_string(),
            status: TaskStatus {
                state,
                timestamp: None,
                message: status_message,
            },
            history: vec![],
            artifacts,
            metadata: None,
        }
    }

    #[test]
    fn artifacts_take_precedence_over_status_message() {
        let subject = task(
            TaskState::Completed,
            vec![Artifact {
                artifact_id: "a-1".to_string(),
                parts: vec![Part::text("Booked seat 14A.")],
                name: None,
                description: None,
            }],
            Some(agent_message(vec![Part::text("working on it")])),
        );
        assert_eq!(extract_reply_text(&subject), "Booked seat 14A.");
    }

    #[test]
    fn status_message_used_when_no_artifacts() {
        let subject = task(
            TaskState::InputRequired,
            vec![],
            Some(agent_message(vec![Part::text("Which date?")])),
        );
        assert_eq!(extract_reply_text(&subject), "Which date?");
    }

    #[test]
    fn resume_message_carries_credential_data_part() {
        let turn = OutboundTurn {
            skill: Skill::Booking,
            text: "Book the 10am flight".to_string(),
            context_id: Some("ctx-1".to_string()),
            task_id: Some("task-1".to_string()),
            step_up: Some(StepUpCredential::new("tok-9")),
        };
        let message = build_message(&turn);

        assert_eq!(message.role, MessageRole::User);
        assert_eq!(message.task_id.as_deref(), Some("task-1"));
        assert_eq!(message.parts.len(), 2);
        let data = message.parts[1].as_data().unwrap();
        assert_eq!(data["auth_credentials"]["accessToken"], "tok-9");
    }

    #[test]
    fn cache_accessors_round_trip() {
        let client = TaskClient::new(HashMap::new());
        assert!(client.task_id(Skill::Booking).is_none());

        client.set_task_id(Skill::Booking, "task-7");
        client.set_context_id("ctx-7");
        assert_eq!(client.task_id(Skill::Booking).as_deref(), Some("task-7"));
        assert!(client.task_id(Skill::FlightSearch).is_none());
        assert_eq!(client.context_id().as_deref(), Some("ctx-7"));

        client.clear_task_id(Skill::Booking);
        assert!(client.task_id(Skill::Booking).is_none());

        client.set_task_id(Skill::FlightSearch, "task-8");
        client.reset();
        assert!(client.task_id(Skill::FlightSearch).is_none());
        assert!(client.context_id().is_none());
    }

    #[tokio::test]
    async fn send_turn_without_endpoint_is_invalid_parameter() {
        let client = TaskClient::new(HashMap::new());
        let turn = OutboundTurn {
            skill: Skill::FlightSearch,
            text: "hi".to_string(),
            context_id: None,
            task_id: None,
            step_up: None,
        };
        let result = client.send_turn(turn).await;
        assert!(matches!(
            result,
            Err(TaskClientError::InvalidParameter { .. })
        ));
    }
}
