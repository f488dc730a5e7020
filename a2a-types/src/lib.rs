//! # A2A Task Protocol Types
//!
//! Serde data structures for the subset of the A2A (Agent2Agent) protocol the
//! concierge conversation layer speaks to its remote skills: JSON-RPC 2.0
//! envelopes, `Task`/`Message`/`Part` payloads, and the step-up authentication
//! types exchanged when a skill escalates (`AuthChallenge` inbound,
//! `StepUpCredential` outbound).
//!
//! These types carry no I/O; the transport lives in `concierge-a2a-client`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub mod auth;
pub use auth::{AuthChallenge, StepUpCredential, AUTH_CREDENTIALS_KEY, AUTH_REQUEST_KEY};

// ============================================================================
// JSON-RPC 2.0 Base Types
// ============================================================================

/// JSON-RPC version string. MUST be exactly "2.0".
pub const JSONRPC_VERSION: &str = "2.0";

/// Represents a JSON-RPC 2.0 identifier, which can be a string, number, or null.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum JsonRpcId {
    String(String),
    Integer(i64),
    Null,
}

/// Represents a JSON-RPC 2.0 Error object, included in an error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// A number that indicates the error type that occurred.
    pub code: i32,
    /// A string providing a short description of the error.
    pub message: String,
    /// A primitive or structured value containing additional information about the error.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl JsonRpcError {
    /// Whether this error means the referenced task id is unknown to the remote side.
    ///
    /// Conforming agents use the A2A `TaskNotFound` code; some deployed agents
    /// only say so in the message text, so both forms are recognized.
    pub fn is_task_not_found(&self) -> bool {
        if self.code == TASK_NOT_FOUND_ERROR_CODE {
            return true;
        }
        let message = self.message.to_ascii_lowercase();
        message.contains("task")
            && (message.contains("not found")
                || message.contains("does not exist")
                || message.contains("doesn't exist"))
    }
}

/// Represents a JSON-RPC 2.0 Error Response object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcErrorResponse {
    /// The version of the JSON-RPC protocol. MUST be exactly "2.0".
    pub jsonrpc: String,
    /// An object describing the error that occurred.
    pub error: JsonRpcError,
    /// The identifier established by the client.
    pub id: Option<JsonRpcId>,
}

// Error code constants (JSON-RPC 2.0 plus the A2A-specific range).
pub const JSON_PARSE_ERROR_CODE: i32 = -32700;
pub const INVALID_REQUEST_ERROR_CODE: i32 = -32600;
pub const METHOD_NOT_FOUND_ERROR_CODE: i32 = -32601;
pub const INVALID_PARAMS_ERROR_CODE: i32 = -32602;
pub const INTERNAL_ERROR_CODE: i32 = -32603;
/// A2A-specific: the requested task ID was not found on the remote side.
pub const TASK_NOT_FOUND_ERROR_CODE: i32 = -32001;

// ============================================================================
// A2A Core Protocol Types
// ============================================================================

/// Defines the lifecycle states of a Task.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum TaskState {
    /// The task has been submitted and is awaiting execution.
    Submitted,
    /// The agent is actively working on the task.
    Working,
    /// The task is paused and waiting for input from the user.
    InputRequired,
    /// The task has been successfully completed.
    Completed,
    /// The task has been canceled by the user.
    Canceled,
    /// The task failed due to an error during execution.
    Failed,
    /// The task was rejected by the agent and was not started.
    Rejected,
    /// The task requires an additional credential to proceed.
    AuthRequired,
    /// The task is in an unknown or indeterminate state.
    Unknown,
}

impl TaskState {
    /// Non-terminal states expect a follow-up send/resume correlated by the
    /// same task id; terminal states end the task's lifecycle.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskState::Completed | TaskState::Canceled | TaskState::Failed | TaskState::Rejected
        )
    }
}

/// Represents the status of a task at a specific point in time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskStatus {
    /// The current state of the task's lifecycle.
    pub state: TaskState,
    /// An ISO 8601 datetime string indicating when this status was recorded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    /// An optional message providing more details about the current status.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
}

/// Represents a single, stateful unit of work inside a conversation context.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Task {
    /// The type of this object, used as a discriminator. Always 'task'.
    #[serde(default = "default_task_kind")]
    pub kind: String,
    /// A unique identifier for the task, generated by the server for a new task.
    pub id: String,
    /// A server-generated identifier for maintaining context across multiple related tasks.
    #[serde(rename = "contextId")]
    pub context_id: String,
    /// The current status of the task, including its state and a descriptive message.
    pub status: TaskStatus,
    /// Messages exchanged during the task, representing the conversation history.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub history: Vec<Message>,
    /// Structured outputs generated by the agent during the execution of the task.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub artifacts: Vec<Artifact>,
    /// Optional metadata for extensions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

fn default_task_kind() -> String {
    TASK_KIND.to_string()
}

/// Identifies the sender of a message.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// For messages sent by the client/user.
    User,
    /// For messages sent by the agent/service.
    Agent,
}

/// Represents a single message in the conversation between a user and a skill.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// The type of this object, used as a discriminator. Always 'message'.
    #[serde(default = "default_message_kind")]
    pub kind: String,
    /// A unique identifier for the message, generated by the sender.
    #[serde(rename = "messageId")]
    pub message_id: String,
    /// Identifies the sender of the message.
    pub role: MessageRole,
    /// An ordered sequence of content parts that form the message body.
    pub parts: Vec<Part>,
    /// The context identifier for this message, used to group related interactions.
    #[serde(skip_serializing_if = "Option::is_none", rename = "contextId")]
    pub context_id: Option<String>,
    /// The identifier of the task this message is part of. Omitted for the
    /// first message of a new task.
    #[serde(skip_serializing_if = "Option::is_none", rename = "taskId")]
    pub task_id: Option<String>,
    /// Optional metadata for extensions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, serde_json::Value>>,
}

fn default_message_kind() -> String {
    MESSAGE_KIND.to_string()
}

impl Message {
    /// Concatenated text content of all text parts.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(Part::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A discriminated union representing a part of a message or artifact.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Part {
    /// Represents a text segment.
    Text {
        /// The string content of the text part.
        text: String,
        /// Optional metadata associated with this part.
        #[serde(skip_serializing_if = "Option::is_none")]
        metadata: Option<HashMap<String, serde_json::Value>>,
    },
    /// Represents a file segment.
    File {
        /// The file content, represented as either a URI or as base64-encoded bytes.
        file: FileContent,
        /// Optional metadata associated with this part.
        #[serde(skip_serializing_if = "Option::is_none")]
        metadata: Option<HashMap<String, serde_json::Value>>,
    },
    /// Represents a structured data segment (e.g., JSON).
    Data {
        /// The structured data content.
        data: serde_json::Value,
        /// Optional metadata associated with this part.
        #[serde(skip_serializing_if = "Option::is_none")]
        metadata: Option<HashMap<String, serde_json::Value>>,
    },
}

impl Part {
    /// Build a plain text part.
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text {
            text: text.into(),
            metadata: None,
        }
    }

    /// Build a structured data part.
    pub fn data(data: serde_json::Value) -> Self {
        Part::Data {
            data,
            metadata: None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn as_data(&self) -> Option<&serde_json::Value> {
        match self {
            Part::Data { data, .. } => Some(data),
            _ => None,
        }
    }
}

/// Represents file content, which can be provided either directly as bytes or as a URI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum FileContent {
    WithBytes(FileWithBytes),
    WithUri(FileWithUri),
}

/// Represents a file with its content provided directly as a base64-encoded string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileWithBytes {
    /// The base64-encoded content of the file.
    pub bytes: String,
    /// The MIME type of the file.
    #[serde(skip_serializing_if = "Option::is_none", rename = "mimeType")]
    pub mime_type: Option<String>,
    /// An optional name for the file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// Represents a file with its content located at a specific URI.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileWithUri {
    /// A URL pointing to the file's content.
    pub uri: String,
    /// The MIME type of the file.
    #[serde(skip_serializing_if = "Option::is_none", rename = "mimeType")]
    pub mime_type: Option<String>,
    /// An optional name for the file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// A structured output attached to a completed task, distinct from an interim
/// status message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Artifact {
    /// A unique identifier for the artifact within the scope of the task.
    #[serde(rename = "artifactId")]
    pub artifact_id: String,
    /// An array of content parts that make up the artifact.
    pub parts: Vec<Part>,
    /// An optional, human-readable name for the artifact.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// An optional, human-readable description of the artifact.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ============================================================================
// A2A Method Parameter Types
// ============================================================================

/// Defines the parameters for a `message/send` request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageSendParams {
    /// The message object being sent to the agent.
    pub message: Message,
    /// Optional configuration for the send request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub configuration: Option<MessageSendConfiguration>,
}

/// Defines configuration options for a `message/send` request.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MessageSendConfiguration {
    /// If true, the client will wait for the task to complete.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocking: Option<bool>,
    /// The number of most recent messages from the task's history to retrieve.
    #[serde(skip_serializing_if = "Option::is_none", rename = "historyLength")]
    pub history_length: Option<i32>,
    /// A list of output MIME types the client is prepared to accept.
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        rename = "acceptedOutputModes",
        default
    )]
    pub accepted_output_modes: Vec<String>,
}

/// The result of a `message/send` call, which can be a task object or a direct reply.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SendMessageResult {
    Task(Task),
    Message(Message),
}

// Constants for type discriminator values.
pub const TASK_KIND: &str = "task";
pub const MESSAGE_KIND: &str = "message";

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn task_state_round_trips_kebab_case() {
        let state: TaskState = serde_json::from_value(json!("auth-required")).unwrap();
        assert_eq!(state, TaskState::AuthRequired);
        assert_eq!(
            serde_json::to_value(TaskState::InputRequired).unwrap(),
            json!("input-required")
        );
    }

    #[test]
    fn terminality_matches_lifecycle() {
        assert!(TaskState::Completed.is_terminal());
        assert!(TaskState::Failed.is_terminal());
        assert!(!TaskState::InputRequired.is_terminal());
        assert!(!TaskState::AuthRequired.is_terminal());
        assert!(!TaskState::Working.is_terminal());
    }

    #[test]
    fn task_not_found_detected_by_code_and_message() {
        let by_code = JsonRpcError {
            code: TASK_NOT_FOUND_ERROR_CODE,
            message: "Task not found".to_string(),
            data: None,
        };
        assert!(by_code.is_task_not_found());

        let by_message = JsonRpcError {
            code: INTERNAL_ERROR_CODE,
            message: "Task abc-123 does not exist".to_string(),
            data: None,
        };
        assert!(by_message.is_task_not_found());

        let unrelated = JsonRpcError {
            code: INVALID_PARAMS_ERROR_CODE,
            message: "missing message.parts".to_string(),
            data: None,
        };
        assert!(!unrelated.is_task_not_found());
    }

    #[test]
    fn message_deserializes_wire_shape() {
        let message: Message = serde_json::from_value(json!({
            "kind": "message",
            "messageId": "msg-1",
            "role": "agent",
            "parts": [
                {"kind": "text", "text": "Found 3 flights."},
                {"kind": "data", "data": {"flights": 3}}
            ],
            "contextId": "ctx-1",
            "taskId": "task-1"
        }))
        .unwrap();

        assert_eq!(message.role, MessageRole::Agent);
        assert_eq!(message.text(), "Found 3 flights.");
        assert_eq!(message.context_id.as_deref(), Some("ctx-1"));
        assert_eq!(message.parts[1].as_data().unwrap()["flights"], json!(3));
    }

    #[test]
    fn task_tolerates_missing_history_and_artifacts() {
        let task: Task = serde_json::from_value(json!({
            "id": "task-1",
            "contextId": "ctx-1",
            "status": {"state": "working"}
        }))
        .unwrap();

        assert_eq!(task.kind, TASK_KIND);
        assert!(task.history.is_empty());
        assert!(task.artifacts.is_empty());
        assert_eq!(task.status.state, TaskState::Working);
    }
}
