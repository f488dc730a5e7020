//! Normalized results returned by the task client.
//!
//! The split between `Reply` and `Degraded` is deliberate: callers can tell
//! "the remote answered" apart from "the remote is down and a locally
//! synthesized answer was substituted" without inspecting flags inside the
//! payload. The fatal leg is `TaskClientError`.

use crate::skill::Skill;
use concierge_a2a_types::{AuthChallenge, TaskState};

/// The task lifecycle point observed by the client, collapsed to what the
/// conversation layer acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyState {
    /// Terminal success; artifacts carry the answer.
    Completed,
    /// The skill is waiting for another conversational turn on the same task.
    NeedsInput,
    /// The skill suspended the task pending a step-up credential.
    NeedsAuth,
    /// Terminal failure (failed, canceled, or rejected remotely).
    Failed,
    /// Anything else (submitted/working should not surface from a blocking send).
    Unknown,
}

impl From<TaskState> for ReplyState {
    fn from(state: TaskState) -> Self {
        match state {
            TaskState::Completed => ReplyState::Completed,
            TaskState::InputRequired => ReplyState::NeedsInput,
            TaskState::AuthRequired => ReplyState::NeedsAuth,
            TaskState::Failed | TaskState::Canceled | TaskState::Rejected => ReplyState::Failed,
            TaskState::Submitted | TaskState::Working | TaskState::Unknown => ReplyState::Unknown,
        }
    }
}

/// A normalized remote response.
#[derive(Debug, Clone)]
pub struct TaskReply {
    /// Response text, extracted preferentially from completed-task artifacts,
    /// falling back to the status message parts.
    pub text: String,
    pub state: ReplyState,
    /// Task id learned from the response, if the remote opened or continued a task.
    pub task_id: Option<String>,
    /// Context id learned from the response.
    pub context_id: Option<String>,
    /// Present exactly when `state` is `NeedsAuth` and the skill attached a
    /// parseable challenge.
    pub challenge: Option<AuthChallenge>,
}

/// A locally synthesized answer substituted when the remote skill is unreachable.
#[derive(Debug, Clone)]
pub struct DegradedReply {
    pub skill: Skill,
    pub text: String,
    /// Transport-level cause, for logs and diagnostics.
    pub reason: String,
}

/// Outcome of a send: the remote answered, or transport failed and the client
/// degraded. Protocol errors are not an outcome; they are `TaskClientError`.
#[derive(Debug, Clone)]
pub enum SendOutcome {
    Reply(TaskReply),
    Degraded(DegradedReply),
}

impl SendOutcome {
    pub fn text(&self) -> &str {
        match self {
            SendOutcome::Reply(reply) => &reply.text,
            SendOutcome::Degraded(degraded) => &degraded.text,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, SendOutcome::Degraded(_))
    }

    pub fn as_reply(&self) -> Option<&TaskReply> {
        match self {
            SendOutcome::Reply(reply) => Some(reply),
            SendOutcome::Degraded(_) => None,
        }
    }
}

/// The locally synthesized reply used when a skill's transport is down.
pub fn fallback_reply(skill: Skill) -> String {
    match skill {
        Skill::FlightSearch => "The flight search service is temporarily unreachable. \
             Your conversation is preserved; please try again in a moment."
            .to_string(),
        Skill::Booking => "The booking service is temporarily unreachable. \
             No reservation was made; please try again in a moment."
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_mapping_collapses_terminal_failures() {
        assert_eq!(ReplyState::from(TaskState::Failed), ReplyState::Failed);
        assert_eq!(ReplyState::from(TaskState::Canceled), ReplyState::Failed);
        assert_eq!(ReplyState::from(TaskState::Rejected), ReplyState::Failed);
        assert_eq!(
            ReplyState::from(TaskState::AuthRequired),
            ReplyState::NeedsAuth
        );
        assert_eq!(ReplyState::from(TaskState::Working), ReplyState::Unknown);
    }

    #[test]
    fn fallback_text_mentions_no_side_effects_for_booking() {
        assert!(fallback_reply(Skill::Booking).contains("No reservation"));
    }
}
