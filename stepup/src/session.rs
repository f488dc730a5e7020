//! Pending-auth session storage.
//!
//! One conversation can have at most one step-up in flight. The store is a
//! single slot with last-writer-wins stash and consume-once claim, plus a
//! one-shot slot for the resumed task's reply so the conversation layer can
//! pick it up after the browser callback lands.

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use concierge_a2a_client::Skill;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// How long a stashed session stays claimable.
pub const PENDING_AUTH_TTL_MINUTES: i64 = 10;

/// Everything needed to finish the exchange and resume the suspended task
/// once the browser comes back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PkceSession {
    /// The code verifier. Kept server-side only; never leaves the store.
    pub verifier: String,
    /// Anti-forgery token the callback's `state` must match exactly.
    pub state: String,
    /// Which skill suspended its task.
    pub skill: Skill,
    /// Identifier of the suspended task.
    pub task_id: Option<String>,
    /// Conversation context the resume turn must stay inside.
    pub context_id: Option<String>,
    /// The user message that triggered the challenge, replayed on resume.
    pub original_message: String,
    /// Token endpoint from the challenge.
    pub token_endpoint: String,
    /// Redirect URI used in the authorization request; the token exchange
    /// must repeat it verbatim.
    pub redirect_uri: String,
    pub created_at: DateTime<Utc>,
}

impl PkceSession {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now - self.created_at > Duration::minutes(PENDING_AUTH_TTL_MINUTES)
    }
}

/// The resumed task's reply, written once by the callback reconciler and
/// claimed once by the conversation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResumedReply {
    pub skill: Skill,
    pub text: String,
    pub task_id: Option<String>,
    pub context_id: Option<String>,
    /// True when the resume turn itself fell back to a degraded reply.
    pub degraded: bool,
}

/// Storage seam for the pending step-up session. The in-memory store covers
/// a single-process deployment; a shared cache can implement the same trait
/// without touching the coordinator.
pub trait PendingAuthStore: Send + Sync {
    /// Park a session, displacing any previous one. Returns the displaced
    /// session so the caller can log the abandonment.
    fn stash(&self, session: PkceSession) -> Option<PkceSession>;

    /// Take the pending session, leaving the slot empty. Expired sessions
    /// are discarded rather than returned.
    fn claim(&self) -> Option<PkceSession>;

    /// Snapshot the pending session without consuming it.
    fn pending(&self) -> Option<PkceSession>;

    /// Park the resumed task's reply for the conversation layer.
    fn stash_resumed(&self, reply: ResumedReply);

    /// Take the resumed reply, leaving the slot empty.
    fn claim_resumed(&self) -> Option<ResumedReply>;
}

/// Single-slot store backed by process memory.
#[derive(Default)]
pub struct InMemoryAuthStore {
    pending: Mutex<Option<PkceSession>>,
    resumed: Mutex<Option<ResumedReply>>,
}

impl InMemoryAuthStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl PendingAuthStore for InMemoryAuthStore {
    fn stash(&self, session: PkceSession) -> Option<PkceSession> {
        lock(&self.pending).replace(session)
    }

    fn claim(&self) -> Option<PkceSession> {
        let session = lock(&self.pending).take()?;
        if session.is_expired(Utc::now()) {
            warn!(
                skill = %session.skill,
                "discarding expired pending-auth session"
            );
            return None;
        }
        Some(session)
    }

    fn pending(&self) -> Option<PkceSession> {
        lock(&self.pending).clone()
    }

    fn stash_resumed(&self, reply: ResumedReply) {
        lock(&self.resumed).replace(reply);
    }

    fn claim_resumed(&self) -> Option<ResumedReply> {
        lock(&self.resumed).take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(state: &str) -> PkceSession {
        PkceSession {
            verifier: "verifier".to_string(),
            state: state.to_string(),
            skill: Skill::Booking,
            task_id: Some("task-1".to_string()),
            context_id: Some("ctx-1".to_string()),
            original_message: "Book the 10am flight".to_string(),
            token_endpoint: "https://auth.example.com/token".to_string(),
            redirect_uri: "https://app.example.com/auth/callback".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn stash_is_last_writer_wins() {
        let store = InMemoryAuthStore::new();
        assert!(store.stash(session("first")).is_none());

        let displaced = store.stash(session("second")).unwrap();
        assert_eq!(displaced.state, "first");
        assert_eq!(store.claim().unwrap().state, "second");
    }

    #[test]
    fn claim_consumes_the_slot() {
        let store = InMemoryAuthStore::new();
        store.stash(session("only"));

        assert!(store.claim().is_some());
        assert!(store.claim().is_none());
    }

    #[test]
    fn expired_sessions_are_not_claimable() {
        let store = InMemoryAuthStore::new();
        let mut stale = session("old");
        stale.created_at = Utc::now() - Duration::minutes(PENDING_AUTH_TTL_MINUTES + 1);
        store.stash(stale);

        assert!(store.claim().is_none());
    }

    #[test]
    fn resumed_reply_is_one_shot() {
        let store = InMemoryAuthStore::new();
        store.stash_resumed(ResumedReply {
            skill: Skill::Booking,
            text: "Booked!".to_string(),
            task_id: Some("task-1".to_string()),
            context_id: Some("ctx-1".to_string()),
            degraded: false,
        });

        assert_eq!(store.claim_resumed().unwrap().text, "Booked!");
        assert!(store.claim_resumed().is_none());
    }
}
