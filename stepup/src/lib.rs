//! # Step-Up Authentication
//!
//! When a remote skill parks its task in `auth-required`, the conversation
//! cannot proceed until the user authorizes an escalated credential with an
//! external OAuth2 provider. This crate drives that detour:
//!
//! - [`StepUpCoordinator::begin`] mints a PKCE verifier and state token,
//!   stashes a [`PkceSession`], and returns the authorization URL;
//! - the user authorizes in the browser and the provider redirects back with
//!   a code;
//! - [`CallbackReconciler::reconcile`] verifies the state, exchanges the code
//!   at the token endpoint, and resumes the suspended task with the
//!   credential embedded as a data part on the resume message.
//!
//! The session store is single-slot per conversation: starting a new step-up
//! displaces an abandoned one, and a claimed session is gone whether or not
//! the attempt succeeds. The upgraded credential never rides the
//! Authorization header; the primary session token keeps authenticating the
//! transport.

pub mod config;
pub mod coordinator;
pub mod error;
pub mod pkce;
pub mod reconciler;
pub mod session;

pub use config::StepUpConfig;
pub use coordinator::{ResumePoint, ResumedTask, StepUpCoordinator};
pub use error::{StepUpError, StepUpResult};
pub use reconciler::{CallbackParams, CallbackReconciler, ReconcileOutcome};
pub use session::{
    InMemoryAuthStore, PendingAuthStore, PkceSession, ResumedReply, PENDING_AUTH_TTL_MINUTES,
};
