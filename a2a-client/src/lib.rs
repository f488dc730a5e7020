//! # A2A Task Client
//!
//! Client for the remote travel skills spoken to over the A2A protocol
//! (JSON-RPC 2.0 over HTTP POST). One `TaskClient` serves one user
//! conversation and owns the correlation state for it:
//!
//! - a cached conversation context id, learned from the first successful
//!   response and reused across turns;
//! - a per-skill task id cache, so follow-up turns continue the live task;
//! - a single automatic recovery: when the remote reports the referenced task
//!   as unknown, the cached id is dropped and the turn is retried once in the
//!   same context.
//!
//! Transport failures never surface as errors; they resolve to
//! [`SendOutcome::Degraded`] with a locally synthesized reply so the
//! conversation layer can keep rendering. Protocol errors are the fatal leg,
//! [`TaskClientError::Protocol`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use concierge_a2a_client::{Skill, TaskClient};
//! use std::collections::HashMap;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let endpoints = HashMap::from([
//!     (Skill::FlightSearch, "https://flights.example.com/agent".to_string()),
//!     (Skill::Booking, "https://booking.example.com/agent".to_string()),
//! ]);
//! let client = TaskClient::new(endpoints).with_bearer_token("session-token");
//!
//! let outcome = client.send(Skill::FlightSearch, "Flights to Lisbon on Friday?").await?;
//! println!("{}", outcome.text());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod outcome;
pub mod skill;

pub use client::{OutboundTurn, TaskClient};
pub use error::{ClientResult, TaskClientError};
pub use outcome::{fallback_reply, DegradedReply, ReplyState, SendOutcome, TaskReply};
pub use skill::Skill;
