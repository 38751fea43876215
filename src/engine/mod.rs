//! Session Engine
//!
//! Conversation state, the review workflow, and the command dispatch that
//! ties them to a provider and a host document.

pub mod command;
pub mod conversation;
pub mod review;

pub use command::{CandidateView, Command, Engine, EngineState};
pub use conversation::{ConversationStore, RequestGuard, HISTORY_KEY};
pub use review::{CandidateStatus, DocumentHost, ReviewCandidate, ReviewSession};
