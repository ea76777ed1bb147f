//! Agent runtime - collaborator orchestration and conversation state
//!
//! This crate wraps the deterministic scoring core with everything stateful
//! and asynchronous:
//! - Talks to the analysis collaborator (`llm`) with timeout and retry
//! - Degrades to a deterministic keyword classifier (`fallback`) on failure
//! - Tracks per-session history and archetype evolution (`session`)
//! - Caches resolved analyses by content fingerprint (`cache`)
//! - Composes all of it into one turn pipeline (`orchestrator`)
//!
//! # Key Types
//!
//! - `AnalysisOrchestrator` - Main entry point (see `orchestrator` module)
//! - `AnalysisClient` - Pluggable trait for the external collaborator
//! - `SessionStore` - In-memory per-session conversation state
//!
//! # Degradation Principle
//!
//! The collaborator is advisory. Every number the caller acts on comes from
//! the deterministic core, and a dead collaborator never takes the turn
//! pipeline down with it.

pub mod cache;
pub mod fallback;
pub mod llm;
pub mod orchestrator;
pub mod session;

pub use cache::ResponseCache;
pub use fallback::{FallbackClassifier, FallbackConfig};
pub use llm::{AnalysisClient, AnalysisPrompt, RetryPolicy};
pub use orchestrator::{AnalysisOrchestrator, TurnOutcome};
pub use session::{
    parse_turn, ArchetypeStamp, EntryKind, HistoryEntry, ParsedTurn, SessionId, SessionState,
    SessionStore,
};
