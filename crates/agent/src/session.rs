//! Per-session conversation state: history segmentation, the answer-marker
//! heuristic, and the archetype-evolution log.
//!
//! Sessions live for the process lifetime; idle eviction is the host's
//! concern. Same-session turns serialize on the session's own mutex, so
//! history appends never interleave. Different sessions share nothing.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};

use pulse_core::Archetype;

/// Most-recent history entries kept per session.
pub const MAX_HISTORY_ENTRIES: usize = 10;
/// Most-recent archetype stamps kept per session.
pub const MAX_EVOLUTION_ENTRIES: usize = 5;

/// Token that marks a turn as an answer to a previously asked question.
const ANSWER_MARKER: &str = "answer:";

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Observation,
    QuestionAnswer,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub kind: EntryKind,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// One archetype resolution, stamped per turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArchetypeStamp {
    pub archetype: Archetype,
    pub confidence: f64,
    pub timestamp: DateTime<Utc>,
}

/// Result of splitting a raw turn into a history entry and the utterance
/// passed downstream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedTurn {
    pub kind: EntryKind,
    pub entry_content: String,
    pub latest_utterance: String,
}

/// Split a raw chat turn. A case-insensitive `answer:` token marks the turn
/// as an answer to a prior question; the text after the first colon becomes
/// the answer and the downstream utterance is synthesized from it.
///
/// This is a fragile free-text heuristic inherited from the chat input
/// format. It is isolated here so a structured turn-type field can replace it
/// without touching the rest of the tracker.
pub fn parse_turn(raw_input: &str) -> ParsedTurn {
    if raw_input.to_ascii_lowercase().contains(ANSWER_MARKER) {
        if let Some((_, rest)) = raw_input.split_once(':') {
            let answer = rest.trim().to_string();
            return ParsedTurn {
                kind: EntryKind::QuestionAnswer,
                entry_content: answer.clone(),
                latest_utterance: format!("customer answered: {answer}"),
            };
        }
    }
    ParsedTurn {
        kind: EntryKind::Observation,
        entry_content: raw_input.to_string(),
        latest_utterance: raw_input.to_string(),
    }
}

#[derive(Clone, Debug, Default)]
pub struct SessionState {
    history: Vec<HistoryEntry>,
    evolution: Vec<ArchetypeStamp>,
}

impl SessionState {
    pub fn record_entry(&mut self, kind: EntryKind, content: impl Into<String>) {
        self.history.push(HistoryEntry { kind, content: content.into(), timestamp: Utc::now() });
        if self.history.len() > MAX_HISTORY_ENTRIES {
            let excess = self.history.len() - MAX_HISTORY_ENTRIES;
            self.history.drain(..excess);
        }
    }

    pub fn record_archetype(&mut self, archetype: Archetype, confidence: f64) {
        self.evolution.push(ArchetypeStamp { archetype, confidence, timestamp: Utc::now() });
        if self.evolution.len() > MAX_EVOLUTION_ENTRIES {
            let excess = self.evolution.len() - MAX_EVOLUTION_ENTRIES;
            self.evolution.drain(..excess);
        }
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    pub fn evolution(&self) -> &[ArchetypeStamp] {
        &self.evolution
    }

    /// Bullet-line context for the analysis prompt, covering every entry
    /// except the newest (the newest is the utterance under analysis).
    pub fn history_summary(&self) -> String {
        let mut summary = String::new();
        let context_entries = self.history.len().saturating_sub(1);
        for entry in &self.history[..context_entries] {
            let label = match entry.kind {
                EntryKind::Observation => "Observation",
                EntryKind::QuestionAnswer => "Answer to question",
            };
            summary.push_str("- ");
            summary.push_str(label);
            summary.push_str(": ");
            summary.push_str(&entry.content);
            summary.push('\n');
        }
        summary.trim_end().to_string()
    }
}

/// Process-wide session registry. The outer lock only guards the map; each
/// session carries its own mutex so turns for one session serialize without
/// blocking other sessions.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<SessionId, Arc<Mutex<SessionState>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the state handle for a session, creating it on first use.
    pub async fn session(&self, id: &SessionId) -> Arc<Mutex<SessionState>> {
        {
            let sessions = self.sessions.read().await;
            if let Some(state) = sessions.get(id) {
                return Arc::clone(state);
            }
        }
        let mut sessions = self.sessions.write().await;
        Arc::clone(sessions.entry(id.clone()).or_default())
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}
