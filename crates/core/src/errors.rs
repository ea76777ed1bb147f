use thiserror::Error;

/// Failures while consulting the external analysis collaborator.
///
/// None of these are fatal to a turn: the orchestrator recovers every variant
/// by routing to the deterministic fallback classifier. They exist so the
/// recovery path can be logged with a precise cause.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum AnalysisError {
    #[error("analysis collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),
    #[error("analysis collaborator timed out after {timeout_secs}s")]
    CollaboratorTimeout { timeout_secs: u64 },
    #[error("collaborator output violates the analysis schema: {0}")]
    MalformedOutput(String),
}

impl AnalysisError {
    /// Short cause tag for structured log fields.
    pub fn cause(&self) -> &'static str {
        match self {
            Self::CollaboratorUnavailable(_) => "unavailable",
            Self::CollaboratorTimeout { .. } => "timeout",
            Self::MalformedOutput(_) => "malformed_output",
        }
    }
}
