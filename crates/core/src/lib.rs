//! Core scoring engine for real-time customer-interaction analysis.
//!
//! Pure, synchronous logic only: feature extraction, the five behavioral
//! scorers, action recommendation, the closed archetype model, and the
//! validated scoring configuration. Session tracking, caching, and the
//! analysis-collaborator seam live in `pulse-agent`.

pub mod actions;
pub mod analysis;
pub mod archetype;
pub mod config;
pub mod errors;
pub mod features;
pub mod scoring;

pub use actions::{ActionContext, ActionRecommender, MAX_ACTIONS};
pub use analysis::{
    content_fingerprint, ArchetypeMatch, Objection, PriorityQuestion, ResolvedAnalysis,
};
pub use archetype::Archetype;
pub use config::{
    CollaboratorConfig, ConfigError, CtaCascade, DecisionThresholds, PurchaseWeights, ScoringConfig,
};
pub use errors::AnalysisError;
pub use features::{FeatureExtractor, FeatureVector, IntentFlags, RequiredSlots, TurnSignals};
pub use scoring::{ConfidenceLevel, CtaReadiness, MetricsResult, ScoringEngine};
