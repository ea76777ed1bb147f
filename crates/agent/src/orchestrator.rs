//! Turn orchestration.
//!
//! Composes the collaborator client, fallback classifier, session store,
//! response cache, feature extractor, and scoring engine into a single
//! `handle_turn` entry point. The turn path never returns an error: every
//! collaborator failure degrades to the deterministic fallback so the seller
//! always gets metrics and actions.

use std::time::Duration;

use tracing::{debug, info, warn};

use pulse_core::{
    content_fingerprint, AnalysisError, CollaboratorConfig, ConfigError, FeatureExtractor,
    MetricsResult, ResolvedAnalysis, ScoringConfig, ScoringEngine, TurnSignals,
};

use crate::cache::{ResponseCache, DEFAULT_CAPACITY, DEFAULT_TTL};
use crate::fallback::FallbackClassifier;
use crate::llm::{call_with_retry, AnalysisClient, AnalysisPrompt, RetryPolicy};
use crate::session::{parse_turn, ArchetypeStamp, SessionId, SessionStore};

const SYSTEM_CONTEXT: &str = "You are a sales copilot for an electric-vehicle \
showroom. Analyze the customer's latest message in the context of the \
conversation so far and respond with a single JSON object describing the \
customer archetype, tone, objections, a reply to the customer, a coaching \
note for the seller, and priority discovery questions.";

/// Everything a caller gets back for one conversation turn.
#[derive(Clone, Debug)]
pub struct TurnOutcome {
    pub metrics: MetricsResult,
    pub analysis: ResolvedAnalysis,
    /// Archetype evolution for the session, oldest first, capped.
    pub evolution: Vec<ArchetypeStamp>,
}

/// Drives one conversation turn end to end.
pub struct AnalysisOrchestrator<C> {
    client: C,
    fallback: FallbackClassifier,
    sessions: SessionStore,
    cache: ResponseCache,
    extractor: FeatureExtractor,
    engine: ScoringEngine,
    retry: RetryPolicy,
    timeout: Duration,
}

impl<C: AnalysisClient> AnalysisOrchestrator<C> {
    pub fn new(
        client: C,
        scoring: ScoringConfig,
        collaborator: &CollaboratorConfig,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            client,
            fallback: FallbackClassifier::default(),
            sessions: SessionStore::new(),
            cache: ResponseCache::new(DEFAULT_TTL, DEFAULT_CAPACITY),
            extractor: FeatureExtractor::new(),
            engine: ScoringEngine::new(scoring)?,
            retry: RetryPolicy {
                max_attempts: collaborator.max_retries,
                base_delay_ms: collaborator.base_delay_ms,
                max_delay_ms: collaborator.max_delay_ms,
            },
            timeout: Duration::from_secs(collaborator.timeout_secs),
        })
    }

    pub fn with_defaults(client: C) -> Result<Self, ConfigError> {
        Self::new(client, ScoringConfig::default(), &CollaboratorConfig::default())
    }

    /// Handle one raw seller input for a session. The per-session lock is
    /// held for the whole turn, so turns within a session serialize while
    /// different sessions proceed independently.
    pub async fn handle_turn(
        &self,
        session_id: &SessionId,
        raw_input: &str,
        signals: &TurnSignals,
    ) -> TurnOutcome {
        let session = self.sessions.session(session_id).await;
        let mut state = session.lock().await;

        let turn = parse_turn(raw_input);
        state.record_entry(turn.kind, turn.entry_content);
        let history_summary = state.history_summary();
        let fingerprint = content_fingerprint(&turn.latest_utterance, &history_summary);

        let analysis = match self.cache.get(&fingerprint) {
            Some(cached) => {
                debug!(session = %session_id, "analysis cache hit");
                cached
            }
            None => {
                let analysis =
                    self.resolve_analysis(&turn.latest_utterance, &history_summary).await;
                self.cache.insert(fingerprint, analysis.clone());
                analysis
            }
        };

        state.record_archetype(analysis.archetype.archetype, analysis.archetype.confidence);
        let evolution = state.evolution().to_vec();

        let features = self.extractor.extract(signals, &analysis);
        let metrics = self.engine.score_turn(&features, &analysis, &turn.latest_utterance, signals);
        info!(
            session = %session_id,
            purchase_likelihood = metrics.purchase_likelihood,
            churn_risk = metrics.churn_risk,
            cta = metrics.cta_readiness.as_str(),
            fallback = analysis.fallback,
            "turn scored"
        );

        TurnOutcome { metrics, analysis, evolution }
    }

    async fn resolve_analysis(
        &self,
        latest_utterance: &str,
        history_summary: &str,
    ) -> ResolvedAnalysis {
        let prompt = AnalysisPrompt {
            system_context: SYSTEM_CONTEXT.to_string(),
            history_summary: history_summary.to_string(),
            latest_utterance: latest_utterance.to_string(),
        };
        let resolved: Result<ResolvedAnalysis, AnalysisError> =
            match call_with_retry(&self.client, &prompt, &self.retry, self.timeout).await {
                Ok(raw) => ResolvedAnalysis::from_json(&raw, latest_utterance),
                Err(error) => Err(error),
            };
        match resolved {
            Ok(analysis) => analysis,
            Err(error) => {
                warn!(cause = error.cause(), %error, "collaborator analysis failed, using keyword fallback");
                self.fallback.classify(latest_utterance)
            }
        }
    }
}
