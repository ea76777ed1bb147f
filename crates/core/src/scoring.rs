//! Scoring engine: five behavioral metrics per conversation turn.
//!
//! All scorers are pure functions of the feature vector, the resolved
//! analysis and the utterance text. Purchase likelihood and churn risk are
//! correlated but deliberately not mirror images: a customer can show strong
//! interest and strong frustration in the same turn.

use serde::{Deserialize, Serialize};

use crate::actions::{ActionContext, ActionRecommender};
use crate::analysis::ResolvedAnalysis;
use crate::archetype::Archetype;
use crate::config::{ConfigError, ScoringConfig};
use crate::features::{FeatureVector, TurnSignals};

/// Recommended next commercial action class, first matching cascade rule wins.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CtaReadiness {
    ImmediatePurchase,
    Configuration,
    BookTestDrive,
    ScheduleCallback,
    GatherInformation,
    BuildTrust,
}

impl CtaReadiness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ImmediatePurchase => "immediate_purchase",
            Self::Configuration => "configuration",
            Self::BookTestDrive => "book_test_drive",
            Self::ScheduleCallback => "schedule_callback",
            Self::GatherInformation => "gather_information",
            Self::BuildTrust => "build_trust",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceLevel {
    Low,
    Medium,
    High,
}

/// Normalized per-turn metrics handed back to the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricsResult {
    /// 0-100.
    pub purchase_likelihood: f64,
    /// 0-100; not the complement of purchase likelihood.
    pub churn_risk: f64,
    /// 0-10; higher means experiential interest rather than purchase intent.
    pub fun_drive_score: f64,
    /// 0-10 integer potential for extended/weekend engagement.
    pub ovn_potential: u8,
    pub cta_readiness: CtaReadiness,
    /// At most five, priority ordered.
    pub next_actions: Vec<String>,
    pub deescalation_signals: Vec<String>,
    pub confidence_level: ConfidenceLevel,
}

const TEST_DRIVE_MARKERS: [&str; 2] = ["test drive", "test-drive"];
const CURIOSITY_PHRASES: [&str; 6] = [
    "curious how it drives",
    "want to try",
    "see the acceleration",
    "compare with",
    "test",
    "just looking",
];
const FINANCING_MARKERS: [&str; 2] = ["financing", "leasing"];
const DELIVERY_MARKERS: [&str; 2] = ["delivery", "lead time"];
const GETAWAY_MARKERS: [&str; 4] = ["weekend", "vacation", "trip", "family"];
const DREAM_MARKERS: [&str; 1] = ["dream car"];
const PRICE_PAIN_MARKERS: [&str; 3] = ["too expensive", "can't afford", "out of budget"];
const CITY_ONLY_MARKERS: [&str; 3] = ["city only", "only in the city", "short trips"];

fn mentions_any(text: &str, markers: &[&str]) -> bool {
    markers.iter().any(|marker| text.contains(marker))
}

#[derive(Clone, Debug, Default)]
pub struct ScoringEngine {
    config: ScoringConfig,
    recommender: ActionRecommender,
}

impl ScoringEngine {
    /// Rejects non-finite weights and unordered thresholds up front so the
    /// per-turn scorers never have to re-check them.
    pub fn new(config: ScoringConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let recommender = ActionRecommender::new(config.thresholds);
        Ok(Self { config, recommender })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Weighted feature sum squashed through a logistic curve. The weight
    /// vector sums past 1 on purpose; the squash centers at 0.5 with
    /// steepness 5, mapping the amplified raw score onto 0-100.
    pub fn purchase_likelihood(&self, features: &FeatureVector) -> f64 {
        let w = &self.config.weights;
        let raw = w.tone * features.tone
            + w.latency * features.latency
            + w.length_trend * features.length_trend
            + w.intent * features.intent
            + w.objection_intensity * features.objection_intensity
            + w.fit * features.fit
            + w.slots * features.slots
            + w.momentum * features.momentum
            + w.context * features.context
            + w.competitor * features.competitor;
        let squashed = 100.0 / (1.0 + (-5.0 * (raw - 0.5)).exp());
        squashed.clamp(0.0, 100.0)
    }

    /// Complement base plus penalties for negative signals, minus a fit
    /// bonus.
    pub fn churn_risk(&self, features: &FeatureVector, purchase_likelihood: f64) -> f64 {
        let base = 100.0 - purchase_likelihood;
        let penalty = 20.0 * (1.0 - features.tone)
            + 15.0 * features.objection_intensity
            + 10.0 * (1.0 - features.momentum)
            + 10.0 * features.competitor
            - 15.0 * features.fit;
        (base + penalty).clamp(0.0, 100.0)
    }

    /// 0-10 heuristic for "just wants to drive" interest.
    pub fn fun_drive(
        &self,
        features: &FeatureVector,
        latest_utterance: &str,
        archetype: Archetype,
    ) -> f64 {
        let text = latest_utterance.to_ascii_lowercase();
        let mut score = 5.0;

        if mentions_any(&text, &TEST_DRIVE_MARKERS) {
            score += 2.0;
        }
        if features.intent < 0.3 {
            score += 1.5;
        }
        if features.slots < 0.3 {
            score += 1.0;
        }
        if mentions_any(&text, &CURIOSITY_PHRASES) {
            score += 2.0;
        }

        if features.intent > 0.6 {
            score -= 2.0;
        }
        if features.slots > 0.6 {
            score -= 1.5;
        }
        if mentions_any(&text, &FINANCING_MARKERS) {
            score -= 3.0;
        }
        if mentions_any(&text, &DELIVERY_MARKERS) {
            score -= 2.0;
        }

        score += archetype.fun_drive_bias();
        score.clamp(0.0, 10.0)
    }

    /// 0-10 integer potential for extended/weekend engagement offers.
    pub fn ovn_potential(&self, latest_utterance: &str, archetype: Archetype) -> u8 {
        let text = latest_utterance.to_ascii_lowercase();
        let mut score = archetype.ovn_base();

        if mentions_any(&text, &GETAWAY_MARKERS) {
            score += 1.0;
        }
        if mentions_any(&text, &DREAM_MARKERS) {
            score += 1.0;
        }
        if mentions_any(&text, &PRICE_PAIN_MARKERS) {
            score -= 2.0;
        }
        if mentions_any(&text, &CITY_ONLY_MARKERS) {
            score -= 1.0;
        }

        score.clamp(0.0, 10.0).round() as u8
    }

    /// Ordered threshold cascade on (purchase likelihood, confidence, slot
    /// completeness). Computed fresh every turn; no persisted state.
    pub fn cta_readiness(
        &self,
        purchase_likelihood: f64,
        confidence: f64,
        slots_filled: f64,
    ) -> CtaReadiness {
        let cta = &self.config.cta;
        if purchase_likelihood >= cta.immediate_purchase_likelihood
            && confidence >= cta.immediate_purchase_confidence
        {
            CtaReadiness::ImmediatePurchase
        } else if purchase_likelihood >= cta.configuration_likelihood
            && slots_filled >= cta.configuration_slots
        {
            CtaReadiness::Configuration
        } else if purchase_likelihood >= cta.test_drive_likelihood
            && confidence >= cta.test_drive_confidence
        {
            CtaReadiness::BookTestDrive
        } else if purchase_likelihood >= cta.callback_likelihood {
            CtaReadiness::ScheduleCallback
        } else if slots_filled < cta.gather_information_slots {
            CtaReadiness::GatherInformation
        } else {
            CtaReadiness::BuildTrust
        }
    }

    pub fn confidence_level(&self, confidence: f64) -> ConfidenceLevel {
        let thresholds = &self.config.thresholds;
        if confidence >= thresholds.high_confidence {
            ConfidenceLevel::High
        } else if confidence >= thresholds.medium_confidence {
            ConfidenceLevel::Medium
        } else {
            ConfidenceLevel::Low
        }
    }

    /// Compute the full metrics set for one turn.
    pub fn score_turn(
        &self,
        features: &FeatureVector,
        analysis: &ResolvedAnalysis,
        latest_utterance: &str,
        signals: &TurnSignals,
    ) -> MetricsResult {
        let archetype = analysis.archetype.archetype;
        let purchase_likelihood = self.purchase_likelihood(features);
        let churn_risk = self.churn_risk(features, purchase_likelihood);
        let fun_drive_score = self.fun_drive(features, latest_utterance, archetype);
        let ovn_potential = self.ovn_potential(latest_utterance, archetype);
        let cta_readiness =
            self.cta_readiness(purchase_likelihood, features.confidence, features.slots);

        let context = ActionContext {
            has_solar_panels: signals.has_solar_panels,
            competitor_mentioned: signals.competitor_mentions > 0,
        };
        let next_actions =
            self.recommender.recommend(purchase_likelihood, churn_risk, features, &context);
        let deescalation_signals = self.recommender.deescalation_signals(churn_risk, features);

        MetricsResult {
            purchase_likelihood: round1(purchase_likelihood),
            churn_risk: round1(churn_risk),
            fun_drive_score: round1(fun_drive_score),
            ovn_potential,
            cta_readiness,
            next_actions,
            deescalation_signals,
            confidence_level: self.confidence_level(features.confidence),
        }
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::{ConfidenceLevel, CtaReadiness, ScoringEngine};
    use crate::analysis::{ArchetypeMatch, ResolvedAnalysis};
    use crate::archetype::Archetype;
    use crate::config::ScoringConfig;
    use crate::features::{FeatureVector, TurnSignals};

    fn engine() -> ScoringEngine {
        ScoringEngine::new(ScoringConfig::default()).expect("valid config")
    }

    #[test]
    fn construction_rejects_invalid_config() {
        let mut config = ScoringConfig::default();
        config.weights.intent = f64::NAN;
        assert!(ScoringEngine::new(config).is_err());

        let mut config = ScoringConfig::default();
        config.cta.test_drive_likelihood = 95.0;
        assert!(ScoringEngine::new(config).is_err());
    }

    fn features(overrides: impl FnOnce(&mut FeatureVector)) -> FeatureVector {
        let mut vector = FeatureVector {
            tone: 0.5,
            latency: 0.5,
            length_trend: 0.5,
            intent: 0.5,
            objection_intensity: 0.0,
            fit: 0.5,
            slots: 0.5,
            momentum: 0.5,
            context: 0.5,
            competitor: 0.0,
            confidence: 0.5,
        };
        overrides(&mut vector);
        vector
    }

    fn neutral_analysis(archetype: Archetype) -> ResolvedAnalysis {
        ResolvedAnalysis {
            archetype: ArchetypeMatch { archetype, confidence: 0.5 },
            tone: None,
            objections: Vec::new(),
            client_response: "Noted.".to_string(),
            coaching_reply: None,
            priority_questions: Vec::new(),
            purchase_probability: None,
            churn_risk_hint: None,
            confidence: 0.5,
            recommended_model: None,
            fallback: false,
        }
    }

    #[test]
    fn scores_stay_in_documented_bounds() {
        let engine = engine();
        let extremes = [
            features(|f| {
                f.tone = 1.0;
                f.intent = 1.0;
                f.fit = 1.0;
                f.momentum = 1.0;
                f.context = 1.0;
                f.slots = 1.0;
                f.latency = 1.0;
                f.length_trend = 1.0;
            }),
            features(|f| {
                f.tone = 0.0;
                f.objection_intensity = 1.0;
                f.momentum = 0.0;
                f.competitor = 1.0;
                f.intent = 0.0;
                f.fit = 0.0;
            }),
        ];
        for vector in extremes {
            let purchase = engine.purchase_likelihood(&vector);
            let churn = engine.churn_risk(&vector, purchase);
            assert!((0.0..=100.0).contains(&purchase));
            assert!((0.0..=100.0).contains(&churn));
            let fun = engine.fun_drive(&vector, "hello", Archetype::Unknown);
            assert!((0.0..=10.0).contains(&fun));
        }
    }

    #[test]
    fn strong_positive_features_squash_high() {
        let engine = engine();
        let hot = features(|f| {
            f.tone = 1.0;
            f.latency = 1.0;
            f.length_trend = 1.0;
            f.intent = 1.0;
            f.fit = 1.0;
            f.slots = 1.0;
            f.momentum = 1.0;
            f.context = 1.0;
        });
        let cold = features(|f| {
            f.tone = 0.0;
            f.latency = 0.0;
            f.length_trend = 0.0;
            f.intent = 0.0;
            f.fit = 0.0;
            f.slots = 0.0;
            f.momentum = 0.0;
            f.context = 0.0;
            f.objection_intensity = 1.0;
            f.competitor = 1.0;
        });
        assert!(engine.purchase_likelihood(&hot) > 90.0);
        assert!(engine.purchase_likelihood(&cold) < 10.0);
    }

    #[test]
    fn churn_risk_exceeds_complement_for_interested_but_frustrated_customer() {
        let engine = engine();
        // High intent and fit, but sour tone and heavy objections.
        let vector = features(|f| {
            f.tone = 0.1;
            f.objection_intensity = 0.9;
            f.intent = 0.9;
            f.fit = 0.8;
        });
        let purchase = engine.purchase_likelihood(&vector);
        let churn = engine.churn_risk(&vector, purchase);
        assert!(
            churn > 100.0 - purchase,
            "churn {churn} should exceed complement {}",
            100.0 - purchase
        );
    }

    #[test]
    fn fun_drive_drops_below_baseline_for_serious_buyer() {
        let engine = engine();
        let vector = features(|f| {
            f.intent = 0.7;
            f.slots = 0.7;
        });
        let score = engine.fun_drive(&vector, "what financing options do you offer", Archetype::Unknown);
        assert!(score < 5.0, "expected below baseline, got {score}");
        assert_eq!(score, 0.0, "stacked penalties clamp at zero");
    }

    #[test]
    fn fun_drive_rises_for_curious_low_commitment_turn() {
        let engine = engine();
        let vector = features(|f| {
            f.intent = 0.1;
            f.slots = 0.1;
        });
        let score = engine.fun_drive(
            &vector,
            "just looking, could I book a test drive to see the acceleration?",
            Archetype::PerformanceEnthusiast,
        );
        assert_eq!(score, 10.0);
    }

    #[test]
    fn ovn_combines_archetype_base_and_wording() {
        let engine = engine();
        assert_eq!(engine.ovn_potential("any text", Archetype::BudgetConsciousFamily), 2);
        assert_eq!(
            engine.ovn_potential("this would be my dream car for weekend trips", Archetype::Unknown),
            7
        );
        assert_eq!(
            engine.ovn_potential("honestly it's too expensive and I drive city only", Archetype::SecuritySeeker),
            0
        );
        assert_eq!(engine.ovn_potential("weekend getaway", Archetype::PerformanceEnthusiast), 10);
    }

    #[test]
    fn cta_cascade_first_match_wins() {
        let engine = engine();
        assert_eq!(engine.cta_readiness(90.0, 0.85, 0.5), CtaReadiness::ImmediatePurchase);
        assert_eq!(engine.cta_readiness(72.0, 0.5, 0.75), CtaReadiness::Configuration);
        assert_eq!(engine.cta_readiness(65.0, 0.65, 0.2), CtaReadiness::BookTestDrive);
        assert_eq!(engine.cta_readiness(45.0, 0.1, 0.1), CtaReadiness::ScheduleCallback);
        assert_eq!(engine.cta_readiness(30.0, 0.1, 0.2), CtaReadiness::GatherInformation);
        assert_eq!(engine.cta_readiness(30.0, 0.1, 0.5), CtaReadiness::BuildTrust);
    }

    #[test]
    fn confidence_levels_follow_thresholds() {
        let engine = engine();
        assert_eq!(engine.confidence_level(0.85), ConfidenceLevel::High);
        assert_eq!(engine.confidence_level(0.8), ConfidenceLevel::High);
        assert_eq!(engine.confidence_level(0.6), ConfidenceLevel::Medium);
        assert_eq!(engine.confidence_level(0.2), ConfidenceLevel::Low);
    }

    #[test]
    fn score_turn_assembles_rounded_metrics() {
        let engine = engine();
        let vector = features(|f| f.confidence = 0.85);
        let metrics = engine.score_turn(
            &vector,
            &neutral_analysis(Archetype::Unknown),
            "thinking about a family SUV",
            &TurnSignals::default(),
        );
        assert!(metrics.next_actions.len() <= 5);
        assert_eq!(metrics.confidence_level, ConfidenceLevel::High);
        assert_eq!(metrics.purchase_likelihood, (metrics.purchase_likelihood * 10.0).round() / 10.0);
        assert!((0..=10).contains(&metrics.ovn_potential));
    }
}
