//! Feature extraction: raw per-turn signals into an 11-dimensional vector.
//!
//! Every derivation is total. Missing or degenerate inputs (empty lists, zero
//! divisors, unseen labels) fall back to explicit neutral defaults instead of
//! erroring, so scoring always receives a complete vector.

use serde::{Deserialize, Serialize};

use crate::analysis::ResolvedAnalysis;

/// Per-turn intent flags detected upstream from the conversation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IntentFlags {
    pub financing_interest: bool,
    pub test_drive_request: bool,
    pub configuration_interest: bool,
    pub delivery_timeline: bool,
    pub trade_in_mentioned: bool,
    pub family_consultation: bool,
    pub comparison_active: bool,
}

/// The six discovery slots a seller needs filled before configuring a deal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequiredSlots {
    pub current_car: bool,
    pub annual_mileage: bool,
    pub charging_possibility: bool,
    pub budget_range: bool,
    pub purchase_timeline: bool,
    pub key_priorities: bool,
}

impl RequiredSlots {
    pub const TOTAL: usize = 6;

    pub fn filled_count(&self) -> usize {
        [
            self.current_car,
            self.annual_mileage,
            self.charging_possibility,
            self.budget_range,
            self.purchase_timeline,
            self.key_priorities,
        ]
        .iter()
        .filter(|filled| **filled)
        .count()
    }
}

/// Raw signals for one conversation turn. Everything is optional or
/// defaulted; the extractor never rejects a turn for missing data.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnSignals {
    /// Average customer response latency in seconds.
    pub avg_response_time_secs: Option<f64>,
    /// Character lengths of the customer's messages so far, oldest first.
    pub message_lengths: Vec<usize>,
    pub intents: IntentFlags,
    pub slots: RequiredSlots,
    /// Rolling per-interaction engagement scores in [0,1], oldest first.
    pub interaction_scores: Vec<f64>,
    pub has_solar_panels: bool,
    pub family_size: Option<u32>,
    /// Defaults to true when unknown: absence of budget data is not an
    /// objection.
    pub budget_ok: Option<bool>,
    /// Daily commute in kilometers; an unknown commute counts as short.
    pub daily_commute_km: Option<f64>,
    pub is_business_context: bool,
    pub has_family: bool,
    pub eco_conscious: bool,
    pub tech_savvy: bool,
    pub competitor_mentions: u32,
}

/// Normalized behavioral features, each in [0,1]. Built fresh per turn and
/// immutable afterwards.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub tone: f64,
    pub latency: f64,
    pub length_trend: f64,
    pub intent: f64,
    pub objection_intensity: f64,
    pub fit: f64,
    pub slots: f64,
    pub momentum: f64,
    pub context: f64,
    pub competitor: f64,
    pub confidence: f64,
}

impl FeatureVector {
    pub fn as_array(&self) -> [f64; 11] {
        [
            self.tone,
            self.latency,
            self.length_trend,
            self.intent,
            self.objection_intensity,
            self.fit,
            self.slots,
            self.momentum,
            self.context,
            self.competitor,
            self.confidence,
        ]
    }
}

/// Model names whose cabin suits a household larger than a couple.
const FAMILY_MODEL_MARKERS: [&str; 4] = ["suv", "crossover", "estate", "7-seat"];

const DEFAULT_OBJECTION_SEVERITY: f64 = 5.0;

#[derive(Clone, Copy, Debug, Default)]
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, signals: &TurnSignals, analysis: &ResolvedAnalysis) -> FeatureVector {
        FeatureVector {
            tone: tone_feature(analysis.tone.as_deref()),
            latency: latency_feature(signals.avg_response_time_secs),
            length_trend: length_trend_feature(&signals.message_lengths),
            intent: intent_feature(&signals.intents),
            objection_intensity: objection_intensity_feature(analysis),
            fit: fit_feature(signals, analysis),
            slots: signals.slots.filled_count() as f64 / RequiredSlots::TOTAL as f64,
            momentum: momentum_feature(&signals.interaction_scores),
            context: context_feature(signals),
            competitor: (f64::from(signals.competitor_mentions) * 0.2).min(1.0),
            confidence: analysis.confidence.clamp(0.0, 1.0),
        }
    }
}

/// Seven-bucket tone map; unseen labels read as neutral.
fn tone_feature(label: Option<&str>) -> f64 {
    match label.map(str::trim).map(str::to_ascii_lowercase).as_deref() {
        Some("very_negative") => 0.0,
        Some("negative") => 0.25,
        Some("skeptical") => 0.35,
        Some("interested") => 0.65,
        Some("positive") => 0.75,
        Some("enthusiastic") => 1.0,
        _ => 0.5,
    }
}

/// Faster replies read as stronger engagement; flat zero at 60s and beyond.
fn latency_feature(avg_response_time_secs: Option<f64>) -> f64 {
    let response_time = avg_response_time_secs.unwrap_or(30.0);
    (1.0 - response_time / 60.0).clamp(0.0, 1.0)
}

/// Ratio of the last three message lengths to all earlier ones. Growing
/// messages read as rising interest.
fn length_trend_feature(message_lengths: &[usize]) -> f64 {
    if message_lengths.len() < 2 {
        return 0.5;
    }
    let split = message_lengths.len().saturating_sub(3);
    let (older, recent) = message_lengths.split_at(split);
    if older.is_empty() {
        return 0.5;
    }
    let older_sum: usize = older.iter().sum();
    let recent_sum: usize = recent.iter().sum();
    if older_sum == 0 {
        return 1.0;
    }
    (recent_sum as f64 / older_sum as f64).clamp(0.0, 1.0)
}

fn intent_feature(intents: &IntentFlags) -> f64 {
    let weighted = [
        (intents.financing_interest, 0.25),
        (intents.test_drive_request, 0.35),
        (intents.configuration_interest, 0.30),
        (intents.delivery_timeline, 0.40),
        (intents.trade_in_mentioned, 0.20),
        (intents.family_consultation, 0.15),
        (intents.comparison_active, -0.10),
    ];
    let score: f64 = weighted.iter().filter(|(flag, _)| *flag).map(|(_, w)| w).sum();
    score.clamp(0.0, 1.0)
}

fn objection_intensity_feature(analysis: &ResolvedAnalysis) -> f64 {
    if analysis.objections.is_empty() {
        return 0.0;
    }
    let count = analysis.objections.len() as f64;
    let avg_severity = analysis
        .objections
        .iter()
        .map(|objection| objection.severity.unwrap_or(DEFAULT_OBJECTION_SEVERITY))
        .sum::<f64>()
        / count;
    (count * 0.2 + (avg_severity / 10.0) * 0.8).min(1.0)
}

fn fit_feature(signals: &TurnSignals, analysis: &ResolvedAnalysis) -> f64 {
    let mut fit: f64 = 0.0;
    if signals.has_solar_panels {
        fit += 0.3;
    }
    if signals.family_size.unwrap_or(0) > 2 && recommends_family_model(analysis) {
        fit += 0.25;
    }
    if signals.budget_ok.unwrap_or(true) {
        fit += 0.25;
    }
    if signals.daily_commute_km.unwrap_or(0.0) < 100.0 {
        fit += 0.20;
    }
    fit.clamp(0.0, 1.0)
}

fn recommends_family_model(analysis: &ResolvedAnalysis) -> bool {
    analysis
        .recommended_model
        .as_deref()
        .map(|model| {
            let model = model.to_ascii_lowercase();
            FAMILY_MODEL_MARKERS.iter().any(|marker| model.contains(marker))
        })
        .unwrap_or(false)
}

/// Direction of the last three engagement scores, centered at 0.5.
fn momentum_feature(interaction_scores: &[f64]) -> f64 {
    let start = interaction_scores.len().saturating_sub(3);
    let recent = &interaction_scores[start..];
    if recent.len() < 2 {
        return 0.5;
    }
    let momentum = (recent[recent.len() - 1] - recent[0]) / 2.0 + 0.5;
    momentum.clamp(0.0, 1.0)
}

fn context_feature(signals: &TurnSignals) -> f64 {
    let mut context: f64 = 0.0;
    if signals.is_business_context {
        context += 0.3;
    }
    if signals.has_family {
        context += 0.2;
    }
    if signals.eco_conscious {
        context += 0.2;
    }
    if signals.tech_savvy {
        context += 0.3;
    }
    context.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{ArchetypeMatch, Objection, ResolvedAnalysis};
    use crate::archetype::Archetype;

    fn analysis_with(tone: Option<&str>, objections: Vec<Objection>) -> ResolvedAnalysis {
        ResolvedAnalysis {
            archetype: ArchetypeMatch { archetype: Archetype::Unknown, confidence: 0.4 },
            tone: tone.map(str::to_string),
            objections,
            client_response: "Noted.".to_string(),
            coaching_reply: None,
            priority_questions: Vec::new(),
            purchase_probability: None,
            churn_risk_hint: None,
            confidence: 0.4,
            recommended_model: None,
            fallback: false,
        }
    }

    #[test]
    fn every_feature_stays_in_unit_interval() {
        let cases = vec![
            TurnSignals::default(),
            TurnSignals {
                avg_response_time_secs: Some(500.0),
                message_lengths: vec![0, 0, 900, 900, 900],
                intents: IntentFlags {
                    financing_interest: true,
                    test_drive_request: true,
                    configuration_interest: true,
                    delivery_timeline: true,
                    trade_in_mentioned: true,
                    family_consultation: true,
                    comparison_active: true,
                },
                interaction_scores: vec![0.0, 1.0, 1.0],
                has_solar_panels: true,
                family_size: Some(6),
                budget_ok: Some(true),
                daily_commute_km: Some(5.0),
                is_business_context: true,
                has_family: true,
                eco_conscious: true,
                tech_savvy: true,
                competitor_mentions: 40,
                slots: RequiredSlots {
                    current_car: true,
                    annual_mileage: true,
                    charging_possibility: true,
                    budget_range: true,
                    purchase_timeline: true,
                    key_priorities: true,
                },
            },
        ];

        let objections = vec![
            Objection { kind: "price_concern".to_string(), severity: Some(10.0), rebuttal: None },
            Objection { kind: "range_anxiety".to_string(), severity: None, rebuttal: None },
        ];
        let extractor = FeatureExtractor::new();
        for signals in &cases {
            let vector = extractor.extract(signals, &analysis_with(Some("very_negative"), objections.clone()));
            for value in vector.as_array() {
                assert!((0.0..=1.0).contains(&value), "feature out of bounds: {value}");
            }
        }
    }

    #[test]
    fn unseen_tone_defaults_to_neutral() {
        let extractor = FeatureExtractor::new();
        let vector =
            extractor.extract(&TurnSignals::default(), &analysis_with(Some("grumpy"), Vec::new()));
        assert_eq!(vector.tone, 0.5);
        let vector = extractor.extract(&TurnSignals::default(), &analysis_with(None, Vec::new()));
        assert_eq!(vector.tone, 0.5);
    }

    #[test]
    fn latency_is_monotonic_and_clamped() {
        assert_eq!(latency_feature(Some(0.0)), 1.0);
        assert_eq!(latency_feature(Some(30.0)), 0.5);
        assert_eq!(latency_feature(Some(60.0)), 0.0);
        assert_eq!(latency_feature(Some(600.0)), 0.0);
        assert_eq!(latency_feature(None), 0.5);
    }

    #[test]
    fn length_trend_degenerate_inputs_default() {
        assert_eq!(length_trend_feature(&[]), 0.5);
        assert_eq!(length_trend_feature(&[40]), 0.5);
        // Two or three messages leave no "older" window.
        assert_eq!(length_trend_feature(&[40, 80]), 0.5);
        assert_eq!(length_trend_feature(&[40, 80, 120]), 0.5);
        // Older messages with zero total length: guarded division.
        assert_eq!(length_trend_feature(&[0, 10, 10, 10]), 1.0);
    }

    #[test]
    fn length_trend_reflects_shrinking_messages() {
        let trend = length_trend_feature(&[200, 200, 30, 20, 10]);
        assert!(trend < 0.2, "shrinking messages should score low, got {trend}");
    }

    #[test]
    fn intent_weights_sum_and_clamp() {
        let intent = intent_feature(&IntentFlags {
            financing_interest: true,
            delivery_timeline: true,
            comparison_active: true,
            ..IntentFlags::default()
        });
        assert!((intent - 0.55).abs() < 1e-9);
        assert_eq!(intent_feature(&IntentFlags::default()), 0.0);
    }

    #[test]
    fn objection_intensity_defaults_severity_per_entry() {
        let extractor = FeatureExtractor::new();
        let no_objections = extractor.extract(&TurnSignals::default(), &analysis_with(None, Vec::new()));
        assert_eq!(no_objections.objection_intensity, 0.0);

        let unrated = analysis_with(
            None,
            vec![Objection { kind: "price_concern".to_string(), severity: None, rebuttal: None }],
        );
        let vector = extractor.extract(&TurnSignals::default(), &unrated);
        // 1 * 0.2 + (5/10) * 0.8
        assert!((vector.objection_intensity - 0.6).abs() < 1e-9);
    }

    #[test]
    fn fit_grants_commute_bonus_when_commute_unknown() {
        let extractor = FeatureExtractor::new();
        let vector = extractor.extract(&TurnSignals::default(), &analysis_with(None, Vec::new()));
        // budget_ok default + short-commute default
        assert!((vector.fit - 0.45).abs() < 1e-9);
    }

    #[test]
    fn family_fit_requires_household_and_model_match() {
        let extractor = FeatureExtractor::new();
        let mut analysis = analysis_with(None, Vec::new());
        analysis.recommended_model = Some("Atlas SUV Long Range".to_string());

        let signals = TurnSignals { family_size: Some(4), ..TurnSignals::default() };
        let with_match = extractor.extract(&signals, &analysis);
        let without_family = extractor.extract(&TurnSignals::default(), &analysis);
        assert!((with_match.fit - without_family.fit - 0.25).abs() < 1e-9);
    }

    #[test]
    fn momentum_tracks_direction_of_last_three_scores() {
        assert_eq!(momentum_feature(&[]), 0.5);
        assert_eq!(momentum_feature(&[0.4]), 0.5);
        assert!((momentum_feature(&[0.2, 0.4, 0.8]) - 0.8).abs() < 1e-9);
        assert!((momentum_feature(&[0.9, 0.5, 0.1]) - 0.1).abs() < 1e-9);
        // Only the last three scores matter.
        assert!((momentum_feature(&[0.0, 0.0, 0.5, 0.5, 0.5]) - 0.5).abs() < 1e-9);
    }

    #[test]
    fn slot_completeness_is_fraction_of_six() {
        let slots = RequiredSlots { budget_range: true, purchase_timeline: true, ..RequiredSlots::default() };
        assert_eq!(slots.filled_count(), 2);
        let extractor = FeatureExtractor::new();
        let vector = extractor.extract(
            &TurnSignals { slots, ..TurnSignals::default() },
            &analysis_with(None, Vec::new()),
        );
        assert!((vector.slots - 2.0 / 6.0).abs() < 1e-9);
    }
}
