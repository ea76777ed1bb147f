//! Scoring configuration.
//!
//! All weights and thresholds live in immutable structs with named fields and
//! are validated once at construction time. The defaults carry the calibrated
//! production constants; note that the purchase weight vector deliberately
//! sums to more than 1 to amplify the raw score before the logistic squash,
//! so a "normalizing" change here is a behavior change.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("weight `{name}` is not finite: {value}")]
    NonFiniteWeight { name: &'static str, value: f64 },
    #[error("threshold `{name}` out of range: {value} (expected {expected})")]
    ThresholdOutOfRange { name: &'static str, value: f64, expected: &'static str },
    #[error("thresholds `{higher}` and `{lower}` are not ordered: {a} <= {b}")]
    ThresholdOrdering { higher: &'static str, lower: &'static str, a: f64, b: f64 },
    #[error("failed to parse config: {0}")]
    Parse(String),
}

/// Per-feature weights for the purchase-likelihood score.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PurchaseWeights {
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
}

impl Default for PurchaseWeights {
    fn default() -> Self {
        Self {
            tone: 0.15,
            latency: 0.10,
            length_trend: 0.05,
            intent: 0.20,
            objection_intensity: -0.20,
            fit: 0.20,
            slots: 0.10,
            momentum: 0.20,
            context: 0.15,
            competitor: -0.10,
        }
    }
}

impl PurchaseWeights {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let named = [
            ("tone", self.tone),
            ("latency", self.latency),
            ("length_trend", self.length_trend),
            ("intent", self.intent),
            ("objection_intensity", self.objection_intensity),
            ("fit", self.fit),
            ("slots", self.slots),
            ("momentum", self.momentum),
            ("context", self.context),
            ("competitor", self.competitor),
        ];
        for (name, value) in named {
            if !value.is_finite() {
                return Err(ConfigError::NonFiniteWeight { name, value });
            }
        }
        Ok(())
    }
}

/// Decision thresholds shared by scoring and action recommendation.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionThresholds {
    /// Confidence at or above which the confidence level is `High`.
    pub high_confidence: f64,
    /// Confidence at or above which the confidence level is `Medium`.
    pub medium_confidence: f64,
    /// Purchase likelihood (0-100) that triggers close-oriented actions.
    pub purchase_ready: f64,
    /// Churn risk (0-100) that triggers de-escalation handling.
    pub churn_danger: f64,
    /// Fun-drive score above which the turn reads as "just wants to drive".
    pub fun_drive_threshold: f64,
}

impl Default for DecisionThresholds {
    fn default() -> Self {
        Self {
            high_confidence: 0.8,
            medium_confidence: 0.5,
            purchase_ready: 75.0,
            churn_danger: 70.0,
            fun_drive_threshold: 6.0,
        }
    }
}

impl DecisionThresholds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value, lo, hi, expected) in [
            ("high_confidence", self.high_confidence, 0.0, 1.0, "0..=1"),
            ("medium_confidence", self.medium_confidence, 0.0, 1.0, "0..=1"),
            ("purchase_ready", self.purchase_ready, 0.0, 100.0, "0..=100"),
            ("churn_danger", self.churn_danger, 0.0, 100.0, "0..=100"),
            ("fun_drive_threshold", self.fun_drive_threshold, 0.0, 10.0, "0..=10"),
        ] {
            if !value.is_finite() || value < lo || value > hi {
                return Err(ConfigError::ThresholdOutOfRange { name, value, expected });
            }
        }
        if self.high_confidence <= self.medium_confidence {
            return Err(ConfigError::ThresholdOrdering {
                higher: "high_confidence",
                lower: "medium_confidence",
                a: self.high_confidence,
                b: self.medium_confidence,
            });
        }
        Ok(())
    }

    /// Whether a fun-drive score reads as purely experiential interest.
    pub fn fun_drive_only(&self, fun_drive_score: f64) -> bool {
        fun_drive_score > self.fun_drive_threshold
    }
}

/// Thresholds for the call-to-action readiness cascade, evaluated in order.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CtaCascade {
    pub immediate_purchase_likelihood: f64,
    pub immediate_purchase_confidence: f64,
    pub configuration_likelihood: f64,
    pub configuration_slots: f64,
    pub test_drive_likelihood: f64,
    pub test_drive_confidence: f64,
    pub callback_likelihood: f64,
    pub gather_information_slots: f64,
}

impl Default for CtaCascade {
    fn default() -> Self {
        Self {
            immediate_purchase_likelihood: 85.0,
            immediate_purchase_confidence: 0.8,
            configuration_likelihood: 70.0,
            configuration_slots: 0.7,
            test_drive_likelihood: 60.0,
            test_drive_confidence: 0.6,
            callback_likelihood: 40.0,
            gather_information_slots: 0.4,
        }
    }
}

impl CtaCascade {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ordered = [
            ("immediate_purchase_likelihood", self.immediate_purchase_likelihood),
            ("configuration_likelihood", self.configuration_likelihood),
            ("test_drive_likelihood", self.test_drive_likelihood),
            ("callback_likelihood", self.callback_likelihood),
        ];
        for pair in ordered.windows(2) {
            let (hi_name, hi) = pair[0];
            let (lo_name, lo) = pair[1];
            if hi <= lo {
                return Err(ConfigError::ThresholdOrdering {
                    higher: hi_name,
                    lower: lo_name,
                    a: hi,
                    b: lo,
                });
            }
        }
        for (name, value, lo, hi, expected) in [
            ("immediate_purchase_confidence", self.immediate_purchase_confidence, 0.0, 1.0, "0..=1"),
            ("configuration_slots", self.configuration_slots, 0.0, 1.0, "0..=1"),
            ("test_drive_confidence", self.test_drive_confidence, 0.0, 1.0, "0..=1"),
            ("gather_information_slots", self.gather_information_slots, 0.0, 1.0, "0..=1"),
        ] {
            if !value.is_finite() || value < lo || value > hi {
                return Err(ConfigError::ThresholdOutOfRange { name, value, expected });
            }
        }
        Ok(())
    }
}

/// Connection settings for the external analysis collaborator.
#[derive(Clone, Debug)]
pub struct CollaboratorConfig {
    pub model: String,
    pub api_key: Option<SecretString>,
    pub timeout_secs: u64,
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for CollaboratorConfig {
    fn default() -> Self {
        Self {
            model: "default".to_string(),
            api_key: None,
            timeout_secs: 30,
            max_retries: 3,
            base_delay_ms: 500,
            max_delay_ms: 5_000,
        }
    }
}

/// Aggregate scoring configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: PurchaseWeights,
    pub thresholds: DecisionThresholds,
    pub cta: CtaCascade,
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights.validate()?;
        self.thresholds.validate()?;
        self.cta.validate()
    }

    /// Parse and validate a TOML configuration document. Absent sections and
    /// fields fall back to the calibrated defaults.
    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(raw).map_err(|error| ConfigError::Parse(error.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}
