//! Next-action recommendation and de-escalation signal detection.

use serde::{Deserialize, Serialize};

use crate::config::DecisionThresholds;
use crate::features::FeatureVector;

/// Maximum actions surfaced to the seller per turn.
pub const MAX_ACTIONS: usize = 5;

/// Purchase likelihood at which the mid information-building tier starts.
const MID_TIER_LIKELIHOOD: f64 = 50.0;

/// Session context that gates the context-specific action appends.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionContext {
    pub has_solar_panels: bool,
    pub competitor_mentioned: bool,
}

#[derive(Clone, Debug, Default)]
pub struct ActionRecommender {
    thresholds: DecisionThresholds,
}

impl ActionRecommender {
    pub fn new(thresholds: DecisionThresholds) -> Self {
        Self { thresholds }
    }

    /// Build the priority-ordered action list. Tier actions first, then the
    /// de-escalation pair is forced into positions 0 and 1 when churn is
    /// critical, then context-specific appends, then the cap.
    pub fn recommend(
        &self,
        purchase_likelihood: f64,
        churn_risk: f64,
        features: &FeatureVector,
        context: &ActionContext,
    ) -> Vec<String> {
        let mut actions: Vec<String> = Vec::new();

        if purchase_likelihood >= self.thresholds.purchase_ready {
            actions.push("Move to close - the customer is ready".to_string());
            actions.push("Propose the online configuration".to_string());
            actions.push("Present financing options".to_string());
        } else if purchase_likelihood >= MID_TIER_LIKELIHOOD {
            if features.slots < 0.5 {
                actions.push("Ask follow-up discovery questions".to_string());
            }
            if features.objection_intensity > 0.3 {
                actions.push("Counter the main objections with facts".to_string());
            }
            actions.push("Offer a test drive".to_string());
            actions.push("Walk through the cost-of-ownership breakdown".to_string());
        } else {
            actions.push("Build the relationship before selling".to_string());
            actions.push("Educate on the technology and benefits".to_string());
            actions.push("Listen and gather information".to_string());
        }

        if churn_risk >= self.thresholds.churn_danger {
            actions.insert(0, "De-escalate: shift to a more empathetic tone".to_string());
            actions.insert(1, "Focus on one primary benefit".to_string());
        }

        if context.has_solar_panels {
            actions.push("Show the solar charging synergy".to_string());
        }
        if context.competitor_mentioned {
            actions.push("Compare total cost of ownership with the competitor".to_string());
        }
        if features.intent > 0.7 {
            actions.push("Highlight limited availability".to_string());
        }

        actions.truncate(MAX_ACTIONS);
        actions
    }

    /// Independent warning detectors; each condition contributes at most one
    /// signal and the list is uncapped.
    pub fn deescalation_signals(&self, churn_risk: f64, features: &FeatureVector) -> Vec<String> {
        let mut signals = Vec::new();

        if churn_risk >= self.thresholds.churn_danger {
            signals.push("High churn risk - change the approach".to_string());
        }
        if features.tone < 0.3 {
            signals.push("Customer is frustrated - show empathy".to_string());
        }
        if features.objection_intensity > 0.7 {
            signals.push("Objection overload - step back and listen".to_string());
        }
        if features.momentum < 0.2 {
            signals.push("Losing interest - change tactics".to_string());
        }
        if features.competitor > 0.5 {
            signals.push("Heavy comparison shopping - show unique value".to_string());
        }

        signals
    }
}
