//! Resolved analysis payloads.
//!
//! The external analysis collaborator returns loosely structured JSON. This
//! module owns the tolerant wire representation, the coercions that repair
//! legacy field shapes, and the schema-complete [`ResolvedAnalysis`] that the
//! rest of the engine consumes. Downstream scoring never sees partial data:
//! every turn resolves to a complete analysis, whether it came from the
//! collaborator, the cache, or the fallback classifier.

use serde::{Deserialize, Serialize};

use crate::archetype::Archetype;
use crate::errors::AnalysisError;

/// Archetype resolution with the collaborator's confidence in it.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ArchetypeMatch {
    pub archetype: Archetype,
    pub confidence: f64,
}

impl Default for ArchetypeMatch {
    fn default() -> Self {
        Self { archetype: Archetype::Unknown, confidence: 0.0 }
    }
}

/// A detected customer objection, with an optional canned rebuttal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Objection {
    pub kind: String,
    /// Severity on a 0-10 scale; absent when the collaborator did not rate it.
    pub severity: Option<f64>,
    pub rebuttal: Option<String>,
}

/// A discovery question for the seller, flagged critical when the analysis
/// cannot proceed confidently without the answer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PriorityQuestion {
    pub text: String,
    pub critical: bool,
    pub reason: String,
}

/// Wire shape for priority questions. Older collaborator versions emitted a
/// bare string per question; newer ones emit the full object, sometimes
/// without the `critical` flag.
#[derive(Clone, Debug, Deserialize)]
#[serde(untagged)]
enum RawQuestion {
    Legacy(String),
    Shaped {
        text: String,
        #[serde(default)]
        critical: bool,
        #[serde(default)]
        reason: Option<String>,
    },
}

impl RawQuestion {
    fn coerce(self) -> PriorityQuestion {
        match self {
            Self::Legacy(text) => PriorityQuestion {
                text,
                critical: false,
                reason: "Follow-up question".to_string(),
            },
            Self::Shaped { text, critical, reason } => PriorityQuestion {
                text,
                critical,
                reason: reason.unwrap_or_else(|| "Follow-up question".to_string()),
            },
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
struct RawArchetype {
    #[serde(default)]
    name: String,
    #[serde(default)]
    confidence: Option<f64>,
}

#[derive(Clone, Debug, Deserialize)]
struct RawObjection {
    #[serde(alias = "type")]
    kind: String,
    #[serde(default, alias = "intensity")]
    severity: Option<f64>,
    #[serde(default)]
    rebuttal: Option<String>,
}

/// Tolerant wire representation of a collaborator response.
#[derive(Clone, Debug, Default, Deserialize)]
struct RawAnalysis {
    #[serde(default)]
    archetype: Option<RawArchetype>,
    #[serde(default)]
    tone: Option<String>,
    #[serde(default)]
    objections: Vec<RawObjection>,
    #[serde(default)]
    client_response: Option<String>,
    #[serde(default, alias = "quick_reply")]
    coaching_reply: Option<String>,
    #[serde(default)]
    priority_questions: Vec<RawQuestion>,
    #[serde(default)]
    purchase_probability: Option<f64>,
    #[serde(default)]
    churn_risk: Option<f64>,
    #[serde(default, alias = "confidence_score")]
    confidence: Option<f64>,
    #[serde(default)]
    recommended_model: Option<String>,
}

/// Schema-complete analysis consumed by feature extraction and scoring.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResolvedAnalysis {
    pub archetype: ArchetypeMatch,
    /// Detected tone label; feature extraction maps it to a scalar.
    pub tone: Option<String>,
    pub objections: Vec<Objection>,
    /// Reply addressed to the customer.
    pub client_response: String,
    /// Coaching note addressed to the seller.
    pub coaching_reply: Option<String>,
    pub priority_questions: Vec<PriorityQuestion>,
    /// Collaborator's own purchase estimate, advisory only.
    pub purchase_probability: Option<f64>,
    /// Collaborator's own churn estimate, advisory only.
    pub churn_risk_hint: Option<f64>,
    pub confidence: f64,
    pub recommended_model: Option<String>,
    /// True when the deterministic fallback classifier produced this result.
    pub fallback: bool,
}

impl ResolvedAnalysis {
    /// Parse a raw collaborator payload. Malformed JSON is an error (the
    /// caller routes it to the fallback classifier); a parsed payload with
    /// missing fields is repaired by [`normalize`](Self::normalize).
    pub fn from_json(raw: &str, latest_utterance: &str) -> Result<Self, AnalysisError> {
        let raw: RawAnalysis = serde_json::from_str(raw)
            .map_err(|error| AnalysisError::MalformedOutput(error.to_string()))?;
        Ok(Self::from_raw(raw).normalize(latest_utterance))
    }

    fn from_raw(raw: RawAnalysis) -> Self {
        let archetype = raw
            .archetype
            .map(|a| ArchetypeMatch {
                archetype: Archetype::parse(&a.name),
                confidence: a.confidence.unwrap_or(0.0).clamp(0.0, 1.0),
            })
            .unwrap_or_default();
        let confidence = raw.confidence.unwrap_or(archetype.confidence).clamp(0.0, 1.0);

        Self {
            archetype,
            tone: raw.tone,
            objections: raw
                .objections
                .into_iter()
                .map(|o| Objection { kind: o.kind, severity: o.severity, rebuttal: o.rebuttal })
                .collect(),
            client_response: raw.client_response.unwrap_or_default(),
            coaching_reply: raw.coaching_reply,
            priority_questions: raw.priority_questions.into_iter().map(RawQuestion::coerce).collect(),
            purchase_probability: raw.purchase_probability,
            churn_risk_hint: raw.churn_risk,
            confidence,
            recommended_model: raw.recommended_model,
            fallback: false,
        }
    }

    /// Repair gaps so the analysis is always usable downstream.
    pub fn normalize(mut self, latest_utterance: &str) -> Self {
        if self.client_response.trim().is_empty() {
            let mut excerpt = latest_utterance.trim().to_string();
            if excerpt.len() > 60 {
                // Byte 60 may fall inside a multibyte character.
                let mut cut = 60;
                while !excerpt.is_char_boundary(cut) {
                    cut -= 1;
                }
                excerpt.truncate(cut);
                excerpt.push_str("...");
            }
            self.client_response = format!("Thanks for sharing that: {excerpt}");
        }
        self
    }
}

/// Stable content hash over a (latest utterance, history summary) pair, used
/// as the response-cache key. Content-derived on purpose: any session's turn
/// may hit an entry populated by another session.
pub fn content_fingerprint(latest_utterance: &str, history_summary: &str) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(latest_utterance.as_bytes());
    hasher.update(&[0x1f]);
    hasher.update(history_summary.as_bytes());
    hasher.finalize().to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::{content_fingerprint, ResolvedAnalysis};
    use crate::archetype::Archetype;

    #[test]
    fn parses_full_payload() {
        let analysis = ResolvedAnalysis::from_json(
            r#"{
                "archetype": {"name": "Performance Enthusiast", "confidence": 0.9},
                "tone": "enthusiastic",
                "objections": [{"type": "price_concern", "intensity": 7.0}],
                "client_response": "Happy to walk you through the performance trims.",
                "quick_reply": "Lead with acceleration figures.",
                "priority_questions": [
                    {"text": "What is your budget?", "critical": true, "reason": "No budget data"}
                ],
                "confidence": 0.85
            }"#,
            "how fast is it?",
        )
        .expect("valid payload");

        assert_eq!(analysis.archetype.archetype, Archetype::PerformanceEnthusiast);
        assert_eq!(analysis.tone.as_deref(), Some("enthusiastic"));
        assert_eq!(analysis.objections[0].kind, "price_concern");
        assert_eq!(analysis.objections[0].severity, Some(7.0));
        assert_eq!(analysis.confidence, 0.85);
        assert!(!analysis.fallback);
    }

    #[test]
    fn legacy_string_questions_are_coerced() {
        let analysis = ResolvedAnalysis::from_json(
            r#"{
                "archetype": {"name": "Security Seeker", "confidence": 0.6},
                "client_response": "Safety is a fair priority to start from.",
                "priority_questions": ["How many kilometers do you drive per year?"]
            }"#,
            "is it safe?",
        )
        .expect("valid payload");

        let question = &analysis.priority_questions[0];
        assert_eq!(question.text, "How many kilometers do you drive per year?");
        assert!(!question.critical);
        assert!(!question.reason.is_empty());
    }

    #[test]
    fn missing_client_response_is_repaired() {
        let analysis = ResolvedAnalysis::from_json(
            r#"{"archetype": {"name": "Unknown", "confidence": 0.2}}"#,
            "just looking around",
        )
        .expect("valid payload");
        assert!(analysis.client_response.contains("just looking around"));
    }

    #[test]
    fn repaired_excerpt_respects_character_boundaries() {
        // A two-byte character straddling the 60-byte cut point.
        let utterance = format!("{}ść czy coś jeszcze do omówienia", "a".repeat(59));
        let analysis = ResolvedAnalysis::from_json(
            r#"{"archetype": {"name": "Unknown", "confidence": 0.2}}"#,
            &utterance,
        )
        .expect("valid payload");

        assert!(analysis.client_response.starts_with("Thanks for sharing that: "));
        assert!(analysis.client_response.ends_with("..."));
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(ResolvedAnalysis::from_json("not json at all", "hello").is_err());
    }

    #[test]
    fn fingerprint_is_stable_and_input_sensitive() {
        let a = content_fingerprint("hello", "- Observation: hi");
        let b = content_fingerprint("hello", "- Observation: hi");
        let c = content_fingerprint("hello", "");
        assert_eq!(a, b);
        assert_ne!(a, c);
        // Separator keeps (utterance, history) boundaries unambiguous.
        assert_ne!(content_fingerprint("ab", "c"), content_fingerprint("a", "bc"));
    }
}
