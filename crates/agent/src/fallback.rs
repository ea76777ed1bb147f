//! Deterministic keyword classifier used when the collaborator is down.
//!
//! Produces a complete, well-formed analysis from the utterance alone so the
//! scoring pipeline always has something to work with. Same input, same
//! output, no clock or randomness.

use pulse_core::{Archetype, ArchetypeMatch, Objection, PriorityQuestion, ResolvedAnalysis};

/// Keyword lists the classifier matches against (lowercased substrings).
#[derive(Clone, Debug)]
pub struct FallbackConfig {
    pub family_keywords: Vec<String>,
    pub price_keywords: Vec<String>,
    pub performance_keywords: Vec<String>,
    pub eco_keywords: Vec<String>,
    pub range_keywords: Vec<String>,
}

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| (*w).to_string()).collect()
}

impl Default for FallbackConfig {
    fn default() -> Self {
        Self {
            family_keywords: owned(&["family", "kids", "children", "safety", "safe"]),
            price_keywords: owned(&["price", "cost", "expensive", "cheap", "afford"]),
            performance_keywords: owned(&["speed", "fast", "acceleration", "power", "performance"]),
            eco_keywords: owned(&["eco", "environment", "emissions", "green", "electric"]),
            range_keywords: owned(&["range", "charging", "charge", "battery"]),
        }
    }
}

/// Heuristic stand-in for the analysis collaborator.
#[derive(Clone, Debug, Default)]
pub struct FallbackClassifier {
    config: FallbackConfig,
}

impl FallbackClassifier {
    pub fn new(config: FallbackConfig) -> Self {
        Self { config }
    }

    /// Classify the utterance into an archetype guess plus canned coaching
    /// content. Confident keyword hits get 0.7; otherwise Unknown at 0.3 with
    /// a critical discovery question injected up front.
    pub fn classify(&self, latest_utterance: &str) -> ResolvedAnalysis {
        let text = latest_utterance.to_lowercase();
        let hit = |keywords: &[String]| keywords.iter().any(|k| text.contains(k.as_str()));

        let archetype = if hit(&self.config.family_keywords) {
            ArchetypeMatch { archetype: Archetype::FamilyGuardian, confidence: 0.7 }
        } else if hit(&self.config.price_keywords) {
            ArchetypeMatch { archetype: Archetype::ValueOptimizer, confidence: 0.7 }
        } else if hit(&self.config.performance_keywords) {
            ArchetypeMatch { archetype: Archetype::PerformanceDriver, confidence: 0.7 }
        } else if hit(&self.config.eco_keywords) {
            ArchetypeMatch { archetype: Archetype::EcoTechPragmatist, confidence: 0.7 }
        } else {
            ArchetypeMatch { archetype: Archetype::Unknown, confidence: 0.3 }
        };

        let mut objections = Vec::new();
        if hit(&self.config.price_keywords) {
            objections.push(Objection {
                kind: "price_concern".to_string(),
                severity: Some(6.0),
                rebuttal: Some(
                    "Walk through total cost of ownership against their current car".to_string(),
                ),
            });
        }
        if hit(&self.config.range_keywords) {
            objections.push(Objection {
                kind: "range_anxiety".to_string(),
                severity: Some(6.0),
                rebuttal: Some(
                    "Map their weekly driving onto real range and charging stops".to_string(),
                ),
            });
        }

        let mut priority_questions = vec![
            PriorityQuestion {
                text: "What does a typical week of driving look like for you?".to_string(),
                critical: false,
                reason: "Anchors range and commute fit".to_string(),
            },
            PriorityQuestion {
                text: "Who else will be driving or riding in the car?".to_string(),
                critical: false,
                reason: "Surfaces family and space needs".to_string(),
            },
            PriorityQuestion {
                text: "Have you driven an electric car before?".to_string(),
                critical: false,
                reason: "Calibrates how much of the basics to cover".to_string(),
            },
        ];
        if archetype.confidence < 0.7 {
            priority_questions.insert(
                0,
                PriorityQuestion {
                    text: "What matters most to you in your next car?".to_string(),
                    critical: true,
                    reason: "Not enough signal yet to tell what drives this customer".to_string(),
                },
            );
        }

        let confidence = archetype.confidence;
        ResolvedAnalysis {
            archetype,
            tone: Some("neutral".to_string()),
            objections,
            client_response: "Good question - let me make sure I get you the exact answer."
                .to_string(),
            coaching_reply: Some(
                "Keep it conversational and ask one open question at a time.".to_string(),
            ),
            priority_questions,
            purchase_probability: None,
            churn_risk_hint: None,
            confidence,
            recommended_model: None,
            fallback: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::FallbackClassifier;
    use pulse_core::Archetype;

    #[test]
    fn keyword_buckets_map_to_archetypes() {
        let classifier = FallbackClassifier::default();
        let cases = [
            ("We need room for the kids", Archetype::FamilyGuardian),
            ("That price seems steep", Archetype::ValueOptimizer),
            ("How fast is the acceleration?", Archetype::PerformanceDriver),
            ("I care about emissions", Archetype::EcoTechPragmatist),
            ("Hello there", Archetype::Unknown),
        ];
        for (utterance, expected) in cases {
            let analysis = classifier.classify(utterance);
            assert_eq!(analysis.archetype.archetype, expected, "{utterance}");
            assert!(analysis.fallback);
        }
    }

    #[test]
    fn price_and_range_attach_objections() {
        let classifier = FallbackClassifier::default();
        let analysis = classifier.classify("The cost worries me and so does charging");
        let kinds: Vec<&str> = analysis.objections.iter().map(|o| o.kind.as_str()).collect();
        assert_eq!(kinds, ["price_concern", "range_anxiety"]);
        assert!(analysis.objections.iter().all(|o| o.rebuttal.is_some()));
    }

    #[test]
    fn low_confidence_injects_critical_discovery_question() {
        let classifier = FallbackClassifier::default();
        let unknown = classifier.classify("Hmm");
        assert_eq!(unknown.confidence, 0.3);
        assert!(unknown.priority_questions[0].critical);
        assert_eq!(unknown.priority_questions.len(), 4);

        let confident = classifier.classify("Is it safe for the kids?");
        assert!(!confident.priority_questions[0].critical);
        assert_eq!(confident.priority_questions.len(), 3);
    }

    #[test]
    fn classification_is_deterministic() {
        let classifier = FallbackClassifier::default();
        let first = classifier.classify("What does it cost?");
        let second = classifier.classify("What does it cost?");
        assert_eq!(first.archetype.archetype, second.archetype.archetype);
        assert_eq!(first.client_response, second.client_response);
        assert_eq!(first.priority_questions.len(), second.priority_questions.len());
    }
}
