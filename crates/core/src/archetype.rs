//! Closed customer-archetype model.
//!
//! Archetype names arrive from the analysis collaborator as free text. Keeping
//! the set closed (with an explicit `Unknown` arm) means a typo in the wire
//! payload degrades to neutral defaults instead of silently missing a lookup.

use serde::{Deserialize, Serialize};

/// Behavioral customer segment used to bias scoring defaults.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    StatusAchiever,
    PragmaticAnalyst,
    EcoTranscender,
    SecuritySeeker,
    UrbanProfessional,
    PerformanceEnthusiast,
    TechExecutive,
    EarlyAdopter,
    BudgetConsciousFamily,
    CautiousAdopter,
    FamilyGuardian,
    ValueOptimizer,
    PerformanceDriver,
    EcoTechPragmatist,
    Unknown,
}

impl Archetype {
    /// Parse a collaborator-supplied archetype name. Unseen names map to
    /// `Unknown` rather than failing.
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "status achiever" => Self::StatusAchiever,
            "pragmatic analyst" => Self::PragmaticAnalyst,
            "eco-transcender" | "eco transcender" => Self::EcoTranscender,
            "security seeker" => Self::SecuritySeeker,
            "urban professional" | "young urban professional" => Self::UrbanProfessional,
            "performance enthusiast" => Self::PerformanceEnthusiast,
            "tech executive" => Self::TechExecutive,
            "early adopter" => Self::EarlyAdopter,
            "budget conscious family" => Self::BudgetConsciousFamily,
            "cautious adopter" => Self::CautiousAdopter,
            "family guardian" => Self::FamilyGuardian,
            "value optimizer" => Self::ValueOptimizer,
            "performance driver" => Self::PerformanceDriver,
            "eco-tech pragmatist" | "eco tech pragmatist" => Self::EcoTechPragmatist,
            _ => Self::Unknown,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::StatusAchiever => "Status Achiever",
            Self::PragmaticAnalyst => "Pragmatic Analyst",
            Self::EcoTranscender => "Eco-Transcender",
            Self::SecuritySeeker => "Security Seeker",
            Self::UrbanProfessional => "Urban Professional",
            Self::PerformanceEnthusiast => "Performance Enthusiast",
            Self::TechExecutive => "Tech Executive",
            Self::EarlyAdopter => "Early Adopter",
            Self::BudgetConsciousFamily => "Budget Conscious Family",
            Self::CautiousAdopter => "Cautious Adopter",
            Self::FamilyGuardian => "Family Guardian",
            Self::ValueOptimizer => "Value Optimizer",
            Self::PerformanceDriver => "Performance Driver",
            Self::EcoTechPragmatist => "Eco-Tech Pragmatist",
            Self::Unknown => "Unknown",
        }
    }

    /// Base overnight-value potential (0-10) for extended/weekend engagement.
    pub fn ovn_base(&self) -> f64 {
        match self {
            Self::StatusAchiever => 8.0,
            Self::PragmaticAnalyst => 4.0,
            Self::EcoTranscender => 6.0,
            Self::SecuritySeeker => 3.0,
            Self::UrbanProfessional => 9.0,
            Self::PerformanceEnthusiast => 10.0,
            Self::TechExecutive => 8.0,
            Self::EarlyAdopter => 7.0,
            Self::BudgetConsciousFamily => 2.0,
            Self::CautiousAdopter => 5.0,
            // Segments without a calibrated base take the neutral default.
            Self::FamilyGuardian
            | Self::ValueOptimizer
            | Self::PerformanceDriver
            | Self::EcoTechPragmatist
            | Self::Unknown => 5.0,
        }
    }

    /// Fun-drive adjustment: enthusiast segments lean experiential, pragmatic
    /// segments lean purchase-directed.
    pub fn fun_drive_bias(&self) -> f64 {
        match self {
            Self::PerformanceEnthusiast | Self::EarlyAdopter => 1.0,
            Self::PragmaticAnalyst | Self::BudgetConsciousFamily => -1.0,
            _ => 0.0,
        }
    }
}

impl Default for Archetype {
    fn default() -> Self {
        Self::Unknown
    }
}

impl std::fmt::Display for Archetype {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}
