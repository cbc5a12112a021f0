//! Core domain types for caresense
//!
//! These types are the canonical shape of a risk assessment. The wire-facing
//! structs serialize with the camelCase field names the model is instructed
//! to produce (`riskLevel`, `copingAndWellness`, `whatToDoNow`, ...), so a
//! well-formed response deserializes directly into [`AnalysisResult`].
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Risk level** | One of Low/Medium/High, the primary classification output |
//! | **Coping item** | A titled, short actionable wellness suggestion |
//! | **Trend** | Directional comparison of the current risk level against the most recent prior one |
//! | **Raw response** | Preserved original text shown to the user when structured parsing is not fully achievable |

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Minimum effective symptom description length, enforced before any call.
pub const MIN_SYMPTOM_CHARS: usize = 5;

// ============================================
// Input
// ============================================

/// Self-reported symptom severity. Free-text severity is never accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Mild => "Mild",
            Severity::Moderate => "Moderate",
            Severity::Severe => "Severe",
        }
    }

    /// All options, in the order the UI presents them.
    pub const ALL: [Severity; 3] = [Severity::Mild, Severity::Moderate, Severity::Severe];
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Mild" => Ok(Severity::Mild),
            "Moderate" => Ok(Severity::Moderate),
            "Severe" => Ok(Severity::Severe),
            _ => Err(format!("unknown severity: {}", s)),
        }
    }
}

/// What the user submits: free-text symptoms, a duration bucket, and an
/// optional severity tag. Immutable once submitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymptomInput {
    /// Free-text symptom description
    pub symptoms: String,
    /// Approximate symptom duration in days, from a fixed option list
    pub duration_days: u32,
    /// Optional severity tag
    pub severity: Option<Severity>,
}

impl SymptomInput {
    /// Validate the input locally, before any network call.
    ///
    /// The only rule is the minimum effective symptom length; the duration
    /// and severity fields are structurally closed and need no checking.
    pub fn validate(&self) -> Result<()> {
        if self.symptoms.trim().chars().count() < MIN_SYMPTOM_CHARS {
            return Err(Error::Validation(
                "Please describe your symptoms in a bit more detail.".to_string(),
            ));
        }
        Ok(())
    }
}

// ============================================
// Analysis result
// ============================================

/// The classified risk level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }

    /// Ordinal used by the trend comparison (Low=1, Medium=2, High=3).
    pub fn ordinal(&self) -> u8 {
        match self {
            RiskLevel::Low => 1,
            RiskLevel::Medium => 2,
            RiskLevel::High => 3,
        }
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Low" => Ok(RiskLevel::Low),
            "Medium" => Ok(RiskLevel::Medium),
            "High" => Ok(RiskLevel::High),
            _ => Err(format!("unknown risk level: {}", s)),
        }
    }
}

/// A titled, short actionable wellness suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopingItem {
    pub title: String,
    pub description: String,
}

/// Optional structured daily plan: four fixed time-of-day slots, each an
/// optional free-text action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyPlan {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub morning: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub afternoon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evening: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub night: Option<String>,
}

impl DailyPlan {
    /// The plan's slots in display order, with their labels.
    pub fn slots(&self) -> [(&'static str, Option<&str>); 4] {
        [
            ("Morning", self.morning.as_deref()),
            ("Afternoon", self.afternoon.as_deref()),
            ("Evening", self.evening.as_deref()),
            ("Night", self.night.as_deref()),
        ]
    }
}

/// Optional free-text risk-factor breakdown, kept as plain text for
/// transparency.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskFactors {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_factor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity_factor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symptom_logic: Option<String>,
}

/// Next-step guidance attached to every result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NextSteps {
    pub what_to_do_now: String,
    pub when_to_seek_help: String,
    /// Populated for high-risk situations; may be absent or empty otherwise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emergency_guidance: Option<String>,
}

/// A complete risk assessment. Produced once per successful analysis call;
/// never mutated after creation, only superseded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub risk_level: RiskLevel,
    pub explanation: String,
    pub coping_and_wellness: Vec<CopingItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_plan: Option<DailyPlan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_analysis: Option<RiskFactors>,
    pub next_steps: NextSteps,
    /// Mandatory; a default is substituted when the upstream source omits one.
    pub disclaimer: String,
    /// Preserved original text, set only when structured parsing fails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_response: Option<String>,
}

// ============================================
// History and trend
// ============================================

/// One persisted prior result: risk level plus timestamp, newest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub risk_level: RiskLevel,
    pub date: DateTime<Utc>,
}

/// Directional comparison against the most recent prior result. Derived on
/// every new assessment, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskTrend {
    Improving,
    Worsening,
    Unchanged,
    Unknown,
}

impl RiskTrend {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTrend::Improving => "Improving",
            RiskTrend::Worsening => "Worsening",
            RiskTrend::Unchanged => "Unchanged",
            RiskTrend::Unknown => "Unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_level_ordinals() {
        assert!(RiskLevel::Low.ordinal() < RiskLevel::Medium.ordinal());
        assert!(RiskLevel::Medium.ordinal() < RiskLevel::High.ordinal());
    }

    #[test]
    fn test_risk_level_round_trip() {
        for level in [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High] {
            let parsed: RiskLevel = level.as_str().parse().unwrap();
            assert_eq!(parsed, level);
        }
        assert!("Critical".parse::<RiskLevel>().is_err());
    }

    #[test]
    fn test_severity_is_closed() {
        assert!("Mild".parse::<Severity>().is_ok());
        assert!("mild".parse::<Severity>().is_err());
        assert!("Unbearable".parse::<Severity>().is_err());
    }

    #[test]
    fn test_symptom_input_validation() {
        let input = SymptomInput {
            symptoms: "   hi  ".to_string(),
            duration_days: 2,
            severity: None,
        };
        assert!(input.validate().is_err());

        let input = SymptomInput {
            symptoms: "mild headache for 2 days".to_string(),
            duration_days: 2,
            severity: Some(Severity::Mild),
        };
        assert!(input.validate().is_ok());
    }

    #[test]
    fn test_analysis_result_wire_names() {
        let json = r#"{
            "riskLevel": "Low",
            "explanation": "Short-lived mild symptoms.",
            "copingAndWellness": [
                {"title": "Rest", "description": "Take it easy today."}
            ],
            "nextSteps": {
                "whatToDoNow": "Hydrate and rest.",
                "whenToSeekHelp": "If symptoms persist beyond a week."
            },
            "disclaimer": "Not medical advice."
        }"#;
        let result: AnalysisResult = serde_json::from_str(json).unwrap();
        assert_eq!(result.risk_level, RiskLevel::Low);
        assert_eq!(result.coping_and_wellness.len(), 1);
        assert!(result.next_steps.emergency_guidance.is_none());
        assert!(result.daily_plan.is_none());
        assert!(result.raw_response.is_none());
    }
}
