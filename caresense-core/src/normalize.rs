//! Response normalization for model output.
//!
//! The hosted model is asked for a JSON object matching [`AnalysisResult`],
//! but nothing guarantees it honors that shape: payloads arrive fenced,
//! partially structured, or as free text. This module coerces every payload
//! into a renderable [`AnalysisResult`] and never signals failure to its
//! caller; the worst case degrades to a Medium-risk fallback that preserves
//! the original text for display.

use serde_json::{json, Value};

use crate::types::{AnalysisResult, CopingItem, NextSteps, RiskLevel};

/// Substituted whenever the upstream response omits a disclaimer.
pub const DEFAULT_DISCLAIMER: &str = "This is not medical advice. CareSense provides \
     informational guidance only. Consult a qualified health professional for any \
     medical concern.";

/// Placeholder title used when adapting a flat tip string into a coping item.
const GENERIC_TIP_TITLE: &str = "Wellness Tip";

/// Generic next-step defaults used when the payload carries none.
const FALLBACK_WHAT_TO_DO_NOW: &str =
    "Review the guidance below and consider repeating the assessment.";
const FALLBACK_WHEN_TO_SEEK_HELP: &str =
    "Seek professional care if you feel unwell or your symptoms worsen.";

/// How much structure could be recovered from a raw payload.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedPayload {
    /// The payload deserialized into the full result shape.
    WellFormed(AnalysisResult),
    /// A JSON object that is missing or mangling required fields; salvaged
    /// field by field, with the pretty-printed object kept for display.
    PartiallyStructured(Value),
    /// Not a JSON object at all; the cleaned text is kept verbatim.
    Unparseable(String),
}

/// Strip a leading/trailing triple-backtick fence (with optional language
/// tag) so fenced payloads reach the JSON parser as plain text.
pub fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop the opening fence line, language tag included
    let Some(newline) = rest.find('\n') else {
        return trimmed;
    };
    let body = rest[newline + 1..].trim_end();
    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Classify a raw payload into the best structure it supports.
///
/// The steps are ordered and each is final if it succeeds: fence strip, JSON
/// parse, primary coping field, alternate flat tip list, full-shape accept
/// with the substitutable fields defaulted.
pub fn classify_payload(raw: &str) -> NormalizedPayload {
    let cleaned = strip_code_fences(raw);

    let value: Value = match serde_json::from_str(cleaned) {
        Ok(v) => v,
        Err(_) => return NormalizedPayload::Unparseable(cleaned.to_string()),
    };
    if !value.is_object() {
        return NormalizedPayload::Unparseable(cleaned.to_string());
    }

    if let Some(coping) = extract_coping_list(&value) {
        let mut candidate = value.clone();
        if let Some(obj) = candidate.as_object_mut() {
            obj.insert(
                "copingAndWellness".to_string(),
                Value::Array(
                    coping
                        .iter()
                        .map(|c| json!({ "title": c.title, "description": c.description }))
                        .collect(),
                ),
            );
            obj.remove("wellnessTips");
            fill_substitutable_defaults(obj);
        }
        if let Ok(result) = serde_json::from_value::<AnalysisResult>(candidate) {
            return NormalizedPayload::WellFormed(result);
        }
    }

    NormalizedPayload::PartiallyStructured(value)
}

/// Coerce any raw payload into a renderable result. Never fails.
pub fn normalize(raw: &str) -> AnalysisResult {
    match classify_payload(raw) {
        NormalizedPayload::WellFormed(mut result) => {
            if result.disclaimer.trim().is_empty() {
                result.disclaimer = DEFAULT_DISCLAIMER.to_string();
            }
            result
        }
        NormalizedPayload::PartiallyStructured(value) => partial_result(value),
        NormalizedPayload::Unparseable(text) => unparseable_result(text),
    }
}

/// Pull a well-formed coping list out of the object, adapting the alternate
/// flat `wellnessTips` form when the primary field is absent.
fn extract_coping_list(value: &Value) -> Option<Vec<CopingItem>> {
    if let Some(items) = value.get("copingAndWellness").and_then(Value::as_array) {
        return items
            .iter()
            .map(|item| {
                let title = item.get("title")?.as_str()?;
                let description = item.get("description")?.as_str()?;
                Some(CopingItem {
                    title: title.to_string(),
                    description: description.to_string(),
                })
            })
            .collect();
    }

    let tips = value.get("wellnessTips")?.as_array()?;
    tips.iter()
        .map(|tip| {
            Some(CopingItem {
                title: GENERIC_TIP_TITLE.to_string(),
                description: tip.as_str()?.to_string(),
            })
        })
        .collect()
}

/// Substitute the defaultable fields in place so a payload with a usable
/// coping list is not demoted for omitting them. The risk level, explanation,
/// and coping list stay mandatory for the full-shape accept.
fn fill_substitutable_defaults(obj: &mut serde_json::Map<String, Value>) {
    let has_disclaimer = obj
        .get("disclaimer")
        .and_then(Value::as_str)
        .is_some_and(|s| !s.trim().is_empty());
    if !has_disclaimer {
        obj.insert(
            "disclaimer".to_string(),
            Value::String(DEFAULT_DISCLAIMER.to_string()),
        );
    }

    let steps = obj.entry("nextSteps").or_insert_with(|| json!({}));
    if let Some(steps) = steps.as_object_mut() {
        for (key, default) in [
            ("whatToDoNow", FALLBACK_WHAT_TO_DO_NOW),
            ("whenToSeekHelp", FALLBACK_WHEN_TO_SEEK_HELP),
        ] {
            if steps.get(key).and_then(Value::as_str).is_none() {
                steps.insert(key.to_string(), Value::String(default.to_string()));
            }
        }
    }
}

/// Salvage what a partially structured object carries, defaulting the rest.
fn partial_result(value: Value) -> AnalysisResult {
    let risk_level = value
        .get("riskLevel")
        .and_then(Value::as_str)
        .and_then(|s| s.parse().ok())
        .unwrap_or(RiskLevel::Medium);

    let explanation = value
        .get("explanation")
        .and_then(Value::as_str)
        .or_else(|| value.get("result").and_then(Value::as_str))
        .map(ToString::to_string)
        .unwrap_or_else(|| pretty(&value));

    let steps = value.get("nextSteps");
    let next_steps = NextSteps {
        what_to_do_now: field_or(steps, "whatToDoNow", FALLBACK_WHAT_TO_DO_NOW),
        when_to_seek_help: field_or(steps, "whenToSeekHelp", FALLBACK_WHEN_TO_SEEK_HELP),
        emergency_guidance: steps
            .and_then(|s| s.get("emergencyGuidance"))
            .and_then(Value::as_str)
            .map(ToString::to_string),
    };

    let disclaimer = value
        .get("disclaimer")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(ToString::to_string)
        .unwrap_or_else(|| DEFAULT_DISCLAIMER.to_string());

    AnalysisResult {
        risk_level,
        explanation,
        coping_and_wellness: Vec::new(),
        daily_plan: None,
        risk_analysis: None,
        next_steps,
        disclaimer,
        raw_response: Some(pretty(&value)),
    }
}

/// Best-effort record for payloads that are not JSON objects at all.
fn unparseable_result(cleaned: String) -> AnalysisResult {
    AnalysisResult {
        risk_level: RiskLevel::Medium,
        explanation: "The analysis service returned unstructured text instead of a \
             structured assessment. The original response is preserved below."
            .to_string(),
        coping_and_wellness: Vec::new(),
        daily_plan: None,
        risk_analysis: None,
        next_steps: NextSteps {
            what_to_do_now: FALLBACK_WHAT_TO_DO_NOW.to_string(),
            when_to_seek_help: FALLBACK_WHEN_TO_SEEK_HELP.to_string(),
            emergency_guidance: None,
        },
        disclaimer: DEFAULT_DISCLAIMER.to_string(),
        raw_response: Some(cleaned),
    }
}

fn field_or(steps: Option<&Value>, key: &str, default: &str) -> String {
    steps
        .and_then(|s| s.get(key))
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .unwrap_or_else(|| default.to_string())
}

fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = r#"{
        "riskLevel": "Low",
        "explanation": "Short-lived mild symptoms with no red flags.",
        "copingAndWellness": [
            {"title": "Breathing Exercise", "description": "Slow breaths for five minutes."},
            {"title": "Hydration", "description": "Drink water regularly through the day."}
        ],
        "nextSteps": {
            "whatToDoNow": "Rest and monitor how you feel.",
            "whenToSeekHelp": "If symptoms persist beyond a week.",
            "emergencyGuidance": ""
        },
        "disclaimer": "Informational guidance only."
    }"#;

    #[test]
    fn strips_fence_with_language_tag() {
        let raw = "```json\n{\"riskLevel\": \"Low\"}\n```";
        assert_eq!(strip_code_fences(raw), "{\"riskLevel\": \"Low\"}");
    }

    #[test]
    fn strips_bare_fence() {
        let raw = "```\n{\"a\": 1}\n```";
        assert_eq!(strip_code_fences(raw), "{\"a\": 1}");
    }

    #[test]
    fn leaves_unfenced_text_alone() {
        assert_eq!(strip_code_fences("  plain text  "), "plain text");
    }

    #[test]
    fn well_formed_payload_round_trips() {
        let result = normalize(WELL_FORMED);
        assert_eq!(result.risk_level, RiskLevel::Low);
        assert_eq!(
            result.explanation,
            "Short-lived mild symptoms with no red flags."
        );
        assert_eq!(result.coping_and_wellness.len(), 2);
        assert_eq!(result.coping_and_wellness[0].title, "Breathing Exercise");
        assert_eq!(result.next_steps.what_to_do_now, "Rest and monitor how you feel.");
        assert_eq!(result.disclaimer, "Informational guidance only.");
        assert!(result.raw_response.is_none());
    }

    #[test]
    fn fenced_well_formed_payload_parses() {
        let fenced = format!("```json\n{}\n```", WELL_FORMED);
        let result = normalize(&fenced);
        assert_eq!(result.risk_level, RiskLevel::Low);
        assert!(result.raw_response.is_none());
    }

    #[test]
    fn flat_tip_list_is_adapted() {
        let raw = r#"{
            "riskLevel": "Medium",
            "explanation": "Ongoing moderate symptoms.",
            "wellnessTips": ["Rest more", "Stay hydrated", "Light stretching"],
            "nextSteps": {
                "whatToDoNow": "Take it easy.",
                "whenToSeekHelp": "If things get worse."
            },
            "disclaimer": "Informational only."
        }"#;
        let result = normalize(raw);
        assert_eq!(result.coping_and_wellness.len(), 3);
        for item in &result.coping_and_wellness {
            assert_eq!(item.title, "Wellness Tip");
        }
        assert_eq!(result.coping_and_wellness[1].description, "Stay hydrated");
        assert!(result.raw_response.is_none());
    }

    #[test]
    fn non_json_falls_back_to_medium() {
        let raw = "I think you should rest and drink fluids.";
        let result = normalize(raw);
        assert_eq!(result.risk_level, RiskLevel::Medium);
        assert!(result.coping_and_wellness.is_empty());
        assert_eq!(result.raw_response.as_deref(), Some(raw));
        assert_eq!(result.disclaimer, DEFAULT_DISCLAIMER);
    }

    #[test]
    fn json_array_is_treated_as_unparseable() {
        let raw = r#"["not", "an", "object"]"#;
        assert!(matches!(
            classify_payload(raw),
            NormalizedPayload::Unparseable(_)
        ));
    }

    #[test]
    fn partial_object_is_salvaged() {
        let raw = r#"{"riskLevel": "High", "result": "Please get checked soon."}"#;
        let result = normalize(raw);
        assert_eq!(result.risk_level, RiskLevel::High);
        assert_eq!(result.explanation, "Please get checked soon.");
        assert!(result.coping_and_wellness.is_empty());
        assert_eq!(result.next_steps.what_to_do_now, FALLBACK_WHAT_TO_DO_NOW);
        assert_eq!(result.disclaimer, DEFAULT_DISCLAIMER);
        // The full object is preserved, pretty-printed, for display
        let raw_field = result.raw_response.expect("raw dump should be set");
        assert!(raw_field.contains("\"riskLevel\""));
    }

    #[test]
    fn partial_object_without_known_fields_dumps_object() {
        let raw = r#"{"verdict": "unclear"}"#;
        let result = normalize(raw);
        assert_eq!(result.risk_level, RiskLevel::Medium);
        assert!(result.explanation.contains("verdict"));
    }

    #[test]
    fn malformed_coping_entries_demote_to_partial() {
        let raw = r#"{
            "riskLevel": "Low",
            "explanation": "ok",
            "copingAndWellness": [{"title": "Rest"}],
            "nextSteps": {"whatToDoNow": "a", "whenToSeekHelp": "b"},
            "disclaimer": "d"
        }"#;
        assert!(matches!(
            classify_payload(raw),
            NormalizedPayload::PartiallyStructured(_)
        ));
        let result = normalize(raw);
        assert_eq!(result.risk_level, RiskLevel::Low);
        assert_eq!(result.next_steps.what_to_do_now, "a");
    }

    #[test]
    fn empty_disclaimer_is_substituted() {
        let raw = WELL_FORMED.replace("Informational guidance only.", "  ");
        let result = normalize(&raw);
        assert_eq!(result.disclaimer, DEFAULT_DISCLAIMER);
    }

    #[test]
    fn missing_disclaimer_is_substituted_without_losing_coping() {
        let raw = r#"{
            "riskLevel": "Low",
            "explanation": "Mild and short-lived.",
            "copingAndWellness": [{"title": "Rest", "description": "Sleep early."}],
            "nextSteps": {"whatToDoNow": "Rest.", "whenToSeekHelp": "If worse."}
        }"#;
        let result = normalize(raw);
        assert_eq!(result.coping_and_wellness.len(), 1);
        assert_eq!(result.disclaimer, DEFAULT_DISCLAIMER);
        assert!(result.raw_response.is_none());
    }

    #[test]
    fn tip_list_without_disclaimer_or_next_steps_is_still_adapted() {
        let raw = r#"{
            "riskLevel": "Medium",
            "explanation": "Ongoing moderate symptoms.",
            "wellnessTips": ["Rest more", "Stay hydrated"]
        }"#;
        let result = normalize(raw);
        assert_eq!(result.coping_and_wellness.len(), 2);
        assert_eq!(result.disclaimer, DEFAULT_DISCLAIMER);
        assert_eq!(result.next_steps.what_to_do_now, FALLBACK_WHAT_TO_DO_NOW);
        assert_eq!(result.next_steps.when_to_seek_help, FALLBACK_WHEN_TO_SEEK_HELP);
        assert!(result.raw_response.is_none());
    }

    #[test]
    fn optional_sections_deserialize_when_present() {
        let raw = r#"{
            "riskLevel": "Medium",
            "explanation": "Moderate symptoms over several days.",
            "copingAndWellness": [{"title": "Rest", "description": "Sleep early."}],
            "dailyPlan": {"morning": "Gentle stretch", "evening": "Short walk"},
            "riskAnalysis": {
                "durationFactor": "Four days is in the watchful range.",
                "severityFactor": "Moderate severity raises attention.",
                "symptomLogic": "Combined signals suggest monitoring."
            },
            "nextSteps": {"whatToDoNow": "Monitor.", "whenToSeekHelp": "If worsening."},
            "disclaimer": "Informational only."
        }"#;
        let result = normalize(raw);
        let plan = result.daily_plan.expect("daily plan should survive");
        assert_eq!(plan.morning.as_deref(), Some("Gentle stretch"));
        assert!(plan.afternoon.is_none());
        let factors = result.risk_analysis.expect("risk analysis should survive");
        assert!(factors.duration_factor.is_some());
    }
}
