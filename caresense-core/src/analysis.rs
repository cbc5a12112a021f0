//! The analysis operation: prompt construction, the hosted-model call, and
//! the normalize/trend/record pipeline behind a single entry point.
//!
//! The model call sits behind [`CompletionClient`] so the UI and tests never
//! depend on a live endpoint. Only configuration and transport failures
//! propagate as errors; response-shape problems are absorbed by the
//! normalizer and always yield a renderable result.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde_json::json;

use crate::config::{LlmConfig, LlmProvider};
use crate::error::{Error, Result};
use crate::history::HistoryStore;
use crate::normalize::normalize;
use crate::trend::risk_trend;
use crate::types::{AnalysisResult, HistoryEntry, RiskTrend, SymptomInput};

/// Fixed instruction sent with every request. The rules are the product's
/// safety envelope: no diagnosis, no treatment, conservative classification,
/// JSON output in the described shape.
const SYSTEM_PROMPT: &str = "You are CareSense, a health risk awareness assistant. Your purpose is to provide informational guidance, NOT medical advice. Analyze the user-provided symptoms and wellness indicators holistically.\n\
Your tasks are:\n\
1. Classify Risk: categorize the potential health risk as \"Low\", \"Medium\", or \"High\" based on the combination of symptoms, duration, and severity. Be cautious and conservative in your assessment.\n\
2. Provide a simple explanation: briefly explain the reasoning for the risk level in calm, non-alarming, simple language.\n\
3. Suggest Coping & Wellness Activities: offer safe, general self-care and wellness suggestions focused on stress reduction, lifestyle improvements (hydration, rest), and mental grounding.\n\
4. Give Next-Step Guidance: advise what to do now and when to seek professional medical help. For \"High\" risk, include a strong recommendation to contact local health services immediately.\n\
5. Include a Disclaimer: always include the mandatory disclaimer that this is not medical advice.\n\
CRITICAL RULES:\n\
- DO NOT DIAGNOSE. Never name or suggest any specific medical condition, disease, or illness.\n\
- DO NOT PROVIDE MEDICAL TREATMENT. Do not recommend any medication, specific therapies, or medical procedures.\n\
- Use supportive, empathetic, simple language. Avoid technical jargon.\n\
- The output must be a valid JSON object with these fields: \"riskLevel\" (\"Low\"|\"Medium\"|\"High\"), \"explanation\" (string), \"copingAndWellness\" (array of {\"title\", \"description\"}), \"dailyPlan\" (optional object with \"morning\", \"afternoon\", \"evening\", \"night\" strings), \"riskAnalysis\" (optional object with \"durationFactor\", \"severityFactor\", \"symptomLogic\" strings), \"nextSteps\" (object with \"whatToDoNow\", \"whenToSeekHelp\", optional \"emergencyGuidance\"), \"disclaimer\" (string). Return only JSON.";

/// Everything the Result screen needs from one analysis call.
#[derive(Debug, Clone)]
pub struct AnalysisOutcome {
    pub result: AnalysisResult,
    /// Derived against the history as it stood before this call.
    pub trend: RiskTrend,
    /// Snapshot of prior entries, newest first, for the history strip.
    pub prior: Vec<HistoryEntry>,
}

/// LLM completion interface for risk analysis.
pub trait CompletionClient: Send + Sync {
    fn complete(&self, prompt: &str) -> Result<String>;
}

/// Create the default HTTP-backed completion client.
///
/// Fails with a configuration error, before any network attempt, when the
/// provider configuration is incomplete.
pub fn create_completion_client(llm: &LlmConfig) -> Result<Box<dyn CompletionClient>> {
    Ok(Box::new(HttpCompletionClient::new(llm)?))
}

/// Build the user message from the three input fields, as plain text.
pub fn build_prompt(input: &SymptomInput) -> String {
    let severity = input
        .severity
        .map(|s| format!("\"{}\"", s.as_str()))
        .unwrap_or_else(|| "Not specified".to_string());

    format!(
        "User's Data:\n\
         - Symptoms: \"{}\"\n\
         - Symptom Duration (Approx. Days): {}\n\
         - Symptom Severity: {}",
        input.symptoms.trim(),
        input.duration_days,
        severity
    )
}

/// Run one analysis: exactly one completion call, then normalize, derive the
/// trend from the pre-call history, and record the new level best-effort.
///
/// Validation failures and configuration/transport errors are the only `Err`
/// outcomes; any response payload, however malformed, produces `Ok`.
pub fn analyze(
    input: &SymptomInput,
    client: &dyn CompletionClient,
    history: &mut dyn HistoryStore,
) -> Result<AnalysisOutcome> {
    input.validate()?;

    let prompt = build_prompt(input);
    tracing::debug!(duration_days = input.duration_days, "Requesting risk analysis");

    let raw = client.complete(&prompt)?;
    let result = normalize(&raw);
    tracing::info!(
        risk_level = result.risk_level.as_str(),
        structured = result.raw_response.is_none(),
        "Risk analysis completed"
    );

    let prior = history.read();
    let trend = risk_trend(result.risk_level, &prior);

    // History persistence is best-effort; a full result still reaches the UI
    if let Err(e) = history.record(result.risk_level) {
        tracing::warn!(error = %e, "Failed to persist risk history");
    }

    Ok(AnalysisOutcome {
        result,
        trend,
        prior,
    })
}

struct HttpCompletionClient {
    model: String,
    provider: LlmProvider,
    endpoint: String,
    api_key: Option<String>,
    runtime: tokio::runtime::Runtime,
    http: reqwest::Client,
}

impl HttpCompletionClient {
    fn new(config: &LlmConfig) -> Result<Self> {
        config.validate()?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Llm(format!("failed to build tokio runtime: {e}")))?;
        let timeout_secs = config.timeout_secs.max(1);
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| Error::Llm(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            model: config.model.clone(),
            provider: config.provider,
            endpoint: config.resolved_endpoint(),
            api_key: config.resolved_api_key(),
            runtime,
            http,
        })
    }
}

impl CompletionClient for HttpCompletionClient {
    fn complete(&self, prompt: &str) -> Result<String> {
        self.runtime.block_on(async {
            match self.provider {
                LlmProvider::Ollama => {
                    let url = format!("{}/api/generate", self.endpoint);
                    let resp = self
                        .http
                        .post(url)
                        .json(&json!({
                            "model": self.model,
                            "system": SYSTEM_PROMPT,
                            "prompt": prompt,
                            "format": "json",
                            "stream": false,
                        }))
                        .send()
                        .await
                        .map_err(|e| Error::Llm(format!("ollama request failed: {e}")))?;
                    let status = resp.status();
                    let body = resp
                        .text()
                        .await
                        .map_err(|e| Error::Llm(format!("ollama read body failed: {e}")))?;
                    if !status.is_success() {
                        return Err(Error::Llm(format!(
                            "ollama returned {}: {}",
                            status.as_u16(),
                            body
                        )));
                    }
                    let json: serde_json::Value = serde_json::from_str(&body)?;
                    json.get("response")
                        .and_then(|v| v.as_str())
                        .map(ToString::to_string)
                        .ok_or_else(|| {
                            Error::Llm("ollama response missing string field `response`".to_string())
                        })
                }
                LlmProvider::Claude => {
                    let url = format!("{}/v1/messages", self.endpoint);
                    let mut headers = HeaderMap::new();
                    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                    headers.insert(
                        "x-api-key",
                        HeaderValue::from_str(self.api_key.as_deref().unwrap_or_default())
                            .map_err(|e| Error::Llm(format!("invalid claude api key header: {e}")))?,
                    );
                    headers.insert("anthropic-version", HeaderValue::from_static("2023-06-01"));

                    let resp = self
                        .http
                        .post(url)
                        .headers(headers)
                        .json(&json!({
                            "model": self.model,
                            "max_tokens": 1024,
                            "temperature": 0.5,
                            "system": SYSTEM_PROMPT,
                            "messages": [{ "role": "user", "content": prompt }],
                        }))
                        .send()
                        .await
                        .map_err(|e| Error::Llm(format!("claude request failed: {e}")))?;
                    let status = resp.status();
                    let body = resp
                        .text()
                        .await
                        .map_err(|e| Error::Llm(format!("claude read body failed: {e}")))?;
                    if !status.is_success() {
                        return Err(Error::Llm(format!(
                            "claude returned {}: {}",
                            status.as_u16(),
                            body
                        )));
                    }
                    let json: serde_json::Value = serde_json::from_str(&body)?;
                    json.get("content")
                        .and_then(|v| v.as_array())
                        .and_then(|arr| arr.first())
                        .and_then(|v| v.get("text"))
                        .and_then(|v| v.as_str())
                        .map(ToString::to_string)
                        .ok_or_else(|| {
                            Error::Llm("claude response missing content[0].text".to_string())
                        })
                }
                LlmProvider::OpenAI => {
                    // Also covers Azure-style hosted deployments via a custom
                    // endpoint plus the deployment name as the model id
                    let url = format!("{}/v1/chat/completions", self.endpoint);
                    let mut headers = HeaderMap::new();
                    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
                    headers.insert(
                        AUTHORIZATION,
                        HeaderValue::from_str(&format!(
                            "Bearer {}",
                            self.api_key.as_deref().unwrap_or_default()
                        ))
                        .map_err(|e| Error::Llm(format!("invalid auth header: {e}")))?,
                    );

                    let resp = self
                        .http
                        .post(url)
                        .headers(headers)
                        .json(&json!({
                            "model": self.model,
                            "temperature": 0.5,
                            "response_format": { "type": "json_object" },
                            "messages": [
                                { "role": "system", "content": SYSTEM_PROMPT },
                                { "role": "user", "content": prompt }
                            ]
                        }))
                        .send()
                        .await
                        .map_err(|e| Error::Llm(format!("openai request failed: {e}")))?;
                    let status = resp.status();
                    let body = resp
                        .text()
                        .await
                        .map_err(|e| Error::Llm(format!("openai read body failed: {e}")))?;
                    if !status.is_success() {
                        return Err(Error::Llm(format!(
                            "openai returned {}: {}",
                            status.as_u16(),
                            body
                        )));
                    }
                    let json: serde_json::Value = serde_json::from_str(&body)?;
                    json.get("choices")
                        .and_then(|v| v.as_array())
                        .and_then(|arr| arr.first())
                        .and_then(|v| v.get("message"))
                        .and_then(|v| v.get("content"))
                        .and_then(|v| v.as_str())
                        .map(ToString::to_string)
                        .ok_or_else(|| {
                            Error::Llm(
                                "openai response missing choices[0].message.content".to_string(),
                            )
                        })
                }
            }
        })
    }
}
