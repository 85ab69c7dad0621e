//! Structured insight generation.
//!
//! Builds a fixed instruction prompt around retrieved context, invokes the
//! generative capability, and parses the reply into a JSON insight tree.
//!
//! # Failure contract
//!
//! - Transient capability failures (rate limit, availability) are retried
//!   with a fixed delay up to the configured attempt ceiling; after that the
//!   deterministic fallback insight is substituted and flagged, so the
//!   pipeline always terminates with a structured value.
//! - Malformed JSON in an otherwise successful reply is a contract
//!   violation: it propagates immediately as [`Error::MalformedOutput`] and
//!   never consumes retry budget.
//! - Permanent capability errors propagate immediately as
//!   [`Error::Generation`].

use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::GenerationConfig;
use crate::error::{Error, Result};
use crate::models::InsightReport;

/// Instruction template; `{context}` is replaced with the retrieved blob.
const INSIGHT_PROMPT: &str = r#"You are a medical analysis AI. Given the patient data and medical history in the context below, generate a structured, long-form JSON insight report, for the doctor to have a better understanding of the patient's health status.

Instructions:
- Extract and summarize patient background
- Identify key medical events and organize them in a timeline
- Highlight current symptoms, risk factors, and any test results
- Add a section with personalized recommendations
- Return your answer ONLY as a JSON object with the following fields, with no free text outside the JSON:

{
  "patient_summary": "...",
  "timeline": [
    {"date": "...", "event": "...", "finding": "..."}
  ],
  "previous_medications": [...],
  "current_health_status": "...",
  "allergies": [...],
  "family_history": "...",
  "test_results": {
    "blood_test": "...",
    "culture_test": "...",
    "imaging": "..."
  },
  "recommendations": [...]
}

Context:
{context}
"#;

/// Capability interface for text generation.
///
/// Implementations classify their failures: rate-limit/availability
/// problems must surface as [`Error::TransientGeneration`] so the retry
/// policy can absorb them; anything else as [`Error::Generation`].
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String>;
}

/// Retry policy for transient generation failures. Injectable so tests can
/// run with a zero delay.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &GenerationConfig) -> Self {
        Self {
            max_attempts: config.max_attempts,
            delay: config.retry_delay(),
        }
    }
}

/// Generate a structured insight from retrieved context.
///
/// Returns a real insight, or the deterministic fallback (flagged) once
/// transient failures exhaust the retry budget.
pub async fn generate_insight(
    generator: &dyn TextGenerator,
    policy: RetryPolicy,
    temperature: f32,
    context: &str,
) -> Result<InsightReport> {
    let prompt = INSIGHT_PROMPT.replace("{context}", context);

    for attempt in 1..=policy.max_attempts {
        match generator.generate(&prompt, temperature).await {
            Ok(raw) => {
                let insight = parse_insight(&raw)?;
                debug!(attempt, "generation succeeded");
                return Ok(InsightReport {
                    insight,
                    fallback: false,
                });
            }
            Err(Error::TransientGeneration(reason)) => {
                warn!(attempt, %reason, "generation transiently unavailable");
                if attempt < policy.max_attempts {
                    tokio::time::sleep(policy.delay).await;
                }
            }
            Err(other) => return Err(other),
        }
    }

    warn!("retry budget exhausted, substituting fallback insight");
    Ok(fallback_insight(context))
}

/// Parse a raw model reply into the insight tree.
fn parse_insight(raw: &str) -> Result<serde_json::Value> {
    let payload = extract_json_payload(raw);
    let value: serde_json::Value = serde_json::from_str(payload)
        .map_err(|e| Error::MalformedOutput(e.to_string()))?;

    if !value.is_object() {
        return Err(Error::MalformedOutput(
            "reply parsed as JSON but is not an object".to_string(),
        ));
    }
    Ok(value)
}

/// Two-branch payload grammar: the content between the first pair of
/// triple-backtick fences (optional `json` tag), otherwise the whole
/// trimmed reply.
fn extract_json_payload(raw: &str) -> &str {
    if let Some(open) = raw.find("```") {
        let mut body = &raw[open + 3..];
        if let Some(stripped) = body.strip_prefix("json") {
            body = stripped;
        }
        if let Some(close) = body.find("```") {
            return body[..close].trim();
        }
    }
    raw.trim()
}

/// Deterministic substitute used when the capability stays unavailable:
/// derived only from the context word count plus fixed advisory text.
fn fallback_insight(context: &str) -> InsightReport {
    let word_count = context.split_whitespace().count();
    InsightReport {
        insight: json!({
            "patient_summary": format!(
                "Automated analysis is unavailable. The retrieved context contains approximately {} words of medical information.",
                word_count
            ),
            "current_health_status": "Detailed analysis could not be produced because the analysis service was temporarily unavailable.",
            "recommendations": [
                "Review the source documents manually or consult a healthcare professional for accurate interpretation.",
                "Retry the analysis later for a comprehensive report."
            ],
        }),
        fallback: true,
    }
}

// ============ Gemini client ============

/// Generation client for the Gemini `generateContent` API.
pub struct GeminiGenerator {
    client: reqwest::Client,
    model: String,
    api_key: String,
}

impl GeminiGenerator {
    pub fn new(config: &GenerationConfig, api_key: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Generation(e.to_string()))?;

        Ok(Self {
            client,
            model: config.model.clone(),
            api_key,
        })
    }
}

#[async_trait]
impl TextGenerator for GeminiGenerator {
    async fn generate(&self, prompt: &str, temperature: f32) -> Result<String> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        );
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "temperature": temperature },
        });

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::TransientGeneration(e.to_string()))?;

        let status = response.status();
        if status.as_u16() == 429 || status.is_server_error() {
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::TransientGeneration(format!(
                "generateContent returned {}: {}",
                status, detail
            )));
        }
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::Generation(format!(
                "generateContent returned {}: {}",
                status, detail
            )));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::Generation(e.to_string()))?;
        parse_generation(&json)
    }
}

/// Concatenate the text parts of the first candidate.
fn parse_generation(json: &serde_json::Value) -> Result<String> {
    let parts = json
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.as_array())
        .ok_or_else(|| Error::Generation("response missing candidates[0].content.parts".to_string()))?;

    let text: String = parts
        .iter()
        .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
        .collect();

    if text.is_empty() {
        return Err(Error::Generation("response contained no text parts".to_string()));
    }
    Ok(text)
}
