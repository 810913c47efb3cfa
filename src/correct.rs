//! AI grammar correction adapter
//!
//! Calls an external grammar/intent correction provider (Groq or Gemini,
//! first configured key wins) and parses a structured result. Every failure
//! mode falls back to the deterministic normalizer and heuristic extractor,
//! so this component never returns an error to its caller.

use crate::config::Config;
use crate::extract::extract_hint;
use crate::normalize::normalize;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const GROQ_MODEL: &str = "llama-3.1-8b-instant";
pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const GEMINI_MODEL: &str = "gemini-1.5-flash";

/// Confidence reported when the deterministic fallback produced the result
const FALLBACK_CONFIDENCE: f64 = 0.5;
/// Confidence assumed when the provider omits the field
const DEFAULT_AI_CONFIDENCE: f64 = 0.8;

/// Outcome of one correction request. Produced fresh per call, never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct CorrectionResult {
    pub corrected_text: String,
    pub detected_recipient: Option<String>,
    pub confidence: f64,
    pub error: Option<String>,
}

/// Failures internal to a provider call. Absorbed by the adapter; callers of
/// [`Corrector::correct`] never see these.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("transport: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {code}: {body}")]
    Status { code: u16, body: String },

    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

/// Completion providers in fixed preference order. `NoProvider` is the
/// degraded-mode signal, not an error.
#[derive(Debug, Clone)]
pub enum Provider {
    Groq { api_key: String, base_url: String },
    Gemini { api_key: String, base_url: String },
    NoProvider,
}

impl Provider {
    /// Select the first configured provider: Groq, then Gemini, else none.
    pub fn from_config(config: &Config) -> Self {
        if let Some(key) = &config.groq_api_key {
            Provider::Groq {
                api_key: key.clone(),
                base_url: GROQ_BASE_URL.to_string(),
            }
        } else if let Some(key) = &config.gemini_api_key {
            Provider::Gemini {
                api_key: key.clone(),
                base_url: GEMINI_BASE_URL.to_string(),
            }
        } else {
            Provider::NoProvider
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Provider::Groq { .. } => "groq",
            Provider::Gemini { .. } => "gemini",
            Provider::NoProvider => "none",
        }
    }

    pub fn is_configured(&self) -> bool {
        !matches!(self, Provider::NoProvider)
    }

    /// Single-attempt completion call, bounded by the client's timeout.
    async fn complete(
        &self,
        client: &reqwest::Client,
        prompt: &str,
    ) -> std::result::Result<String, TransportError> {
        match self {
            Provider::Groq { api_key, base_url } => {
                let response = client
                    .post(format!("{}/chat/completions", base_url))
                    .bearer_auth(api_key)
                    .json(&json!({
                        "model": GROQ_MODEL,
                        "messages": [{"role": "user", "content": prompt}],
                        "temperature": 0.3,
                        "max_tokens": 500
                    }))
                    .send()
                    .await?;

                let status = response.status();
                let body = response.text().await?;
                if !status.is_success() {
                    return Err(TransportError::Status {
                        code: status.as_u16(),
                        body,
                    });
                }

                #[derive(Deserialize)]
                struct GroqResponse {
                    choices: Vec<GroqChoice>,
                }
                #[derive(Deserialize)]
                struct GroqChoice {
                    message: GroqMessage,
                }
                #[derive(Deserialize)]
                struct GroqMessage {
                    content: String,
                }

                let parsed: GroqResponse = serde_json::from_str(&body)
                    .map_err(|e| TransportError::MalformedResponse(e.to_string()))?;
                parsed
                    .choices
                    .into_iter()
                    .next()
                    .map(|c| c.message.content)
                    .ok_or_else(|| TransportError::MalformedResponse("empty choices".to_string()))
            }
            Provider::Gemini { api_key, base_url } => {
                let response = client
                    .post(format!(
                        "{}/models/{}:generateContent?key={}",
                        base_url, GEMINI_MODEL, api_key
                    ))
                    .json(&json!({
                        "contents": [{"parts": [{"text": prompt}]}],
                        "generationConfig": {
                            "temperature": 0.3,
                            "maxOutputTokens": 500
                        }
                    }))
                    .send()
                    .await?;

                let status = response.status();
                let body = response.text().await?;
                if !status.is_success() {
                    return Err(TransportError::Status {
                        code: status.as_u16(),
                        body,
                    });
                }

                #[derive(Deserialize)]
                struct GeminiResponse {
                    candidates: Vec<GeminiCandidate>,
                }
                #[derive(Deserialize)]
                struct GeminiCandidate {
                    content: GeminiContent,
                }
                #[derive(Deserialize)]
                struct GeminiContent {
                    parts: Vec<GeminiPart>,
                }
                #[derive(Deserialize)]
                struct GeminiPart {
                    text: String,
                }

                let parsed: GeminiResponse = serde_json::from_str(&body)
                    .map_err(|e| TransportError::MalformedResponse(e.to_string()))?;
                parsed
                    .candidates
                    .into_iter()
                    .next()
                    .and_then(|c| c.content.parts.into_iter().next())
                    .map(|p| p.text)
                    .ok_or_else(|| {
                        TransportError::MalformedResponse("empty candidates".to_string())
                    })
            }
            Provider::NoProvider => Err(TransportError::MalformedResponse(
                "no provider configured".to_string(),
            )),
        }
    }
}

/// First brace-delimited JSON object anywhere in the provider output
/// (providers wrap JSON in prose)
static JSON_OBJECT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)\{[^{}]*\}").expect("Invalid JSON extraction regex"));

/// Grammar/intent correction with a deterministic fallback ladder
pub struct Corrector {
    provider: Provider,
    client: reqwest::Client,
}

impl Corrector {
    pub fn new(config: &Config) -> Self {
        Self::with_provider(
            Provider::from_config(config),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    pub fn with_provider(provider: Provider, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to build HTTP client");
        Self { provider, client }
    }

    pub fn active_provider(&self) -> &'static str {
        self.provider.name()
    }

    /// Fix grammar and detect the intended recipient.
    ///
    /// Always returns a well-formed result: with no provider configured, or
    /// on any transport/status/parse failure, degrades to the deterministic
    /// normalizer plus heuristic extraction, carrying the failure in `error`.
    pub async fn correct(&self, text: &str, known_contacts: &[String]) -> CorrectionResult {
        if !self.provider.is_configured() {
            debug!("no AI provider configured, using basic cleanup");
            return fallback_result(text, known_contacts, None);
        }

        let prompt = build_prompt(text, known_contacts);

        match self.provider.complete(&self.client, &prompt).await {
            Ok(raw) => parse_ai_response(&raw, text, known_contacts),
            Err(e) => {
                warn!(provider = self.provider.name(), error = %e, "AI call failed, falling back");
                fallback_result(text, known_contacts, Some(e.to_string()))
            }
        }
    }
}

/// The AI-absent result: basic cleanup plus pattern-based hint extraction
fn fallback_result(text: &str, known_contacts: &[String], error: Option<String>) -> CorrectionResult {
    CorrectionResult {
        corrected_text: normalize(text),
        detected_recipient: extract_hint(text, known_contacts),
        confidence: FALLBACK_CONFIDENCE,
        error,
    }
}

fn build_prompt(text: &str, known_contacts: &[String]) -> String {
    let contacts_str = if known_contacts.is_empty() {
        "none specified".to_string()
    } else {
        known_contacts.join(", ")
    };

    format!(
        r#"You are a grammar correction assistant for a messaging app.
Your task is to:
1. Fix any grammar, spelling, or punctuation errors in the transcribed speech
2. Identify who the message should be sent to
3. Extract just the message content (remove "send to X" prefix)

Known contacts: {contacts_str}

Input (speech-to-text transcription):
"{text}"

Respond in JSON format only:
{{
    "corrected_message": "the corrected message content only (not including 'send to X' prefix)",
    "recipient": "detected recipient name or null if unclear",
    "confidence": 0.0-1.0
}}

Examples:
- Input: "send message to rahul saying hey can you send me teh files tommorow"
  Output: {{"corrected_message": "Hey, can you send me the files tomorrow?", "recipient": "rahul", "confidence": 0.95}}

- Input: "tell my boss that the meeting went good and we closed the deal"
  Output: {{"corrected_message": "The meeting went well and we closed the deal.", "recipient": "boss", "confidence": 0.9}}

Now process the input above:"#
    )
}

/// Extract the structured correction from raw provider output. Any shape
/// problem degrades to the fallback result with `error` populated.
fn parse_ai_response(raw: &str, original_text: &str, known_contacts: &[String]) -> CorrectionResult {
    #[derive(Deserialize)]
    struct AiReply {
        corrected_message: Option<String>,
        recipient: Option<String>,
        confidence: Option<f64>,
    }

    let Some(m) = JSON_OBJECT.find(raw) else {
        return fallback_result(
            original_text,
            known_contacts,
            Some("no JSON object in AI response".to_string()),
        );
    };

    match serde_json::from_str::<AiReply>(m.as_str()) {
        Ok(reply) => CorrectionResult {
            corrected_text: reply
                .corrected_message
                .unwrap_or_else(|| normalize(original_text)),
            detected_recipient: reply.recipient,
            confidence: reply.confidence.unwrap_or(DEFAULT_AI_CONFIDENCE),
            error: None,
        },
        Err(e) => fallback_result(original_text, known_contacts, Some(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contacts(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_no_provider_falls_back() {
        let corrector = Corrector::with_provider(Provider::NoProvider, Duration::from_secs(1));
        let result = corrector
            .correct(
                "send message to rahul saying hey can you send me teh files tommorow",
                &contacts(&["rahul", "priya"]),
            )
            .await;

        assert!(result.corrected_text.contains("the"));
        assert!(result.corrected_text.contains("tomorrow"));
        assert!(!result.corrected_text.contains("teh"));
        assert!(!result.corrected_text.contains("tommorow"));
        assert_eq!(result.detected_recipient, Some("rahul".to_string()));
        assert_eq!(result.confidence, 0.5);
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn test_unreachable_provider_reports_error() {
        // Nothing listens on port 9; the call must fail fast and fall back
        let provider = Provider::Groq {
            api_key: "test-key".to_string(),
            base_url: "http://127.0.0.1:9".to_string(),
        };
        let corrector = Corrector::with_provider(provider, Duration::from_secs(2));
        let result = corrector.correct("tell bob im late", &contacts(&["bob"])).await;

        assert_eq!(result.corrected_text, "Tell bob I'm late.");
        assert_eq!(result.detected_recipient, Some("bob".to_string()));
        assert_eq!(result.confidence, 0.5);
        assert!(result.error.is_some());
    }

    #[test]
    fn test_provider_selection_order() {
        let temp = std::env::temp_dir();
        let mut config = Config::for_test(&temp);
        assert_eq!(Provider::from_config(&config).name(), "none");

        config.gemini_api_key = Some("g2".to_string());
        assert_eq!(Provider::from_config(&config).name(), "gemini");

        config.groq_api_key = Some("g1".to_string());
        assert_eq!(Provider::from_config(&config).name(), "groq");
    }

    #[test]
    fn test_parse_json_wrapped_in_prose() {
        let raw = r#"Sure! Here is the result:
{"corrected_message": "Hey, can you send me the files tomorrow?", "recipient": "rahul", "confidence": 0.95}
Let me know if you need anything else."#;

        let result = parse_ai_response(raw, "original", &contacts(&[]));
        assert_eq!(
            result.corrected_text,
            "Hey, can you send me the files tomorrow?"
        );
        assert_eq!(result.detected_recipient, Some("rahul".to_string()));
        assert_eq!(result.confidence, 0.95);
        assert!(result.error.is_none());
    }

    #[test]
    fn test_parse_missing_fields_use_defaults() {
        let raw = r#"{"corrected_message": "Hello."}"#;
        let result = parse_ai_response(raw, "hello", &contacts(&[]));
        assert_eq!(result.corrected_text, "Hello.");
        assert_eq!(result.detected_recipient, None);
        assert_eq!(result.confidence, 0.8);
    }

    #[test]
    fn test_parse_null_recipient() {
        let raw = r#"{"corrected_message": "Hi.", "recipient": null, "confidence": 0.7}"#;
        let result = parse_ai_response(raw, "hi", &contacts(&[]));
        assert_eq!(result.detected_recipient, None);
        assert_eq!(result.confidence, 0.7);
    }

    #[test]
    fn test_parse_missing_corrected_message_normalizes_original() {
        let raw = r#"{"recipient": "bob"}"#;
        let result = parse_ai_response(raw, "hey bob its me", &contacts(&[]));
        assert_eq!(result.corrected_text, "Hey bob it's me.");
        assert_eq!(result.detected_recipient, Some("bob".to_string()));
    }

    #[test]
    fn test_parse_no_json_falls_back_with_error() {
        let result = parse_ai_response(
            "I could not process that request.",
            "tell my boss the meeting went good",
            &contacts(&["boss"]),
        );
        assert_eq!(result.confidence, 0.5);
        assert_eq!(result.detected_recipient, Some("boss".to_string()));
        assert!(result.error.is_some());
    }

    #[test]
    fn test_parse_malformed_json_falls_back_with_error() {
        let result = parse_ai_response(r#"{"corrected_message": }"#, "hi there", &contacts(&[]));
        assert_eq!(result.corrected_text, "Hi there.");
        assert_eq!(result.confidence, 0.5);
        assert!(result.error.is_some());
    }

    #[test]
    fn test_build_prompt_embeds_contacts() {
        let prompt = build_prompt("hello", &contacts(&["rahul", "priya"]));
        assert!(prompt.contains("Known contacts: rahul, priya"));
        assert!(prompt.contains("\"hello\""));

        let prompt = build_prompt("hello", &contacts(&[]));
        assert!(prompt.contains("none specified"));
    }
}
