//! Client for the Gemini `generateContent` endpoint.
//!
//! One blocking round-trip per question, no streaming, no retry. Token usage
//! comes back in the response's `usageMetadata` block when the service
//! provides it; callers decide what to do when it is missing.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default API root; override via `GEMINI_BASE_URL` (tests point this at a
/// local mock server).
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Error)]
pub enum GeminiError {
    /// The request never completed (connect, DNS, TLS, ...).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    /// The service answered with a non-success status.
    #[error("api error (status {status}): {message}")]
    Api { status: StatusCode, message: String },
    /// The body did not contain a usable candidate.
    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Token counts reported by the service alongside a completion.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u64,
    #[serde(default)]
    pub candidates_token_count: u64,
    #[serde(default)]
    pub total_token_count: u64,
}

impl UsageMetadata {
    /// Tokens charged to the bathtub for this exchange: prompt plus
    /// generated. `total_token_count` can include extra internal tokens, so
    /// it is reported in logs but not billed.
    pub fn charged_tokens(&self) -> u64 {
        self.prompt_token_count + self.candidates_token_count
    }
}

/// A finished completion: the generated text plus usage counts, if the
/// service sent any.
#[derive(Debug)]
pub struct Completion {
    pub text: String,
    pub usage: Option<UsageMetadata>,
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

/// Masks an API key for log output: first 4 + `***` + last 4 characters,
/// or `***` outright when the key is too short to safely show anything.
pub fn mask_key(key: &str) -> String {
    if key.len() <= 8 {
        "***".to_string()
    } else {
        format!("{}***{}", &key[..4], &key[key.len() - 4..])
    }
}

/// Gemini chat client. Cheap to clone; the underlying reqwest client pools
/// connections.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, base_url: String) -> Result<Self, GeminiError> {
        let http = reqwest::Client::builder().build()?;
        tracing::info!(
            model = %model,
            api_key = %mask_key(&api_key),
            "gemini client ready"
        );
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            api_key,
        })
    }

    /// Sends a single-turn question and returns the generated text with its
    /// usage counts. The key travels as the `key` query parameter, which is
    /// how this endpoint authenticates.
    pub async fn generate_content(&self, prompt: &str) -> Result<Completion, GeminiError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        );
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
        };

        tracing::debug!(
            model = %self.model,
            prompt_chars = prompt.chars().count(),
            "generateContent request"
        );

        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(GeminiError::Api { status, message });
        }

        let body: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| GeminiError::Malformed(e.to_string()))?;

        if let Some(u) = &body.usage_metadata {
            tracing::info!(
                prompt_tokens = u.prompt_token_count,
                completion_tokens = u.candidates_token_count,
                total_tokens = u.total_token_count,
                "generateContent usage"
            );
        }

        let text = extract_text(&body)?;
        Ok(Completion {
            text,
            usage: body.usage_metadata,
        })
    }
}

/// Concatenates the text parts of the first candidate. A response with no
/// candidates, or whose candidate carries no text (safety blocks arrive this
/// way), is an error for the caller to surface.
fn extract_text(body: &GenerateContentResponse) -> Result<String, GeminiError> {
    let candidate = body
        .candidates
        .first()
        .ok_or_else(|| GeminiError::Malformed("no candidates in response".into()))?;

    let mut text = String::new();
    if let Some(content) = &candidate.content {
        for part in &content.parts {
            if let Some(t) = &part.text {
                text.push_str(t);
            }
        }
    }

    if text.is_empty() {
        let reason = candidate.finish_reason.as_deref().unwrap_or("unknown");
        return Err(GeminiError::Malformed(format!(
            "candidate contained no text (finish reason: {reason})"
        )));
    }

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_key_hides_short_keys_entirely() {
        assert_eq!(mask_key(""), "***");
        assert_eq!(mask_key("12345678"), "***");
    }

    #[test]
    fn mask_key_keeps_head_and_tail() {
        assert_eq!(mask_key("AIzaSyExampleExample1234"), "AIza***1234");
    }

    #[test]
    fn charged_tokens_ignores_total_count() {
        let usage = UsageMetadata {
            prompt_token_count: 8,
            candidates_token_count: 5,
            total_token_count: 99,
        };
        assert_eq!(usage.charged_tokens(), 13);
    }
}
