//! Client for the generative-text API used by date-range parsing.
//!
//! Sends a single-turn prompt to the `generateContent` endpoint and
//! extracts the first candidate's text reply.

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<TextPart>,
}

#[derive(Debug, Deserialize)]
struct TextPart {
    #[serde(default)]
    text: String,
}

/// Send `prompt` to the configured model and return the raw text reply.
///
/// Low temperature keeps replies deterministic enough to parse.
pub async fn generate_text(state: &AppState, prompt: &str) -> Result<String, AppError> {
    let api_key = state
        .config
        .genai_api_key
        .as_deref()
        .ok_or_else(|| AppError::Upstream("generative API key is not configured".to_string()))?;

    let body = GenerateRequest {
        contents: vec![Content {
            parts: vec![Part { text: prompt }],
        }],
        generation_config: GenerationConfig {
            temperature: 0.1,
            max_output_tokens: 1024,
        },
    };

    let url = format!(
        "{}/models/{}:generateContent?key={}",
        state.config.genai_base_url, state.config.genai_model, api_key
    );

    let response = state
        .http
        .post(url)
        .json(&body)
        .send()
        .await
        .map_err(|err| AppError::Upstream(format!("generative API request failed: {err}")))?;

    let status = response.status();
    if !status.is_success() {
        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "<unreadable body>".to_string());
        return Err(AppError::Upstream(format!(
            "generative API returned {status}: {text}"
        )));
    }

    let parsed: GenerateResponse = response
        .json()
        .await
        .map_err(|err| AppError::Upstream(format!("generative API response unreadable: {err}")))?;

    let reply = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content.parts.into_iter().next())
        .map(|p| p.text)
        .ok_or_else(|| AppError::Upstream("generative API returned no candidates".to_string()))?;

    Ok(reply)
}

/// Extract the outermost JSON object from a model reply.
///
/// Models wrap JSON in markdown fences or prose; the span between the
/// first `{` and the last `}` is the object itself.
pub fn extract_json_object(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&reply[start..=end])
}
