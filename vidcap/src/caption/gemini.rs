//! Backend for Google's hosted generateContent API.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::{CaptionBackend, CaptionError, Result, CAPTION_FALLBACK, CAPTION_PROMPT};
use crate::sampler::SampledFrame;

const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

pub struct GeminiBackend {
    api_key: String,
    model: String,
    http: Client,
}

impl GeminiBackend {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self> {
        Self::with_model(api_key, DEFAULT_MODEL.to_string(), timeout)
    }

    pub fn with_model(api_key: String, model: String, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_key,
            model,
            http,
        })
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    Image { inline_data: InlineData },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    /// base64
    data: String,
}

/// Fixed and non-adaptive, the same knobs for every request.
#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "topP")]
    top_p: f32,
    #[serde(rename = "topK")]
    top_k: u32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            top_p: 1.0,
            top_k: 40,
            max_output_tokens: 200,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

/// The known response shapes, decided once right after decoding.
#[derive(Debug, PartialEq, Eq)]
enum ResponseText {
    Direct(String),
    Candidate(String),
    Unrecognized,
}

fn classify(response: GenerateResponse) -> ResponseText {
    if let Some(text) = response.text {
        return ResponseText::Direct(text.trim().to_string());
    }

    let candidate_text = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().find_map(|part| part.text));

    match candidate_text {
        Some(text) => ResponseText::Candidate(text.trim().to_string()),
        None => ResponseText::Unrecognized,
    }
}

impl CaptionBackend for GeminiBackend {
    fn caption(&self, frames: &[SampledFrame]) -> Result<String> {
        if frames.is_empty() {
            return Err(CaptionError::NoFrames);
        }

        let mut parts = vec![Part::Text {
            text: CAPTION_PROMPT.to_string(),
        }];
        parts.extend(frames.iter().map(|frame| Part::Image {
            inline_data: InlineData {
                mime_type: "image/jpeg".to_string(),
                data: BASE64.encode(&frame.jpeg),
            },
        }));

        let request = GenerateRequest {
            contents: vec![Content { parts }],
            generation_config: GenerationConfig::default(),
        };

        let url = format!(
            "{BASE_URL}/models/{}:generateContent?key={}",
            self.model, self.api_key
        );

        log::debug!("Asking {} to caption {} frames", self.model, frames.len());
        let response = self.http.post(&url).json(&request).send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(CaptionError::Status { status, body });
        }

        let response: GenerateResponse = serde_json::from_str(&body)?;
        Ok(match classify(response) {
            ResponseText::Direct(text) | ResponseText::Candidate(text) => text,
            ResponseText::Unrecognized => CAPTION_FALLBACK.to_string(),
        })
    }
}
