//! Backend for an instruction tuned vision language endpoint, LLaVA style. The model
//! echoes the conversational prompt, so the caption is whatever follows the last
//! assistant marker.

use std::time::Duration;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::{
    after_last_marker, CaptionBackend, CaptionError, Result, CAPTION_FALLBACK,
    CAPTION_PROMPT,
};
use crate::sampler::SampledFrame;

const DEFAULT_ENDPOINT: &str =
    "https://api-inference.huggingface.co/models/llava-hf/llava-1.5-7b-hf";

pub const ASSISTANT_MARKER: &str = "ASSISTANT:";

pub struct LlavaBackend {
    token: String,
    endpoint: String,
    http: Client,
}

impl LlavaBackend {
    pub fn new(token: String, timeout: Duration) -> Result<Self> {
        Self::with_endpoint(token, DEFAULT_ENDPOINT.to_string(), timeout)
    }

    pub fn with_endpoint(
        token: String,
        endpoint: String,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            token,
            endpoint,
            http,
        })
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    inputs: Inputs,
    parameters: Parameters,
}

#[derive(Debug, Serialize)]
struct Inputs {
    text: String,
    /// base64, one per `<image>` placeholder in the text
    images: Vec<String>,
}

#[derive(Debug, Serialize)]
struct Parameters {
    temperature: f32,
    max_new_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GenerateResponse {
    Many(Vec<Generation>),
    One(Generation),
}

#[derive(Debug, Deserialize)]
struct Generation {
    generated_text: String,
}

fn conversation(num_images: usize) -> String {
    let mut prompt = String::from("USER: ");
    for _ in 0..num_images {
        prompt.push_str("<image>\n");
    }
    prompt.push_str(CAPTION_PROMPT);
    prompt.push('\n');
    prompt.push_str(ASSISTANT_MARKER);
    prompt
}

impl CaptionBackend for LlavaBackend {
    fn caption(&self, frames: &[SampledFrame]) -> Result<String> {
        if frames.is_empty() {
            return Err(CaptionError::NoFrames);
        }

        let request = GenerateRequest {
            inputs: Inputs {
                text: conversation(frames.len()),
                images: frames
                    .iter()
                    .map(|frame| BASE64.encode(&frame.jpeg))
                    .collect(),
            },
            parameters: Parameters {
                temperature: 0.3,
                max_new_tokens: 200,
            },
        };

        log::debug!(
            "Asking {} to caption {} frames",
            self.endpoint,
            frames.len()
        );
        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&request)
            .send()?;

        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(CaptionError::Status { status, body });
        }

        let response: GenerateResponse = serde_json::from_str(&body)?;
        let generation = match response {
            GenerateResponse::Many(generations) => generations.into_iter().next(),
            GenerateResponse::One(generation) => Some(generation),
        };

        Ok(match generation {
            Some(generation) => {
                after_last_marker(&generation.generated_text, ASSISTANT_MARKER)
                    .to_string()
            }
            None => CAPTION_FALLBACK.to_string(),
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;

    #[test]
    fn conversation_has_one_placeholder_per_image() {
        let prompt = conversation(3);
        assert_eq!(3, prompt.matches("<image>").count());
        assert!(prompt.ends_with(ASSISTANT_MARKER));
        assert!(prompt.contains("expert video analyst"));
    }

    #[test]
    fn both_response_shapes_decode() {
        let many: GenerateResponse =
            serde_json::from_value(json!([{"generated_text": "a"}]))
                .expect("list shape");
        assert!(matches!(many, GenerateResponse::Many(v) if v.len() == 1));

        let one: GenerateResponse =
            serde_json::from_value(json!({"generated_text": "a"}))
                .expect("object shape");
        assert!(matches!(one, GenerateResponse::One(_)));
    }

    #[test]
    fn the_caption_is_what_follows_the_marker() {
        let echoed = format!("{} a tidy caption \n", conversation(2));
        assert_eq!(
            "a tidy caption",
            after_last_marker(&echoed, ASSISTANT_MARKER)
        );
    }
}
