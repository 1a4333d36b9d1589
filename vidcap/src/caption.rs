pub mod gemini;
pub mod llava;

use crate::sampler::SampledFrame;

/// What the backend is asked to do with the frames. One sentence, four parts, no
/// frame-by-frame narration.
pub const CAPTION_PROMPT: &str = r#"You are an expert video analyst. Analyze these frames from one video and produce a single descriptive caption that synthesizes the entire action.

Follow this exact structure:
1. Style: begin with "In the style of a [video type]..." (e.g., cooking tutorial, personal vlog, sports broadcast)
2. Shot type: describe the camera work (e.g., this close-up shot, this wide shot)
3. Subject and action: state who or what the main subject is and what they are doing
4. Setting and context: briefly describe the environment or context

Rules:
- Create a single, cohesive sentence
- Do not describe individual frames
- Do not use preambles or conversational phrases
- Be concise and focus on the most important information

Example: "In the style of a personal beauty vlog, this close-up shot shows a young woman with dark hair applying eyeshadow with a makeup brush to her right eyelid, looking directly into the camera against a simple, warm-toned wall."

Now analyze the frames and provide your caption:"#;

/// Returned instead of an error when the backend answered with 2xx but in none of the
/// known shapes, so that one weird response doesn't kill a whole batch.
pub const CAPTION_FALLBACK: &str =
    "Could not generate caption: unexpected response shape";

/// How many of the sampled frames actually go over the wire.
#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum FramePolicy {
    /// Send every sampled frame
    All,
    /// Send only the first frame, trading caption quality for cost
    First,
}

impl FramePolicy {
    pub fn select<'a>(&self, frames: &'a [SampledFrame]) -> &'a [SampledFrame] {
        match self {
            Self::All => frames,
            Self::First => &frames[..frames.len().min(1)],
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    /// Google's hosted multimodal generation API
    Gemini,
    /// An instruction tuned vision language endpoint
    Llava,
}

impl BackendKind {
    /// The environment variable holding the credential for this backend.
    pub fn credential_var(&self) -> &'static str {
        match self {
            Self::Gemini => "GEMINI_API_KEY",
            Self::Llava => "HF_API_TOKEN",
        }
    }
}

#[derive(thiserror::Error, Debug)]
pub enum CaptionError {
    #[error("transport: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("the backend returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },
    #[error("malformed response body: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("there are no frames to caption")]
    NoFrames,
}

pub type Result<T> = std::result::Result<T, CaptionError>;

/// A remote model that turns a frame set into one caption. Implementations get the
/// credential handed to them at construction, they never read ambient state.
pub trait CaptionBackend {
    fn caption(&self, frames: &[SampledFrame]) -> Result<String>;
}

/// A credential counts as configured only when it has content. `.env` files commonly
/// end up with a bare `KEY=` line, which is the same as not setting it at all.
pub fn usable_credential(raw: &str) -> Option<&str> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Everything after the last occurrence of `marker`, or the whole text if the marker
/// never appears. Trimmed either way.
pub fn after_last_marker<'a>(text: &'a str, marker: &str) -> &'a str {
    match text.rfind(marker) {
        Some(at) => text[at + marker.len()..].trim(),
        None => text.trim(),
    }
}
