use thiserror::Error;

/// Failures talking to the synthesis provider.
///
/// The display strings are what the HTTP layer hands back to callers, so
/// they never include the request URL (it carries the API key).
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("TTS request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Failed to parse response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(
        "No audio content in response{}",
        .0.as_deref().map(|m| format!(": {m}")).unwrap_or_default()
    )]
    MissingAudio(Option<String>),

    #[error("Failed to decode audio: {0}")]
    Audio(#[from] base64::DecodeError),
}

impl From<reqwest::Error> for SynthesisError {
    fn from(e: reqwest::Error) -> Self {
        SynthesisError::Transport(e.without_url())
    }
}
