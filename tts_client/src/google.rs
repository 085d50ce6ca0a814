use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::{SynthesisError, SynthesisRequest, Synthesizer};

/// Google Cloud Text-to-Speech REST endpoint.
pub const GOOGLE_TTS_URL: &str = "https://texttospeech.googleapis.com/v1/text:synthesize";

/// Structure for the synthesize API response.
///
/// Google puts either `audioContent` or an `error` object in the body,
/// regardless of the HTTP status.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthesisResponse {
    #[serde(default)]
    audio_content: Option<String>,
    #[serde(default)]
    error: Option<ProviderError>,
}

#[derive(Deserialize)]
struct ProviderError {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

impl ProviderError {
    fn describe(&self) -> String {
        let message = self.message.as_deref().unwrap_or("unknown provider error");
        match (self.code, self.status.as_deref()) {
            (Some(code), Some(status)) => format!("{message} ({code} {status})"),
            (Some(code), None) => format!("{message} ({code})"),
            (None, Some(status)) => format!("{message} ({status})"),
            (None, None) => message.to_string(),
        }
    }
}

/// API-key authenticated client for Google Cloud Text-to-Speech.
#[derive(Debug, Clone)]
pub struct GoogleTtsClient {
    api_key: String,
    endpoint: String,
    client: Client,
}

impl GoogleTtsClient {
    /// Client for the public Google endpoint.
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, SynthesisError> {
        Self::with_endpoint(api_key, GOOGLE_TTS_URL, timeout)
    }

    /// Client for a custom endpoint (proxies, regional endpoints, test servers).
    pub fn with_endpoint(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, SynthesisError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl Synthesizer for GoogleTtsClient {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>, SynthesisError> {
        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.as_str())])
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        debug!(
            "Provider responded {} with {} bytes (voice: {})",
            status,
            body.len(),
            request.voice_name()
        );
        if !status.is_success() {
            warn!("Synthesis provider returned HTTP {}", status);
        }

        decode_response(&body)
    }
}

/// Extract and base64-decode the audio from a raw provider response body.
pub(crate) fn decode_response(body: &[u8]) -> Result<Vec<u8>, SynthesisError> {
    let parsed: SynthesisResponse = serde_json::from_slice(body)?;

    let content = match parsed.audio_content {
        Some(content) if !content.is_empty() => content,
        _ => {
            return Err(SynthesisError::MissingAudio(
                parsed.error.as_ref().map(ProviderError::describe),
            ))
        }
    };

    let audio = base64::engine::general_purpose::STANDARD.decode(content.as_bytes())?;
    if audio.is_empty() {
        return Err(SynthesisError::MissingAudio(None));
    }
    Ok(audio)
}
