//! Client side of the text-to-speech proxy: the request sent to the
//! synthesis provider, the provider client, and the trait the server
//! depends on.

mod error;
mod google;
mod request;

use async_trait::async_trait;

pub use error::SynthesisError;
pub use google::{GoogleTtsClient, GOOGLE_TTS_URL};
pub use request::{
    AudioConfig, SynthesisInput, SynthesisRequest, VoiceDefaults, VoiceSelection,
    AUDIO_ENCODING, DEFAULT_VOICE, LANGUAGE_CODE, SPEAKING_RATE,
};

/// Anything that turns a [`SynthesisRequest`] into encoded audio bytes.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>, SynthesisError>;
}
