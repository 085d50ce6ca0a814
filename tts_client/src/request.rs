use serde::Serialize;

/// Language every request is synthesized in unless overridden.
pub const LANGUAGE_CODE: &str = "cmn-CN";
/// Voice used when the caller does not pick a model.
pub const DEFAULT_VOICE: &str = "cmn-CN-Chirp3-HD-Achernar";
/// Cached files are MP3, so this is not configurable.
pub const AUDIO_ENCODING: &str = "MP3";
pub const SPEAKING_RATE: f64 = 0.9;

/// Voice settings fixed at startup and applied to every request.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceDefaults {
    pub language_code: String,
    pub voice: String,
    pub speaking_rate: f64,
}

impl Default for VoiceDefaults {
    fn default() -> Self {
        Self {
            language_code: LANGUAGE_CODE.to_string(),
            voice: DEFAULT_VOICE.to_string(),
            speaking_rate: SPEAKING_RATE,
        }
    }
}

/// Body of a `text:synthesize` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesisRequest {
    pub input: SynthesisInput,
    pub voice: VoiceSelection,
    pub audio_config: AudioConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SynthesisInput {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceSelection {
    pub language_code: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioConfig {
    pub audio_encoding: String,
    pub speaking_rate: f64,
}

impl SynthesisRequest {
    /// Build a request for `text`, using `voice` if given and the defaults otherwise.
    pub fn new(text: &str, voice: Option<&str>, defaults: &VoiceDefaults) -> Self {
        Self {
            input: SynthesisInput {
                text: text.to_string(),
            },
            voice: VoiceSelection {
                language_code: defaults.language_code.clone(),
                name: voice.unwrap_or(&defaults.voice).to_string(),
            },
            audio_config: AudioConfig {
                audio_encoding: AUDIO_ENCODING.to_string(),
                speaking_rate: defaults.speaking_rate,
            },
        }
    }

    pub fn voice_name(&self) -> &str {
        &self.voice.name
    }
}
