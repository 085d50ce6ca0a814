// Server configuration, read once at startup and carried in AppState

use std::{path::PathBuf, str::FromStr, time::Duration};

use thiserror::Error;
use tts_client::{VoiceDefaults, GOOGLE_TTS_URL};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_OUTPUT_DIR: &str = "./audio";
pub const DEFAULT_MAX_TEXT_CHARS: usize = 5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing {0} in environment or .env")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub api_key: String,
    pub api_url: String,
    pub output_dir: PathBuf,
    pub voice: VoiceDefaults,
    pub max_text_chars: usize,
    pub rate_limit_per_minute: u32,
    pub request_timeout_secs: u64,
    pub synthesis_timeout_secs: u64,
    pub cors_allowed_origins: Option<Vec<String>>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            api_key: String::new(),
            api_url: GOOGLE_TTS_URL.to_string(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            voice: VoiceDefaults::default(),
            max_text_chars: DEFAULT_MAX_TEXT_CHARS,
            rate_limit_per_minute: 60,
            request_timeout_secs: 60,
            synthesis_timeout_secs: 30,
            cors_allowed_origins: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from any variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let defaults = Self::default();

        let api_key = get("GOOGLE_API_KEY").ok_or(ConfigError::Missing("GOOGLE_API_KEY"))?;

        let port = parse_or(get("PORT"), "PORT", defaults.port)?;
        let output_dir = get("OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.output_dir);
        let api_url = get("TTS_API_URL").unwrap_or(defaults.api_url);

        let voice = VoiceDefaults {
            language_code: get("TTS_LANGUAGE_CODE").unwrap_or(defaults.voice.language_code),
            voice: get("TTS_DEFAULT_VOICE").unwrap_or(defaults.voice.voice),
            speaking_rate: parse_or(
                get("TTS_SPEAKING_RATE"),
                "TTS_SPEAKING_RATE",
                defaults.voice.speaking_rate,
            )?,
        };
        if !(0.25..=4.0).contains(&voice.speaking_rate) {
            return Err(ConfigError::Invalid {
                name: "TTS_SPEAKING_RATE",
                value: voice.speaking_rate.to_string(),
            });
        }

        let max_text_chars = parse_or(get("MAX_TEXT_CHARS"), "MAX_TEXT_CHARS", defaults.max_text_chars)?;
        let rate_limit_per_minute = parse_or(
            get("RATE_LIMIT_PER_MINUTE"),
            "RATE_LIMIT_PER_MINUTE",
            defaults.rate_limit_per_minute,
        )?;
        let request_timeout_secs = parse_or(
            get("REQUEST_TIMEOUT_SECS"),
            "REQUEST_TIMEOUT_SECS",
            defaults.request_timeout_secs,
        )?;
        let synthesis_timeout_secs = parse_or(
            get("SYNTHESIS_TIMEOUT_SECS"),
            "SYNTHESIS_TIMEOUT_SECS",
            defaults.synthesis_timeout_secs,
        )?;

        for (name, value) in [
            ("MAX_TEXT_CHARS", max_text_chars as u64),
            ("RATE_LIMIT_PER_MINUTE", u64::from(rate_limit_per_minute)),
            ("REQUEST_TIMEOUT_SECS", request_timeout_secs),
            ("SYNTHESIS_TIMEOUT_SECS", synthesis_timeout_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    name,
                    value: "0".to_string(),
                });
            }
        }

        let cors_allowed_origins = get("CORS_ALLOWED_ORIGINS").map(|origins| {
            origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });

        Ok(Self {
            port,
            api_key,
            api_url,
            output_dir,
            voice,
            max_text_chars,
            rate_limit_per_minute,
            request_timeout_secs,
            synthesis_timeout_secs,
            cors_allowed_origins,
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn synthesis_timeout(&self) -> Duration {
        Duration::from_secs(self.synthesis_timeout_secs)
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, name: &'static str, default: T) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
    }
}
