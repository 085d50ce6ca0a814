use std::{path::PathBuf, sync::Arc, time::Instant};

use axum::{
    extract::{Query, State},
    http::{header, HeaderName, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use tts_client::{SynthesisRequest, Synthesizer};

use crate::cache::{AudioCache, CacheKey};
use crate::config::ServerConfig;
use crate::error::ApiError;
use crate::metrics::{AppMetrics, EndpointMetricsResponse, MetricsResponse, SystemMetrics};
use crate::validation::{validate_model, validate_tts_text};

pub const AUDIO_MPEG: &str = "audio/mpeg";
pub static X_CACHE: HeaderName = HeaderName::from_static("x-cache");

#[derive(Clone)]
pub struct AppState {
    pub synthesizer: Arc<dyn Synthesizer>,
    pub cache: AudioCache,
    pub config: Arc<ServerConfig>,
    pub metrics: AppMetrics,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(config: ServerConfig, synthesizer: Arc<dyn Synthesizer>) -> Self {
        Self {
            synthesizer,
            cache: AudioCache::new(config.output_dir.clone()),
            config: Arc::new(config),
            metrics: AppMetrics::new(),
            started_at: Instant::now(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TtsQuery {
    pub text: Option<String>,
    pub model: Option<String>,
    pub reset: Option<String>,
    pub format: Option<String>,
}

/// What the caller gets back on success.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Audio,
    Json,
}

impl OutputFormat {
    fn parse(raw: Option<&str>) -> Result<Self, ApiError> {
        match raw {
            None | Some("") | Some("audio") => Ok(OutputFormat::Audio),
            Some("json") => Ok(OutputFormat::Json),
            Some(other) => Err(ApiError::InvalidInput(format!(
                "Invalid format: {}. Expected audio or json",
                other
            ))),
        }
    }
}

#[derive(Serialize)]
pub struct TtsFileResponse {
    file: String,
    cached: bool,
    bytes: usize,
}

pub async fn health_check() -> &'static str {
    "ok"
}

pub async fn not_found(uri: Uri) -> ApiError {
    ApiError::NotFound(uri.path().to_string())
}

pub async fn tts_endpoint(
    State(state): State<AppState>,
    Query(query): Query<TtsQuery>,
) -> Result<Response, ApiError> {
    let start_time = Instant::now();
    let result = serve_tts(&state, &query).await;
    state
        .metrics
        .tts
        .record_request(start_time.elapsed().as_millis() as u64, result.is_err());
    result
}

async fn serve_tts(state: &AppState, query: &TtsQuery) -> Result<Response, ApiError> {
    let text = validate_tts_text(query.text.as_deref(), state.config.max_text_chars)?;
    let model = validate_model(query.model.as_deref())?;
    let format = OutputFormat::parse(query.format.as_deref())?;
    let reset = query.reset.as_deref() == Some("true");

    let voice = model.unwrap_or(&state.config.voice.voice);
    let key = CacheKey::for_request(voice, text);

    debug!("Cache key {} for text {}", key, text);

    if reset {
        info!("Cache reset requested for: {}", text);
    } else if let Some((path, audio)) = state.cache.load(&key).await.map_err(|e| {
        ApiError::Filesystem(format!("Failed to read cached file: {e}"))
    })? {
        info!("Serving cached file: {}", path.display());
        state.metrics.cache.record_hit();
        return Ok(respond(format, true, path, audio));
    }

    state.metrics.cache.record_miss();
    info!("Generating new file for text: {} (model: {})", text, voice);

    let request = SynthesisRequest::new(text, Some(voice), &state.config.voice);
    let synth_start = Instant::now();
    let audio = state.synthesizer.synthesize(&request).await?;

    let path = state
        .cache
        .store(&key, &audio)
        .await
        .map_err(|e| ApiError::Filesystem(format!("Failed to save file: {e}")))?;
    state
        .metrics
        .cache
        .record_synthesis(synth_start.elapsed().as_millis() as u64, audio.len());
    info!("Saved new file: {}", path.display());

    Ok(respond(format, false, path, audio))
}

fn respond(format: OutputFormat, cached: bool, path: PathBuf, audio: Vec<u8>) -> Response {
    let cache_status = if cached { "hit" } else { "miss" };
    match format {
        OutputFormat::Audio => (
            [(header::CONTENT_TYPE, AUDIO_MPEG), (X_CACHE.clone(), cache_status)],
            audio,
        )
            .into_response(),
        OutputFormat::Json => (
            [(X_CACHE.clone(), cache_status)],
            Json(TtsFileResponse {
                file: path.display().to_string(),
                cached,
                bytes: audio.len(),
            }),
        )
            .into_response(),
    }
}

pub async fn metrics_endpoint(State(state): State<AppState>) -> Json<MetricsResponse> {
    let mut system = sysinfo::System::new();
    system.refresh_cpu();
    system.refresh_memory();

    let cpu_usage = system.global_cpu_info().cpu_usage();
    let memory_used = system.used_memory();
    let memory_total = system.total_memory();
    let memory_usage_percent = if memory_total > 0 {
        (memory_used as f64 / memory_total as f64 * 100.0) as f32
    } else {
        0.0
    };

    // Unix-like systems only
    let system_load = {
        #[cfg(unix)]
        {
            std::fs::read_to_string("/proc/loadavg")
                .ok()
                .and_then(|loadavg| {
                    loadavg
                        .split_whitespace()
                        .next()
                        .and_then(|s| s.parse::<f64>().ok())
                })
        }
        #[cfg(not(unix))]
        None
    };

    Json(MetricsResponse {
        timestamp: chrono::Utc::now(),
        system: SystemMetrics {
            cpu_usage_percent: cpu_usage,
            memory_used_mb: memory_used / 1024 / 1024,
            memory_total_mb: memory_total / 1024 / 1024,
            memory_usage_percent,
            uptime_seconds: state.started_at.elapsed().as_secs(),
            system_load,
        },
        endpoints: EndpointMetricsResponse {
            tts: state.metrics.tts.snapshot(),
        },
        cache: state.metrics.cache.snapshot(),
    })
}
