//! Test helpers for e2e tests

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::{to_bytes, Body, Bytes},
    http::{Request, Response},
    Router,
};
use base64::Engine;
use tower::ServiceExt;
use tts_cache_server::{build_router, AppState, ServerConfig};
use tts_client::GoogleTtsClient;

pub const SYNTH_PATH: &str = "/v1/text:synthesize";
pub const MP3_BYTES: &[u8] = b"ID3\x04\x00\x00\x00e2e-mp3-frames";

pub fn audio_body() -> String {
    serde_json::json!({
        "audioContent": base64::engine::general_purpose::STANDARD.encode(MP3_BYTES)
    })
    .to_string()
}

/// Create an app whose provider client talks to `api_url`.
pub fn create_test_app(output_dir: &Path, api_url: String) -> Router {
    let config = ServerConfig {
        api_key: "e2e-key".to_string(),
        api_url,
        output_dir: output_dir.to_path_buf(),
        rate_limit_per_minute: 600,
        ..Default::default()
    };
    let client = GoogleTtsClient::with_endpoint(
        config.api_key.clone(),
        config.api_url.clone(),
        Duration::from_secs(5),
    )
    .expect("client should build");
    build_router(AppState::new(config, Arc::new(client))).expect("router should build")
}

pub fn tts_uri(text: &str, extra: &str) -> String {
    let encoded: String = text.bytes().map(|b| format!("%{:02X}", b)).collect();
    format!("/tts?text={}{}", encoded, extra)
}

pub async fn get(app: &Router, uri: &str) -> Response<Body> {
    app.clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Bytes {
    to_bytes(response.into_body(), usize::MAX).await.unwrap()
}

pub fn mp3_files(dir: &Path) -> Vec<String> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect()
}
