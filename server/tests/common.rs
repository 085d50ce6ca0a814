//! Common utilities for integration tests

#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body, Bytes},
    http::{Request, Response},
    Router,
};
use tower::ServiceExt;
use tts_cache_server::{build_router, AppState, ServerConfig};
use tts_client::{SynthesisError, SynthesisRequest, Synthesizer};

pub const FAKE_MP3: &[u8] = b"ID3\x04\x00\x00fake-mp3-payload";
pub const DEFAULT_FILE: &str = "cmn-CN-Chirp3-HD-Achernar_你好.mp3";

#[derive(Clone)]
pub enum FakeReply {
    Audio(Vec<u8>),
    MissingAudio,
    BadBase64,
}

/// Synthesizer double that records every request it receives.
pub struct FakeSynthesizer {
    calls: AtomicUsize,
    reply: Mutex<FakeReply>,
    requests: Mutex<Vec<SynthesisRequest>>,
}

impl FakeSynthesizer {
    pub fn new(reply: FakeReply) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            reply: Mutex::new(reply),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn set_reply(&self, reply: FakeReply) {
        *self.reply.lock().unwrap() = reply;
    }

    pub fn last_request(&self) -> Option<SynthesisRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Synthesizer for FakeSynthesizer {
    async fn synthesize(&self, request: &SynthesisRequest) -> Result<Vec<u8>, SynthesisError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        let reply = self.reply.lock().unwrap().clone();
        match reply {
            FakeReply::Audio(bytes) => Ok(bytes),
            FakeReply::MissingAudio => Err(SynthesisError::MissingAudio(None)),
            FakeReply::BadBase64 => {
                use base64::Engine;
                let err = base64::engine::general_purpose::STANDARD
                    .decode("***")
                    .unwrap_err();
                Err(SynthesisError::Audio(err))
            }
        }
    }
}

pub fn test_config(output_dir: &Path) -> ServerConfig {
    ServerConfig {
        api_key: "test-key".to_string(),
        output_dir: output_dir.to_path_buf(),
        rate_limit_per_minute: 600,
        ..Default::default()
    }
}

/// Create a test app backed by `synth` and writing into `output_dir`.
pub fn create_test_app(output_dir: &Path, synth: Arc<FakeSynthesizer>) -> Router {
    create_test_app_with_config(test_config(output_dir), synth)
}

pub fn create_test_app_with_config(config: ServerConfig, synth: Arc<FakeSynthesizer>) -> Router {
    build_router(AppState::new(config, synth)).expect("router should build")
}

/// Percent-encode every byte so non-ASCII text survives the URI parser.
pub fn encode(s: &str) -> String {
    s.bytes().map(|b| format!("%{:02X}", b)).collect()
}

pub fn tts_uri(text: &str, extra: &str) -> String {
    format!("/tts?text={}{}", encode(text), extra)
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

pub fn files_in(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}
