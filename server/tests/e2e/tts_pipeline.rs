//! End-to-end tests for the complete TTS pipeline

use axum::http::{header, StatusCode};
use mockito::Matcher;
use serde_json::json;

use crate::helpers::*;

#[tokio::test]
async fn test_complete_tts_pipeline() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", SYNTH_PATH)
        .match_query(Matcher::UrlEncoded("key".into(), "e2e-key".into()))
        .match_body(Matcher::Json(json!({
            "input": { "text": "你好" },
            "voice": { "languageCode": "cmn-CN", "name": "cmn-CN-Chirp3-HD-Achernar" },
            "audioConfig": { "audioEncoding": "MP3", "speakingRate": 0.9 }
        })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(audio_body())
        .expect(1)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let app = create_test_app(dir.path(), format!("{}{}", server.url(), SYNTH_PATH));

    // Step 1: first request synthesizes and stores
    let response = get(&app, &tts_uri("你好", "")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "audio/mpeg");
    assert_eq!(body_bytes(response).await, MP3_BYTES);
    assert_eq!(
        mp3_files(dir.path()),
        vec!["cmn-CN-Chirp3-HD-Achernar_你好.mp3".to_string()]
    );

    // Step 2: the second request is served from disk
    let response = get(&app, &tts_uri("你好", "")).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_bytes(response).await, MP3_BYTES);

    mock.assert_async().await;
}

#[tokio::test]
async fn test_pipeline_reset_calls_provider_again() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", SYNTH_PATH)
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(audio_body())
        .expect(2)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let app = create_test_app(dir.path(), format!("{}{}", server.url(), SYNTH_PATH));

    get(&app, &tts_uri("世界", "")).await;
    let response = get(&app, &tts_uri("世界", "&reset=true")).await;
    assert_eq!(response.status(), StatusCode::OK);

    mock.assert_async().await;
}

#[tokio::test]
async fn test_pipeline_provider_error_leaves_no_file() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", SYNTH_PATH)
        .match_query(Matcher::Any)
        .with_status(400)
        .with_header("content-type", "application/json")
        .with_body(r#"{"error": {"code": 400, "message": "Voice does not exist", "status": "INVALID_ARGUMENT"}}"#)
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let app = create_test_app(dir.path(), format!("{}{}", server.url(), SYNTH_PATH));

    let response = get(&app, &tts_uri("你好", "&model=cmn-CN-Nope")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let error: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(error["error"].as_str().unwrap().contains("Voice does not exist"));
    assert!(mp3_files(dir.path()).is_empty());
}

#[tokio::test]
async fn test_pipeline_malformed_response() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", SYNTH_PATH)
        .match_query(Matcher::Any)
        .with_status(502)
        .with_body("<html>Bad Gateway</html>")
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let app = create_test_app(dir.path(), format!("{}{}", server.url(), SYNTH_PATH));

    let response = get(&app, &tts_uri("你好", "")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let error: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    assert!(error["error"].as_str().unwrap().starts_with("Failed to parse response"));
    assert!(mp3_files(dir.path()).is_empty());
}

#[tokio::test]
async fn test_pipeline_transport_failure() {
    let dir = tempfile::tempdir().unwrap();
    // Nothing listens on port 1.
    let app = create_test_app(dir.path(), format!("http://127.0.0.1:1{}", SYNTH_PATH));

    let response = get(&app, &tts_uri("你好", "")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let error: serde_json::Value = serde_json::from_slice(&body_bytes(response).await).unwrap();
    let message = error["error"].as_str().unwrap();
    assert!(message.starts_with("TTS request failed"));
    assert!(!message.contains("e2e-key"));
    assert!(mp3_files(dir.path()).is_empty());
}
