pub mod utils;

use axum::http::StatusCode;
use axum_test::multipart::{MultipartForm, Part};
use serde_json::{Value, json};
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::api::models::analyze::AnalyzeResponse;
use crate::api::models::transcribe::TranscribeResponse;
use crate::errors::ErrorBody;
use utils::{create_test_app, create_test_app_with_config, create_test_config};

// Smallest complete 1x1 PNG
const PNG_BYTES: &[u8] = &[
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44, 0x52, 0x00, 0x00, 0x00,
    0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x06, 0x00, 0x00, 0x00, 0x1F, 0x15, 0xC4, 0x89, 0x00, 0x00, 0x00, 0x0A, 0x49,
    0x44, 0x41, 0x54, 0x78, 0x9C, 0x63, 0x00, 0x01, 0x00, 0x00, 0x05, 0x00, 0x01, 0x0D, 0x0A, 0x2D, 0xB4, 0x00, 0x00,
    0x00, 0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// Mount an OpenAI-style chat completion reply on the mock server.
async fn mock_chat_completion(mock_server: &MockServer, content: &str) {
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "model": "meta-llama/llama-4-maverick-17b-128e-instruct",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": content},
                "finish_reason": "stop"
            }]
        })))
        .mount(mock_server)
        .await;
}

#[test_log::test(tokio::test)]
async fn test_analyze_legacy_text_returns_model_reply() {
    let mock_server = MockServer::start().await;
    mock_chat_completion(&mock_server, "  You might just need some rest.  ").await;

    let server = create_test_app(&mock_server.uri());

    let response = server
        .post("/analyze/")
        .multipart(MultipartForm::new().add_text("text", "my head hurts"))
        .await;

    response.assert_status_ok();
    let body: AnalyzeResponse = response.json();
    assert!(body.success);
    assert_eq!(body.response, "You might just need some rest.");
}

#[test_log::test(tokio::test)]
async fn test_analyze_rejects_malformed_messages() {
    let mock_server = MockServer::start().await;
    let server = create_test_app(&mock_server.uri());

    for bogus in ["not json at all", "{\"role\": \"user\"}", "[{\"no_role\": 1}]", "42"] {
        let response = server
            .post("/analyze/")
            .multipart(MultipartForm::new().add_text("messages", bogus))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: ErrorBody = response.json();
        assert_eq!(body.detail, "Invalid messages format");
    }

    // The model is never called for malformed histories
    assert!(mock_server.received_requests().await.expect("recording enabled").is_empty());
}

#[test_log::test(tokio::test)]
async fn test_analyze_requires_some_input() {
    let mock_server = MockServer::start().await;
    let server = create_test_app(&mock_server.uri());

    let response = server.post("/analyze/").multipart(MultipartForm::new()).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: ErrorBody = response.json();
    assert_eq!(body.detail, "Provide messages, text, or an image");
}

#[test_log::test(tokio::test)]
async fn test_analyze_treats_placeholder_text_as_absent() {
    let mock_server = MockServer::start().await;
    let server = create_test_app(&mock_server.uri());

    for placeholder in ["", "   ", "text", " TEXT "] {
        let response = server
            .post("/analyze/")
            .multipart(MultipartForm::new().add_text("text", placeholder))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
    }
}

#[test_log::test(tokio::test)]
async fn test_analyze_attaches_image_to_last_user_message_only() {
    let mock_server = MockServer::start().await;
    mock_chat_completion(&mock_server, "That looks like a mild rash.").await;

    let server = create_test_app(&mock_server.uri());

    let history = r#"[
        {"role": "user", "content": "my arm looks odd"},
        {"role": "assistant", "content": "can you share a photo?"},
        {"role": "user", "content": "here it is"}
    ]"#;
    let image = Part::bytes(PNG_BYTES.to_vec()).file_name("photo.png").mime_type("image/png");

    let response = server
        .post("/analyze/")
        .multipart(MultipartForm::new().add_text("messages", history).add_part("image", image))
        .await;

    response.assert_status_ok();

    let requests = mock_server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 1);
    let payload: Value = serde_json::from_slice(&requests[0].body).expect("JSON request body");
    let messages = payload["messages"].as_array().expect("message list");

    assert_eq!(messages.len(), 4);
    assert_eq!(messages[0]["role"], "system");
    // Earlier messages keep their original content structure
    assert_eq!(messages[1]["content"], "my arm looks odd");
    assert_eq!(messages[2]["content"], "can you share a photo?");
    // Only the final user message carries the image
    let parts = messages[3]["content"].as_array().expect("multi-part content");
    assert_eq!(parts[0]["type"], "text");
    assert_eq!(parts[0]["text"], "here it is");
    assert_eq!(parts[1]["type"], "image_url");
    let url = parts[1]["image_url"]["url"].as_str().expect("data URL");
    assert!(url.starts_with("data:image/png;base64,"));
}

#[test_log::test(tokio::test)]
async fn test_analyze_surfaces_provider_failure_as_500() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let server = create_test_app(&mock_server.uri());

    let response = server
        .post("/analyze/")
        .multipart(MultipartForm::new().add_text("text", "hello"))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorBody = response.json();
    assert!(body.detail.contains("chat completion"));
}

#[test_log::test(tokio::test)]
async fn test_transcribe_returns_recognized_text() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/audio/transcriptions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"text": "hello from the clinic"})))
        .mount(&mock_server)
        .await;

    let server = create_test_app(&mock_server.uri());

    let audio = Part::bytes(b"RIFF fake wav bytes".to_vec()).file_name("visit.wav").mime_type("audio/wav");
    let response = server
        .post("/transcribe/")
        .multipart(MultipartForm::new().add_part("audio", audio))
        .await;

    response.assert_status_ok();
    let body: TranscribeResponse = response.json();
    assert!(body.success);
    assert_eq!(body.transcription, "hello from the clinic");
}

#[test_log::test(tokio::test)]
async fn test_transcribe_requires_audio_file() {
    let mock_server = MockServer::start().await;
    let server = create_test_app(&mock_server.uri());

    let response = server.post("/transcribe/").multipart(MultipartForm::new()).await;

    response.assert_status(StatusCode::BAD_REQUEST);
    let body: ErrorBody = response.json();
    assert_eq!(body.detail, "No audio file provided");
}

#[test_log::test(tokio::test)]
async fn test_tts_prefers_premium_engine() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex("^/v1/text-to-speech/.+$"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "audio/mpeg")
                .set_body_bytes(b"premium mp3".to_vec()),
        )
        .mount(&mock_server)
        .await;

    let server = create_test_app(&mock_server.uri());

    let response = server
        .post("/tts/")
        .multipart(MultipartForm::new().add_text("text", "take care of yourself"))
        .await;

    response.assert_status_ok();
    assert_eq!(response.header("x-tts-engine"), "elevenlabs");
    assert_eq!(response.header("content-type"), "audio/mpeg");
    assert_eq!(response.as_bytes().as_ref(), b"premium mp3".as_slice());
}

#[test_log::test(tokio::test)]
async fn test_tts_falls_back_when_premium_fails() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex("^/v1/text-to-speech/.+$"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/translate_tts"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "audio/mpeg")
                .set_body_bytes(b"fallback mp3".to_vec()),
        )
        .mount(&mock_server)
        .await;

    let server = create_test_app(&mock_server.uri());

    let response = server
        .post("/tts/")
        .multipart(MultipartForm::new().add_text("text", "take care of yourself"))
        .await;

    response.assert_status_ok();
    assert_eq!(response.header("x-tts-engine"), "gtts");
    assert_eq!(response.as_bytes().as_ref(), b"fallback mp3".as_slice());
}

#[test_log::test(tokio::test)]
async fn test_tts_without_premium_credential_uses_fallback() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/translate_tts"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"fallback mp3".to_vec()))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri());
    config.elevenlabs.api_key = None;
    let server = create_test_app_with_config(config);

    let response = server
        .post("/tts/")
        .multipart(MultipartForm::new().add_text("text", "take care of yourself"))
        .await;

    response.assert_status_ok();
    assert_eq!(response.header("x-tts-engine"), "gtts");
}

#[test_log::test(tokio::test)]
async fn test_tts_rejects_empty_text_without_calling_providers() {
    let mock_server = MockServer::start().await;
    let server = create_test_app(&mock_server.uri());

    for empty in ["", "   "] {
        let response = server
            .post("/tts/")
            .multipart(MultipartForm::new().add_text("text", empty))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: ErrorBody = response.json();
        assert_eq!(body.detail, "Text is required");
    }

    // Missing field entirely behaves the same
    let response = server.post("/tts/").multipart(MultipartForm::new()).await;
    response.assert_status(StatusCode::BAD_REQUEST);

    assert!(mock_server.received_requests().await.expect("recording enabled").is_empty());
}

#[test_log::test(tokio::test)]
async fn test_tts_propagates_failure_when_all_engines_fail() {
    let mock_server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path_regex("^/v1/text-to-speech/.+$"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/translate_tts"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let server = create_test_app(&mock_server.uri());

    let response = server
        .post("/tts/")
        .multipart(MultipartForm::new().add_text("text", "take care"))
        .await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    let body: ErrorBody = response.json();
    assert!(body.detail.contains("gtts"));
}

#[test_log::test(tokio::test)]
async fn test_cross_origin_requests_are_allowed() {
    let mock_server = MockServer::start().await;
    mock_chat_completion(&mock_server, "hi").await;

    let server = create_test_app(&mock_server.uri());

    let response = server
        .post("/analyze/")
        .add_header(axum::http::header::ORIGIN, "http://localhost:5173")
        .multipart(MultipartForm::new().add_text("text", "hello"))
        .await;

    response.assert_status_ok();
    assert_eq!(response.header("access-control-allow-origin"), "http://localhost:5173");
    assert_eq!(response.header("access-control-allow-credentials"), "true");
}
