use url::Url;

use crate::config::{Config, ElevenLabsConfig, GroqConfig, GttsConfig};

/// Config with every provider pointed at a mock server.
pub fn create_test_config(mock_uri: &str) -> Config {
    let base_url = Url::parse(mock_uri).expect("valid mock URL");

    Config {
        groq: GroqConfig {
            api_key: Some("gsk-test".to_string()),
            base_url: base_url.clone(),
            ..GroqConfig::default()
        },
        elevenlabs: ElevenLabsConfig {
            api_key: Some("el-test".to_string()),
            base_url: base_url.clone(),
            ..ElevenLabsConfig::default()
        },
        gtts: GttsConfig {
            base_url,
            ..GttsConfig::default()
        },
        ..Config::default()
    }
}

/// Test server with all providers configured, including the premium engine.
pub fn create_test_app(mock_uri: &str) -> axum_test::TestServer {
    create_test_app_with_config(create_test_config(mock_uri))
}

pub fn create_test_app_with_config(config: Config) -> axum_test::TestServer {
    crate::Application::new(config)
        .expect("Failed to create application")
        .into_test_server()
}
