//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable
//! overrides. The file path defaults to `config.yaml` but can be specified via
//! the `-f` flag or the `DOCNOW_CONFIG` environment variable.
//!
//! Sources are merged in the following order (later sources override earlier
//! ones):
//!
//! 1. **YAML config file** - base configuration (default: `config.yaml`)
//! 2. **Environment variables** - variables prefixed with `DOCNOW_` override
//!    YAML values; nested keys use double underscores
//!    (`DOCNOW_GROQ__CHAT_MODEL=...` sets `groq.chat_model`)
//! 3. **`GROQ_API_KEY` / `ELEVENLABS_API_KEY`** - special case: the bare
//!    provider credential variables override `groq.api_key` and
//!    `elevenlabs.api_key`
//!
//! A missing Groq credential is a startup failure (the analyze and transcribe
//! endpoints cannot work without one). A missing ElevenLabs credential only
//! removes the premium engine from the synthesis chain.

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "DOCNOW_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    /// Useful for CI/CD pipelines to catch config errors before deployment.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Convenience override populated from the bare `GROQ_API_KEY`
    /// environment variable; folded into `groq.api_key` on load.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groq_api_key: Option<String>,
    /// Convenience override populated from the bare `ELEVENLABS_API_KEY`
    /// environment variable; folded into `elevenlabs.api_key` on load.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevenlabs_api_key: Option<String>,
    /// Cross-origin policy for browser clients
    pub cors: CorsConfig,
    /// Request size limits
    pub limits: LimitsConfig,
    /// Multimodal analysis and transcription provider
    pub groq: GroqConfig,
    /// Premium speech synthesis provider
    pub elevenlabs: ElevenLabsConfig,
    /// Free speech synthesis fallback
    pub gtts: GttsConfig,
    /// Enable OpenTelemetry OTLP export for distributed tracing
    pub enable_otel_export: bool,
}

/// CORS (Cross-Origin Resource Sharing) configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins for CORS requests
    pub allowed_origins: Vec<CorsOrigin>,
    /// Allow credentials (cookies) in CORS requests
    pub allow_credentials: bool,
    /// Cache preflight requests for this many seconds
    pub max_age: Option<u64>,
}

/// A single allowed origin: `*` or a specific URL.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum CorsOrigin {
    /// Allow all origins (`*`)
    #[serde(deserialize_with = "parse_wildcard")]
    Wildcard,
    /// Specific origin URL (e.g., `https://app.example.com`)
    Url(Url),
}

fn parse_wildcard<'de, D>(deserializer: D) -> Result<(), D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    if s == "*" {
        Ok(())
    } else {
        Err(serde::de::Error::custom("Expected '*'"))
    }
}

/// Resource limits for protecting system capacity.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Maximum request body size in bytes (uploads are buffered in memory)
    pub max_upload_bytes: usize,
}

/// Groq provider configuration (multimodal chat and Whisper transcription).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GroqConfig {
    /// API credential; required for the analyze and transcribe endpoints
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// OpenAI-compatible API root
    pub base_url: Url,
    /// Model used for multimodal analysis
    pub chat_model: String,
    /// Model used for audio transcription
    pub stt_model: String,
    /// Transcription target language
    pub stt_language: String,
}

/// ElevenLabs provider configuration (premium speech synthesis).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ElevenLabsConfig {
    /// API credential; absence disables the premium engine (not an error)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// API root
    pub base_url: Url,
    /// Voice identity used for synthesis
    pub voice_id: String,
    /// Synthesis model
    pub model_id: String,
    /// Audio output format parameter
    pub output_format: String,
}

/// Google Translate TTS configuration (free fallback, no credential).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GttsConfig {
    /// Endpoint root
    pub base_url: Url,
    /// Synthesis language
    pub lang: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            groq_api_key: None,
            elevenlabs_api_key: None,
            cors: CorsConfig::default(),
            limits: LimitsConfig::default(),
            groq: GroqConfig::default(),
            elevenlabs: ElevenLabsConfig::default(),
            gtts: GttsConfig::default(),
            enable_otel_export: false,
        }
    }
}

impl Default for CorsConfig {
    /// Development posture: all origins, credentials allowed
    fn default() -> Self {
        Self {
            allowed_origins: vec![CorsOrigin::Wildcard],
            allow_credentials: true,
            max_age: None,
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: 25 * 1024 * 1024,
        }
    }
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: Url::parse("https://api.groq.com/openai/v1").expect("valid default URL"),
            chat_model: "meta-llama/llama-4-maverick-17b-128e-instruct".to_string(),
            stt_model: "whisper-large-v3".to_string(),
            stt_language: "en".to_string(),
        }
    }
}

impl Default for ElevenLabsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: Url::parse("https://api.elevenlabs.io").expect("valid default URL"),
            voice_id: "cgSgspJ2msm6clMCkdW9".to_string(),
            model_id: "eleven_turbo_v2".to_string(),
            output_format: "mp3_44100_128".to_string(),
        }
    }
}

impl Default for GttsConfig {
    fn default() -> Self {
        Self {
            base_url: Url::parse("https://translate.google.com").expect("valid default URL"),
            lang: "en".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment.
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let mut config: Self = Self::figment(args).extract()?;

        // Bare credential env vars win over nested config values
        if let Some(key) = config.groq_api_key.take() {
            config.groq.api_key = Some(key);
        }
        if let Some(key) = config.elevenlabs_api_key.take() {
            config.elevenlabs.api_key = Some(key);
        }

        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Environment variables can still override specific values
            .merge(Env::prefixed("DOCNOW_").split("__"))
            // Common provider credential patterns
            .merge(Env::raw().only(&["GROQ_API_KEY", "ELEVENLABS_API_KEY"]))
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.cors.allowed_origins.is_empty() {
            return Err(Error::Configuration {
                message: "Config validation: cors.allowed_origins must not be empty. \
                     Use '*' to allow all origins during development."
                    .to_string(),
            });
        }

        if self.limits.max_upload_bytes == 0 {
            return Err(Error::Configuration {
                message: "Config validation: limits.max_upload_bytes must be greater than zero".to_string(),
            });
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
