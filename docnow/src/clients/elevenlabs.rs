//! Premium voice synthesis via the ElevenLabs HTTP API.

use anyhow::Context;
use async_trait::async_trait;
use serde_json::json;
use tempfile::NamedTempFile;

use crate::config::ElevenLabsConfig;
use crate::errors::Error;

use super::{SpeechSynthesizer, write_audio};

#[derive(Debug, Clone)]
pub struct ElevenLabsClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    voice_id: String,
    model_id: String,
    output_format: String,
}

impl ElevenLabsClient {
    /// Requires a credential. The caller decides whether a missing key is
    /// fatal or merely removes the engine from the fallback chain.
    pub fn new(config: &ElevenLabsConfig) -> Result<Self, Error> {
        let api_key = config.api_key.clone().ok_or_else(|| Error::Configuration {
            message: "ELEVENLABS_API_KEY not configured".to_string(),
        })?;

        Ok(Self {
            http: reqwest::Client::new(),
            api_key,
            base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
            voice_id: config.voice_id.clone(),
            model_id: config.model_id.clone(),
            output_format: config.output_format.clone(),
        })
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsClient {
    fn name(&self) -> &'static str {
        "elevenlabs"
    }

    async fn synthesize(&self, text: &str) -> anyhow::Result<NamedTempFile> {
        let response = self
            .http
            .post(format!("{}/v1/text-to-speech/{}", self.base_url, self.voice_id))
            .header("xi-api-key", &self.api_key)
            .query(&[("output_format", self.output_format.as_str())])
            .json(&json!({
                "text": text,
                "model_id": self.model_id,
            }))
            .send()
            .await
            .context("elevenlabs request failed")?
            .error_for_status()
            .context("elevenlabs returned an error status")?;

        let audio = response.bytes().await.context("read elevenlabs audio body")?;

        write_audio(&audio).await
    }
}
