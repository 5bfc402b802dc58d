//! Free fallback synthesis via the Google Translate TTS endpoint (the same
//! endpoint the gTTS tooling drives). No credential required.

use anyhow::Context;
use async_trait::async_trait;
use tempfile::NamedTempFile;

use crate::config::GttsConfig;

use super::{SpeechSynthesizer, write_audio};

#[derive(Debug, Clone)]
pub struct GttsClient {
    http: reqwest::Client,
    base_url: String,
    lang: String,
}

impl GttsClient {
    pub fn new(config: &GttsConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
            lang: config.lang.clone(),
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for GttsClient {
    fn name(&self) -> &'static str {
        "gtts"
    }

    async fn synthesize(&self, text: &str) -> anyhow::Result<NamedTempFile> {
        let response = self
            .http
            .get(format!("{}/translate_tts", self.base_url))
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", self.lang.as_str()),
                ("q", text),
            ])
            .send()
            .await
            .context("gtts request failed")?
            .error_for_status()
            .context("gtts returned an error status")?;

        let audio = response.bytes().await.context("read gtts audio body")?;

        write_audio(&audio).await
    }
}
