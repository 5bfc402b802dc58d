//! Client for the Groq OpenAI-compatible API: multimodal chat completions and
//! Whisper audio transcriptions.

use std::path::Path;

use anyhow::Context;
use serde_json::{Value, json};

use crate::api::models::chat::{ChatMessage, ContentPart, ImageUrl, MessageContent, Role};
use crate::config::GroqConfig;
use crate::errors::Error;
use crate::media::EncodedImage;

/// Persona instruction prepended to every multimodal call.
const SYSTEM_PROMPT: &str = "You are a calm, friendly health assistant talking to a regular person.\n\
Use simple, everyday language.\n\n\
Rules:\n\
- Do NOT give medical diagnoses\n\
- Avoid technical or medical jargon\n\
- Use words like 'might', 'could', 'sometimes'\n\
- Be reassuring, not alarming\n\
- Suggest gentle next steps if helpful\n\
- If an image is provided, describe only what is visible\n\
- You are not a replacement for a doctor\n\n\
Your tone should feel like a knowledgeable, caring friend.";

#[derive(Debug, Clone)]
pub struct GroqClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    chat_model: String,
    stt_model: String,
    stt_language: String,
}

impl GroqClient {
    /// Build a client from configuration.
    ///
    /// Fails when no credential is configured, so a misconfigured deployment
    /// is caught at startup rather than on the first request.
    pub fn new(config: &GroqConfig) -> Result<Self, Error> {
        let api_key = config.api_key.clone().ok_or_else(|| Error::Configuration {
            message: "GROQ_API_KEY not set".to_string(),
        })?;

        Ok(Self {
            http: reqwest::Client::new(),
            api_key,
            base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
            chat_model: config.chat_model.clone(),
            stt_model: config.stt_model.clone(),
            stt_language: config.stt_language.clone(),
        })
    }

    /// Run the multimodal model over chat history and/or a single text/image
    /// query, returning the model's text reply.
    pub async fn analyze(
        &self,
        messages: Option<Vec<ChatMessage>>,
        text: Option<&str>,
        image: Option<&EncodedImage>,
    ) -> anyhow::Result<String> {
        let composed = compose_messages(messages, text, image);

        tracing::debug!(model = %self.chat_model, message_count = composed.len(), "Sending chat completion");

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&json!({
                "model": self.chat_model,
                "messages": composed,
            }))
            .send()
            .await
            .context("chat completion request failed")?
            .error_for_status()
            .context("chat completion returned an error status")?
            .json::<Value>()
            .await
            .context("chat completion response was not JSON")?;

        Ok(extract_chat_text(&response))
    }

    /// Transcribe a local audio file with the configured Whisper model.
    pub async fn transcribe(&self, audio_path: &Path) -> anyhow::Result<String> {
        let data = tokio::fs::read(audio_path)
            .await
            .with_context(|| format!("read audio file {}", audio_path.display()))?;
        let file_name = audio_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio.wav".to_string());

        tracing::debug!(model = %self.stt_model, bytes = data.len(), "Sending transcription request");

        let form = reqwest::multipart::Form::new()
            .part("file", reqwest::multipart::Part::bytes(data).file_name(file_name))
            .text("model", self.stt_model.clone())
            .text("language", self.stt_language.clone());

        let response = self
            .http
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .await
            .context("transcription request failed")?
            .error_for_status()
            .context("transcription returned an error status")?
            .json::<Value>()
            .await
            .context("transcription response was not JSON")?;

        Ok(extract_transcription_text(&response))
    }
}

/// Build the provider message list: the fixed system instruction followed by
/// either the forwarded chat history or a single legacy-mode user message.
fn compose_messages(messages: Option<Vec<ChatMessage>>, text: Option<&str>, image: Option<&EncodedImage>) -> Vec<Value> {
    let mut composed = vec![json!({ "role": "system", "content": SYSTEM_PROMPT })];

    match messages {
        // Chat mode: forward history in order, dropping unknown roles. The
        // image (if any) is attached to the last message only, and only when
        // that message came from the user.
        Some(history) if !history.is_empty() => {
            let last = history.len() - 1;
            for (i, message) in history.into_iter().enumerate() {
                let role = match message.role {
                    Role::User => "user",
                    Role::Assistant => "assistant",
                    Role::Other => continue,
                };

                let mut content = message.content;
                if i == last && message.role == Role::User {
                    if let Some(image) = image {
                        content = attach_image(content, image);
                    }
                }

                composed.push(json!({ "role": role, "content": content }));
            }
        }
        // Legacy single-input mode: one user message listing whichever parts
        // were provided, text before image.
        _ => {
            let mut parts = Vec::new();
            if let Some(text) = text {
                parts.push(ContentPart::Text { text: text.to_string() });
            }
            if let Some(image) = image {
                parts.push(image_part(image));
            }

            composed.push(json!({ "role": "user", "content": parts }));
        }
    }

    composed
}

fn attach_image(content: MessageContent, image: &EncodedImage) -> MessageContent {
    let mut parts = match content {
        MessageContent::Text(text) => vec![ContentPart::Text { text }],
        MessageContent::Parts(parts) => parts,
    };
    parts.push(image_part(image));
    MessageContent::Parts(parts)
}

fn image_part(image: &EncodedImage) -> ContentPart {
    ContentPart::ImageUrl {
        image_url: ImageUrl { url: image.data_url() },
    }
}

/// Trimmed text of the first choice, or the stringified body when the
/// expected shape is absent.
fn extract_chat_text(response: &Value) -> String {
    match response["choices"][0]["message"]["content"].as_str() {
        Some(content) => content.trim().to_string(),
        None => response.to_string(),
    }
}

/// The `text` field, or the stringified body when absent.
fn extract_transcription_text(response: &Value) -> String {
    match response["text"].as_str() {
        Some(text) => text.to_string(),
        None => response.to_string(),
    }
}
