//! Clients for the external AI providers the gateway fronts.
//!
//! Everything of substance lives on the other side of these calls; the
//! clients validate credentials at construction, make one HTTP request, and
//! map the response into a plain Rust value.

pub mod elevenlabs;
pub mod groq;
pub mod gtts;

use anyhow::Context;
use async_trait::async_trait;
use tempfile::NamedTempFile;

pub use elevenlabs::ElevenLabsClient;
pub use groq::GroqClient;
pub use gtts::GttsClient;

/// A speech-synthesis backend that renders text to an audio file.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Engine identifier reported in the `X-TTS-Engine` response header.
    fn name(&self) -> &'static str;

    /// Render `text` to an mp3. The file is deleted when the handle drops.
    async fn synthesize(&self, text: &str) -> anyhow::Result<NamedTempFile>;
}

/// Result of a successful run through the synthesis chain.
pub struct SynthesizedSpeech {
    pub engine: &'static str,
    pub audio: NamedTempFile,
}

/// Try each synthesizer in order until one succeeds.
///
/// A non-final failure is logged as a warning and the next engine is tried;
/// the last engine's failure propagates to the caller.
pub async fn synthesize_with_fallback(
    chain: &[Box<dyn SpeechSynthesizer>],
    text: &str,
) -> anyhow::Result<SynthesizedSpeech> {
    let (last, rest) = chain
        .split_last()
        .ok_or_else(|| anyhow::anyhow!("no speech synthesizers configured"))?;

    for synthesizer in rest {
        match synthesizer.synthesize(text).await {
            Ok(audio) => {
                return Ok(SynthesizedSpeech {
                    engine: synthesizer.name(),
                    audio,
                });
            }
            Err(e) => {
                tracing::warn!("{} synthesis failed, falling back: {:#}", synthesizer.name(), e);
            }
        }
    }

    let audio = last.synthesize(text).await?;
    Ok(SynthesizedSpeech { engine: last.name(), audio })
}

/// Write synthesized audio bytes to a named temp `.mp3`.
pub(crate) async fn write_audio(data: &[u8]) -> anyhow::Result<NamedTempFile> {
    let tmp = tempfile::Builder::new()
        .prefix("docnow-tts-")
        .suffix(".mp3")
        .tempfile()
        .context("create temp file for synthesized audio")?;

    tokio::fs::write(tmp.path(), data).await.context("write synthesized audio")?;

    Ok(tmp)
}
