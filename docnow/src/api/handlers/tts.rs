use anyhow::Context;
use axum::{
    extract::{Multipart, State},
    http::{HeaderMap, HeaderValue, header},
    response::IntoResponse,
};

use crate::AppState;
use crate::clients;
use crate::errors::{Error, Result};

#[utoipa::path(
    post,
    path = "/tts/",
    tag = "tts",
    summary = "Synthesize speech from text",
    description = "Renders the text with the premium engine when configured, falling back to the \
        free engine on any failure. The `X-TTS-Engine` response header names the engine that served \
        the request.",
    request_body(
        content_type = "multipart/form-data",
        description = "Form field: `text` (required string)"
    ),
    responses(
        (status = 200, description = "Synthesized audio (`audio/mpeg`)"),
        (status = 400, description = "Empty text"),
        (status = 500, description = "All synthesis engines failed")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn tts(State(state): State<AppState>, mut multipart: Multipart) -> Result<impl IntoResponse> {
    let mut text: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| Error::BadRequest {
        message: format!("Failed to parse multipart data: {e}"),
    })? {
        if field.name() == Some("text") {
            text = Some(field.text().await.map_err(|e| Error::BadRequest {
                message: format!("Failed to read text: {e}"),
            })?);
        }
    }

    let text = text
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| Error::bad_request("Text is required"))?;

    let speech = clients::synthesize_with_fallback(&state.synthesizers, &text).await?;

    tracing::info!(engine = speech.engine, "Synthesized speech");

    let audio = tokio::fs::read(speech.audio.path()).await.context("read synthesized audio")?;
    let filename = speech
        .audio
        .path()
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "speech.mp3".to_string());

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("audio/mpeg"));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("attachment; filename=\"{filename}\"")).map_err(anyhow::Error::from)?,
    );
    headers.insert("x-tts-engine", HeaderValue::from_static(speech.engine));

    Ok((headers, audio))
}
