use axum::{
    Json,
    extract::{Multipart, State},
};

use crate::AppState;
use crate::api::models::transcribe::TranscribeResponse;
use crate::errors::{Error, Result};
use crate::uploads;

#[utoipa::path(
    post,
    path = "/transcribe/",
    tag = "transcribe",
    summary = "Transcribe an audio file",
    request_body(
        content_type = "multipart/form-data",
        description = "Form field: `audio` (required file)"
    ),
    responses(
        (status = 200, description = "Recognized text", body = TranscribeResponse),
        (status = 400, description = "No audio file provided"),
        (status = 500, description = "Provider call failed")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn transcribe(State(state): State<AppState>, mut multipart: Multipart) -> Result<Json<TranscribeResponse>> {
    let mut audio: Option<(String, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| Error::BadRequest {
        message: format!("Failed to parse multipart data: {e}"),
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "audio" => {
                let filename = field.file_name().unwrap_or("").to_string();
                let data = field.bytes().await.map_err(|e| Error::BadRequest {
                    message: format!("Failed to read audio: {e}"),
                })?;
                audio = Some((filename, data.to_vec()));
            }
            _ => {
                // Ignore unknown fields (forward compatibility)
            }
        }
    }

    let (filename, data) = audio
        .filter(|(name, _)| !name.is_empty())
        .ok_or_else(|| Error::bad_request("No audio file provided"))?;

    let suffix = uploads::suffix_for(&filename, ".wav");
    let tmp = uploads::persist_upload(&data, &suffix).await?;

    let transcription = state.groq.transcribe(tmp.path()).await?;

    Ok(Json(TranscribeResponse {
        success: true,
        transcription,
    }))
}
