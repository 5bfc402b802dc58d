use axum::{
    Json,
    extract::{Multipart, State},
};

use crate::AppState;
use crate::api::models::analyze::AnalyzeResponse;
use crate::api::models::chat::ChatMessage;
use crate::errors::{Error, Result};
use crate::media;
use crate::uploads;

#[utoipa::path(
    post,
    path = "/analyze/",
    tag = "analyze",
    summary = "Analyze text, chat history, or an image",
    description = "Forwards the input to the multimodal model. Accepts any combination of a free-text \
        query, a JSON-encoded chat history, and an image file; at least one must be present.",
    request_body(
        content_type = "multipart/form-data",
        description = "Form fields: `text` (optional string), `messages` (optional JSON array string), `image` (optional file)"
    ),
    responses(
        (status = 200, description = "Model reply", body = AnalyzeResponse),
        (status = 400, description = "Malformed messages or no usable input"),
        (status = 500, description = "Provider call failed")
    )
)]
#[tracing::instrument(skip_all)]
pub async fn analyze(State(state): State<AppState>, mut multipart: Multipart) -> Result<Json<AnalyzeResponse>> {
    let mut text: Option<String> = None;
    let mut raw_messages: Option<String> = None;
    let mut image: Option<(Option<String>, Vec<u8>)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| Error::BadRequest {
        message: format!("Failed to parse multipart data: {e}"),
    })? {
        let field_name = field.name().unwrap_or("").to_string();

        match field_name.as_str() {
            "text" => {
                text = Some(field.text().await.map_err(|e| Error::BadRequest {
                    message: format!("Failed to read text: {e}"),
                })?);
            }
            "messages" => {
                raw_messages = Some(field.text().await.map_err(|e| Error::BadRequest {
                    message: format!("Failed to read messages: {e}"),
                })?);
            }
            "image" => {
                let filename = field.file_name().map(str::to_string);
                let data = field.bytes().await.map_err(|e| Error::BadRequest {
                    message: format!("Failed to read image: {e}"),
                })?;
                image = Some((filename, data.to_vec()));
            }
            _ => {
                // Ignore unknown fields (forward compatibility)
            }
        }
    }

    // Parse chat messages (if provided)
    let messages: Option<Vec<ChatMessage>> = match raw_messages.as_deref().filter(|raw| !raw.is_empty()) {
        Some(raw) => Some(serde_json::from_str(raw).map_err(|_| Error::bad_request("Invalid messages format"))?),
        None => None,
    };
    let messages = messages.filter(|history| !history.is_empty());

    // Normalize legacy text input: empty and the literal placeholder "text"
    // both count as absent
    let text = text
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty() && !t.eq_ignore_ascii_case("text"));

    // Encode the uploaded image through a temp file that is removed as soon
    // as encoding finishes, whether or not it succeeded
    let mut encoded_image = None;
    if let Some((filename, data)) = image {
        if let Some(filename) = filename.filter(|name| !name.is_empty()) {
            let suffix = uploads::suffix_for(&filename, ".jpg");
            let tmp = uploads::persist_upload(&data, &suffix).await?;
            encoded_image = Some(media::encode_image(tmp.path()).await?);
        }
    }

    if messages.is_none() && text.is_none() && encoded_image.is_none() {
        return Err(Error::bad_request("Provide messages, text, or an image"));
    }

    let response = state.groq.analyze(messages, text.as_deref(), encoded_image.as_ref()).await?;

    Ok(Json(AnalyzeResponse { success: true, response }))
}
