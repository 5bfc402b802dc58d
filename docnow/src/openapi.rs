//! OpenAPI documentation for the gateway endpoints, served at `/docs`.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "DocNow API",
        description = "Gateway forwarding text, chat history, images and audio to external AI providers."
    ),
    paths(
        crate::api::handlers::analyze::analyze,
        crate::api::handlers::transcribe::transcribe,
        crate::api::handlers::tts::tts,
    ),
    components(schemas(
        crate::api::models::analyze::AnalyzeResponse,
        crate::api::models::transcribe::TranscribeResponse,
    )),
    tags(
        (name = "analyze", description = "Multimodal analysis"),
        (name = "transcribe", description = "Speech-to-text"),
        (name = "tts", description = "Text-to-speech"),
    )
)]
pub struct ApiDoc;
