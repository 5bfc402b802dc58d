use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Successful transcription response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TranscribeResponse {
    pub success: bool,
    /// Text recognized from the uploaded audio
    pub transcription: String,
}
