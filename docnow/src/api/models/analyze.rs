use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Successful multimodal analysis response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AnalyzeResponse {
    pub success: bool,
    /// The model's text reply
    pub response: String,
}
