use serde::{Deserialize, Serialize};

use crate::dimension::Dimension;

/// API error payload
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SaveHistoryResponse {
    pub success: bool,
    pub message: String,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub message: &'static str,
}

/// Body of `POST /api/compare`.
///
/// `image` is base64, optionally as a `data:<mime>;base64,` URI. Either
/// `dimensions` or the name of a preset must be given; `dimensions` wins.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompareRequest {
    pub image: String,
    #[serde(default)]
    pub file_name: Option<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub dimensions: Option<Dimension>,
    #[serde(default)]
    pub preset: Option<String>,
}
