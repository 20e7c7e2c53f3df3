use serde::Deserialize;

/// Where the history log lives.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    File,
    Memory,
}

/// One reframing model endpoint.
#[derive(Debug, PartialEq, Clone, Deserialize)]
pub struct ProviderConfig {
    /// Label used in logs
    pub name: String,
    /// Model path appended to the run base URL
    pub endpoint: String,
    /// Input key carrying the resolved descriptor
    pub descriptor_field: String,
}

impl ProviderConfig {
    pub fn image_editing() -> Self {
        Self {
            name: "image-editing".to_string(),
            endpoint: "fal-ai/image-editing/reframe".to_string(),
            descriptor_field: "aspect_ratio".to_string(),
        }
    }

    pub fn ideogram() -> Self {
        Self {
            name: "ideogram".to_string(),
            endpoint: "fal-ai/ideogram/v3/reframe".to_string(),
            descriptor_field: "image_size".to_string(),
        }
    }
}
