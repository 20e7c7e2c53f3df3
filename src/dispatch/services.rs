//! Collaborator traits
//!
//! The coordinator only talks to the outside world through these two traits,
//! so tests can swap the HTTP client for in-process fakes.

use async_trait::async_trait;

use super::types::ImageUpload;
use crate::dimension::ProviderDescriptor;
use crate::error_handling::types::ProviderError;

/// Stores the source image somewhere both providers can fetch it from.
#[async_trait]
pub trait UploadService: Send + Sync {
    /// Returns a locator (URL) for the uploaded image.
    async fn upload(&self, image: &ImageUpload) -> Result<String, ProviderError>;
}

/// One reframing provider.
#[async_trait]
pub trait ProviderService: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Runs the provider on `image_reference` and returns the locator of the result image.
    async fn invoke(
        &self,
        image_reference: &str,
        descriptor: &ProviderDescriptor,
    ) -> Result<String, ProviderError>;
}
