//! Dispatch Coordinator
//!
//! Runs one comparison: upload the image once, fan it out to both providers at
//! the same time, wait for both to settle, and fold everything into a single
//! [`ComparisonResult`].
//!
//! ```text
//!                       ┌──────────────┐
//!                   ┌──▶│ provider A   │──┐
//! ┌────────┐  ref   │   └──────────────┘  │  settle-all   ┌──────────────────┐
//! │ upload │────────┤                     ├──────────────▶│ ComparisonResult │
//! └────────┘        │   ┌──────────────┐  │               └──────────────────┘
//!                   └──▶│ provider B   │──┘
//!                       └──────────────┘
//! ```
//!
//! Only the upload can fail the whole call. Provider errors and timeouts are
//! recorded as [`Outcome::Failure`] inside the result.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures_util::future::join_all;
use log::{debug, error, info, warn};

use super::services::{ProviderService, UploadService};
use super::types::{ComparisonResult, IdGenerator, ImageUpload, Outcome};
use crate::dimension::resolver::{ideogram_vocabulary, image_editing_vocabulary};
use crate::dimension::{resolve_descriptor, Dimension, Vocabulary};
use crate::error_handling::types::{DispatchError, ProviderError};

const UNKNOWN_ERROR: &str = "Unknown error";

pub struct DispatchCoordinator {
    uploader: Arc<dyn UploadService>,
    provider_a: Arc<dyn ProviderService>,
    provider_b: Arc<dyn ProviderService>,
    vocabulary_a: Vocabulary,
    vocabulary_b: Vocabulary,
    provider_timeout: Duration,
    ids: IdGenerator,
}

impl DispatchCoordinator {
    /// Coordinator using the built-in vocabularies: image-editing for
    /// provider A and ideogram for provider B.
    pub fn new(
        uploader: Arc<dyn UploadService>,
        provider_a: Arc<dyn ProviderService>,
        provider_b: Arc<dyn ProviderService>,
        provider_timeout: Duration,
    ) -> Self {
        Self::with_vocabularies(
            uploader,
            (provider_a, image_editing_vocabulary()),
            (provider_b, ideogram_vocabulary()),
            provider_timeout,
        )
    }

    pub fn with_vocabularies(
        uploader: Arc<dyn UploadService>,
        provider_a: (Arc<dyn ProviderService>, Vocabulary),
        provider_b: (Arc<dyn ProviderService>, Vocabulary),
        provider_timeout: Duration,
    ) -> Self {
        Self {
            uploader,
            provider_a: provider_a.0,
            provider_b: provider_b.0,
            vocabulary_a: provider_a.1,
            vocabulary_b: provider_b.1,
            provider_timeout,
            ids: IdGenerator::new(),
        }
    }

    /// Runs both providers on `image` for the `requested` size.
    ///
    /// Fails with `InvalidDimension` before any network call, or with
    /// `UploadFailed` when no image reference could be obtained. Any other
    /// outcome, including both providers failing, is a valid result.
    pub async fn compare_reframing(
        &self,
        image: &ImageUpload,
        requested: Dimension,
    ) -> Result<ComparisonResult, DispatchError> {
        let descriptor_a = resolve_descriptor(&requested, &self.vocabulary_a)?;
        let descriptor_b = resolve_descriptor(&requested, &self.vocabulary_b)?;
        info!(
            "Starting comparison for {} ({} bytes, {})",
            requested,
            image.bytes.len(),
            image.file_name
        );
        debug!(
            "Resolved descriptors: {}={}, {}={}",
            self.provider_a.name(),
            descriptor_a,
            self.provider_b.name(),
            descriptor_b
        );

        let reference = match self.uploader.upload(image).await {
            Ok(reference) if !reference.trim().is_empty() => reference,
            Ok(_) => {
                error!("Upload returned an empty image reference");
                return Err(DispatchError::UploadFailed(
                    "no image reference returned".to_string(),
                ));
            }
            Err(e) => {
                error!("Upload failed: {}", e);
                return Err(DispatchError::UploadFailed(failure_message(&e)));
            }
        };
        debug!("Uploaded source image to {}", reference);

        let outcomes = settle_all(
            vec![
                self.provider_a.invoke(&reference, &descriptor_a),
                self.provider_b.invoke(&reference, &descriptor_b),
            ],
            self.provider_timeout,
        )
        .await;
        let mut outcomes = outcomes.into_iter();
        let outcome_a = outcomes
            .next()
            .unwrap_or_else(|| Outcome::failure(UNKNOWN_ERROR));
        let outcome_b = outcomes
            .next()
            .unwrap_or_else(|| Outcome::failure(UNKNOWN_ERROR));

        for (provider, outcome) in [(&self.provider_a, &outcome_a), (&self.provider_b, &outcome_b)] {
            if let Outcome::Failure { message } = outcome {
                warn!("Provider {} failed: {}", provider.name(), message);
            }
        }

        let timestamp = Utc::now();
        let result = ComparisonResult::new(
            self.ids.next_id(timestamp),
            timestamp,
            reference,
            requested,
            (descriptor_a, outcome_a),
            (descriptor_b, outcome_b),
        );
        info!(
            "Comparison {} finished: {}={}, {}={}",
            result.id(),
            self.provider_a.name(),
            status_label(result.provider_a_outcome()),
            self.provider_b.name(),
            status_label(result.provider_b_outcome())
        );
        Ok(result)
    }
}

/// Awaits every task concurrently and never short-circuits: each task settles
/// into its own [`Outcome`], returned in input order. A task still pending
/// after `limit` settles as `Failure { "timeout" }`.
pub async fn settle_all<F>(tasks: Vec<F>, limit: Duration) -> Vec<Outcome>
where
    F: Future<Output = Result<String, ProviderError>>,
{
    join_all(tasks.into_iter().map(|task| settle(task, limit))).await
}

async fn settle<F>(task: F, limit: Duration) -> Outcome
where
    F: Future<Output = Result<String, ProviderError>>,
{
    match tokio::time::timeout(limit, task).await {
        Ok(Ok(reference)) if reference.trim().is_empty() => {
            Outcome::failure("Provider returned no image")
        }
        Ok(Ok(reference)) => Outcome::success(reference),
        Ok(Err(e)) => Outcome::failure(failure_message(&e)),
        Err(_) => Outcome::failure(ProviderError::Timeout.to_string()),
    }
}

fn failure_message(err: &ProviderError) -> String {
    let message = err.to_string();
    if message.trim().is_empty() {
        UNKNOWN_ERROR.to_string()
    } else {
        message
    }
}

fn status_label(outcome: &Outcome) -> &'static str {
    if outcome.is_success() {
        "success"
    } else {
        "failure"
    }
}
