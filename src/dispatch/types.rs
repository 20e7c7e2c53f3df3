use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::dimension::{Dimension, ProviderDescriptor};

/// How one provider call settled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Outcome {
    Success {
        #[serde(rename = "resultImageReference")]
        result_image_reference: String,
    },
    Failure {
        message: String,
    },
}

impl Outcome {
    pub fn success(result_image_reference: impl Into<String>) -> Self {
        Outcome::Success {
            result_image_reference: result_image_reference.into(),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Outcome::Failure {
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    pub fn result_image_reference(&self) -> Option<&str> {
        match self {
            Outcome::Success {
                result_image_reference,
            } => Some(result_image_reference),
            Outcome::Failure { .. } => None,
        }
    }
}

/// One finished comparison. Built once by the coordinator and never changed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonResult {
    id: u64,
    timestamp: DateTime<Utc>,
    source_image_reference: String,
    provider_a_outcome: Outcome,
    provider_b_outcome: Outcome,
    requested_dimensions: Dimension,
    resolved_descriptor_a: ProviderDescriptor,
    resolved_descriptor_b: ProviderDescriptor,
}

impl ComparisonResult {
    /// `provider_a` and `provider_b` pair each resolved descriptor with the
    /// outcome of the call made with it.
    pub fn new(
        id: u64,
        timestamp: DateTime<Utc>,
        source_image_reference: impl Into<String>,
        requested_dimensions: Dimension,
        provider_a: (ProviderDescriptor, Outcome),
        provider_b: (ProviderDescriptor, Outcome),
    ) -> Self {
        Self {
            id,
            timestamp,
            source_image_reference: source_image_reference.into(),
            provider_a_outcome: provider_a.1,
            provider_b_outcome: provider_b.1,
            requested_dimensions,
            resolved_descriptor_a: provider_a.0,
            resolved_descriptor_b: provider_b.0,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn source_image_reference(&self) -> &str {
        &self.source_image_reference
    }

    pub fn provider_a_outcome(&self) -> &Outcome {
        &self.provider_a_outcome
    }

    pub fn provider_b_outcome(&self) -> &Outcome {
        &self.provider_b_outcome
    }

    pub fn requested_dimensions(&self) -> Dimension {
        self.requested_dimensions
    }

    pub fn resolved_descriptor_a(&self) -> &ProviderDescriptor {
        &self.resolved_descriptor_a
    }

    pub fn resolved_descriptor_b(&self) -> &ProviderDescriptor {
        &self.resolved_descriptor_b
    }
}

/// Raw image handed to the upload service.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub file_name: String,
    pub content_type: String,
}

impl ImageUpload {
    pub fn new(bytes: Vec<u8>, file_name: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            bytes,
            file_name: file_name.into(),
            content_type: content_type.into(),
        }
    }
}

/// Millisecond-based ids, bumped when two results land in the same millisecond.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: AtomicU64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&self, now: DateTime<Utc>) -> u64 {
        let candidate = now.timestamp_millis().max(0) as u64;
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let next = candidate.max(last + 1);
            match self
                .last
                .compare_exchange_weak(last, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(actual) => last = actual,
            }
        }
    }
}
