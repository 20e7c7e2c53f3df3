use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error_handling::types::ResolveError;

/// Requested output size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    pub width: u32,
    pub height: u32,
}

impl Dimension {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width over height. Zero on either side is rejected.
    pub fn ratio(&self) -> Result<f64, ResolveError> {
        if self.width == 0 || self.height == 0 {
            return Err(ResolveError::InvalidDimension(format!(
                "{}x{} has a zero side",
                self.width, self.height
            )));
        }
        Ok(self.width as f64 / self.height as f64)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Label understood by one provider, e.g. `"16:9"` or `"landscape_16_9"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProviderDescriptor(String);

impl ProviderDescriptor {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProviderDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RatioEntry {
    pub ratio: f64,
    pub descriptor: ProviderDescriptor,
}

impl RatioEntry {
    pub fn new(ratio: f64, tag: &str) -> Self {
        Self {
            ratio,
            descriptor: ProviderDescriptor::new(tag),
        }
    }
}

/// The descriptor vocabulary of a single provider.
///
/// - `Nearest`: discrete ratios, the closest one wins, earlier entries win ties.
/// - `Bucketed`: lower-bound thresholds walked from largest to smallest, the
///   first bound strictly exceeded wins, `fallback` catches the rest.
#[derive(Debug, Clone, PartialEq)]
pub enum Vocabulary {
    Nearest(Vec<RatioEntry>),
    Bucketed {
        thresholds: Vec<RatioEntry>,
        fallback: ProviderDescriptor,
    },
}

impl Vocabulary {
    /// Builds a nearest-ratio vocabulary. An empty entry list is refused
    /// since no descriptor could ever be returned.
    pub fn nearest(entries: Vec<RatioEntry>) -> Option<Self> {
        if entries.is_empty() {
            return None;
        }
        Some(Vocabulary::Nearest(entries))
    }

    /// Builds a bucketed vocabulary with thresholds kept in descending order.
    pub fn bucketed(mut thresholds: Vec<RatioEntry>, fallback: &str) -> Self {
        // stable: equal bounds keep declaration order
        thresholds.sort_by(|a, b| b.ratio.total_cmp(&a.ratio));
        Vocabulary::Bucketed {
            thresholds,
            fallback: ProviderDescriptor::new(fallback),
        }
    }

    /// Every descriptor this vocabulary can return.
    pub fn descriptors(&self) -> Vec<&ProviderDescriptor> {
        match self {
            Vocabulary::Nearest(entries) => entries.iter().map(|e| &e.descriptor).collect(),
            Vocabulary::Bucketed {
                thresholds,
                fallback,
            } => thresholds
                .iter()
                .map(|e| &e.descriptor)
                .chain(std::iter::once(fallback))
                .collect(),
        }
    }

    pub fn contains(&self, descriptor: &ProviderDescriptor) -> bool {
        self.descriptors().into_iter().any(|d| d == descriptor)
    }
}
