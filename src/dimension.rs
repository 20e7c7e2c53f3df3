//! Dimension resolution
//!
//! Turns a requested width/height into the descriptor each reframing provider
//! understands.
//!
//! Components:
//! - `types`: `Dimension`, `ProviderDescriptor` and the `Vocabulary` shapes.
//! - `resolver`: nearest-ratio and bucketed resolution plus the built-in vocabularies.
//! - `presets`: named size shortcuts.

pub mod presets;
pub mod resolver;
pub mod types;

pub use presets::{find_preset, presets, Preset};
pub use resolver::{resolve_descriptor, resolve_pair, resolve_ratio};
pub use types::{Dimension, ProviderDescriptor, RatioEntry, Vocabulary};
