//! Dispatch subsystem
//!
//! Components:
//! - `types`: `Outcome`, `ComparisonResult`, `ImageUpload` and the id generator.
//! - `services`: the `UploadService` and `ProviderService` collaborator traits.
//! - `coordinator`: the concurrent dispatch-and-reconcile protocol.
//! - `fal_client`: reqwest-backed implementations of the collaborator traits.

pub mod coordinator;
pub mod fal_client;
pub mod services;
pub mod types;

pub use coordinator::{settle_all, DispatchCoordinator};
pub use services::{ProviderService, UploadService};
pub use types::{ComparisonResult, ImageUpload, Outcome};
