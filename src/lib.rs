//! Side-by-side comparison of two image reframing providers.
//!
//! An image is uploaded once, both providers are asked to reframe it to the
//! requested size concurrently, and every comparison is kept in a history log
//! served over HTTP.

pub mod configuration;
pub mod controller;
pub mod dimension;
pub mod dispatch;
pub mod error_handling;
pub mod storage;
pub mod web_interface;

pub use controller::controller_handler::Controller;
