//! Camera, image and model layer for BadBits.
//!
//! Captures frames from the webcam, stacks them against the reference pose,
//! and asks a vision-language model yes/no questions about the result.

pub mod camera;
pub mod classifier;
pub mod composite;
pub mod label;

pub use badbits_core as core;
