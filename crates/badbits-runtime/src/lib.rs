//! Runtime layer for BadBits.
//!
//! Drives the check engine through its reference, monitoring and stopped
//! states, archives checks on request, and defines the seams the terminal
//! layer plugs into.

pub mod archive;
pub mod display;
pub mod engine;

pub use badbits_core as core;
pub use badbits_vision as vision;
