//! Domain model for BadBits.
//!
//! Habit definitions, per-cycle alert results, the immutable session tally,
//! alert delivery and the command-line settings shared by every other crate.

pub mod alerts;
pub mod error;
pub mod formatting;
pub mod habits;
pub mod notifications;
pub mod settings;
pub mod stats;

pub use error::{BadbitsError, Result};
