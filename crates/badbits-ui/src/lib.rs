//! Terminal UI layer for BadBits.
//!
//! Themes, header/bar/indicator components, the live dashboard and session
//! summary, the `--simple` text report, and the terminal front-ends and
//! reference-capture ritual the runtime drives, rendered with [`ratatui`].

pub mod components;
pub mod dashboard;
pub mod plain;
pub mod ritual;
pub mod summary;
pub mod terminal;
pub mod themes;

pub use badbits_core as core;
