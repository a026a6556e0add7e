pub mod header;
pub mod indicators;
pub mod progress_bar;

pub use header::{border, centered, rule, Header};
pub use indicators::{SessionMarker, StatusIndicator, Timeline};
pub use progress_bar::{bar_width, RateBar};
