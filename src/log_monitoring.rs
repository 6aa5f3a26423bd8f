//! Log tail monitor.
//!
//! Follows a single append-only text file from its end at open time and sets
//! the shutdown flag on the first new line that satisfies the trigger.
//! Rotation or truncation of the file during a run is not handled.

pub mod file_monitor;
pub mod types;

pub use file_monitor::LogMonitor;
pub use types::{MAX_LINE_LEN, POLL_INTERVAL};
