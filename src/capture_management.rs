//! Capture process lifecycle.
//!
//! The capture command is an arbitrary shell command line (typically a packet
//! capture tool) started as the leader of its own process group. Stopping it
//! is two-phased: a graceful signal to the group, then a forced kill once the
//! grace period runs out.
//!
//! Re-exports:
//! - [`CaptureProcess`]: spawn / stop / wait.
//! - [`CaptureExit`], [`ProcessGroup`], [`GroupControl`]: core types.
//!
//! ```ignore
//! use std::time::Duration;
//! use dualcap::capture_management::CaptureProcess;
//!
//! let mut capture = CaptureProcess::spawn("tcpdump -i any -w trace.pcap")?;
//! // ... monitoring ...
//! let exit = capture.stop(Duration::from_millis(500)).await?;
//! println!("capture {}", exit);
//! ```

pub mod capture_manager;
pub mod types;
#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

pub use capture_manager::CaptureProcess;
pub use types::{CaptureExit, GroupControl, ProcessGroup, DEFAULT_STOP_GRACE};
