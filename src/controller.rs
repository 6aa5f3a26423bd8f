//! Shutdown coordination.
//!
//! [`Controller`] sequences one capture session: capture start, rendezvous,
//! the two concurrent monitor loops, and the capture stop. The loops share a
//! single [`ShutdownFlag`] and nothing else.

pub mod controller_handler;
pub mod shutdown;
pub mod types;

pub use controller_handler::{converge, Controller};
pub use shutdown::{ShutdownFlag, Trigger};
pub use types::SessionReport;
