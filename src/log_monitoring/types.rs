use std::time::Duration;

/// Idle wait between reads once the end of the file has been reached.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Longest stretch of a line evaluated at once. A longer line is evaluated in
/// pieces of this size.
pub const MAX_LINE_LEN: usize = 2048;
