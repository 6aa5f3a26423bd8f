use std::time::Duration;

/// Token written to the peer when a side stops. Its content is never parsed.
pub const EXIT_TOKEN: &[u8] = b"exit\n";

/// Upper bound on delivering [`EXIT_TOKEN`] before closing the channel.
pub const SEND_TIMEOUT: Duration = Duration::from_secs(1);
