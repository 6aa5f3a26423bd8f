pub mod peer_channel;
pub mod types;

pub use peer_channel::PeerChannel;
pub use types::{EXIT_TOKEN, SEND_TIMEOUT};
