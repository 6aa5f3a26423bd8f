use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::path::PathBuf;

/// Which side of the rendezvous this instance plays.
///
/// Exactly one role is ever selected: the initiator knows where its peer is,
/// the listener only knows which local port to wait on.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Role {
    Initiator { peer: SocketAddrV4 },
    Listener { port: u16 },
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Initiator { peer } => write!(f, "initiator (peer {})", peer),
            Role::Listener { port } => write!(f, "listener (port {})", port),
        }
    }
}

/// Configuration file contents before validation, one field per recognised key.
///
/// Also used to render a validated [`Config`](super::config::Config) back out
/// for `--check`.
#[derive(Debug, Default, PartialEq, Clone, Serialize, Deserialize)]
pub struct RawConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init_ip: Option<Ipv4Addr>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listen_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mon_file: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cap_cmd: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cap_linger_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cap_stop_grace_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mon_pattern: Option<String>,
}
