//! # Peer Channel
//!
//! Rendezvous with the other instance and exchange of the one-shot stop signal.
//!
//! There is no protocol beyond "bytes or no bytes": any inbound data, or the
//! connection closing, means the peer has stopped. On its own way out each
//! side writes [`EXIT_TOKEN`] once, best-effort, then closes.
//!
//! ```text
//!   initiator                         listener
//!   ─────────                         ────────
//!   connect(peer) ──────────────────▶ bind 0.0.0.0:port, accept one
//!       │                                  │
//!   await_signal ◀── "exit\n" / EOF ── send_signal + close
//! ```

use super::types::{EXIT_TOKEN, SEND_TIMEOUT};
use crate::configuration::types::Role;
use crate::controller::shutdown::{ShutdownFlag, Trigger};
use crate::error_handling::types::NetworkError;
use log::{debug, error, info, warn};
use std::net::{Ipv4Addr, SocketAddr};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpSocket, TcpStream};
use tokio::time::timeout;

/// The single connection between the two instances.
///
/// Generic over the stream so the wire behaviour can be exercised against
/// mock I/O; in production `S` is always a [`TcpStream`].
pub struct PeerChannel<S = TcpStream> {
    stream: S,
    peer: String,
}

impl PeerChannel<TcpStream> {
    /// Performs the rendezvous for `role`.
    ///
    /// # Errors
    ///
    /// Any bind, accept or connect failure is returned as-is; there is no retry.
    pub async fn connect(role: &Role) -> Result<Self, NetworkError> {
        match *role {
            Role::Initiator { peer } => Self::initiate(SocketAddr::V4(peer)).await,
            Role::Listener { port } => {
                let listener =
                    Self::listen(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)))?;
                Self::accept(listener).await
            }
        }
    }

    /// Binds a listening socket with room for exactly one pending peer.
    pub fn listen(addr: SocketAddr) -> Result<TcpListener, NetworkError> {
        let socket = match addr {
            SocketAddr::V4(_) => TcpSocket::new_v4(),
            SocketAddr::V6(_) => TcpSocket::new_v6(),
        }
        .map_err(|err| {
            error!("[!] Socket error: {:?}", err);
            NetworkError::SockError(err)
        })?;

        socket.set_reuseaddr(true).map_err(NetworkError::SockError)?;
        socket.bind(addr).map_err(|err| {
            error!("[!] Unable to bind {}: {}", addr, err);
            NetworkError::BindError(err)
        })?;

        socket.listen(1).map_err(NetworkError::BindError)
    }

    /// Accepts one peer, then stops listening.
    pub async fn accept(listener: TcpListener) -> Result<Self, NetworkError> {
        if let Ok(local) = listener.local_addr() {
            info!("Waiting for peer on {}", local);
        }

        let (stream, peer) = listener.accept().await.map_err(NetworkError::AcceptFailed)?;
        drop(listener);

        info!("Peer connected from {}", peer);
        Ok(Self::new(stream, peer.to_string()))
    }

    /// Opens the outbound connection to `addr`.
    pub async fn initiate(addr: SocketAddr) -> Result<Self, NetworkError> {
        info!("Connecting to peer at {}", addr);
        let stream = TcpStream::connect(addr).await.map_err(|err| {
            error!("[!] Unable to connect to {}: {}", addr, err);
            NetworkError::ConnectionFailed(err)
        })?;

        info!("Connected to peer at {}", addr);
        Ok(Self::new(stream, addr.to_string()))
    }
}

impl<S> PeerChannel<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, peer: impl Into<String>) -> Self {
        Self {
            stream,
            peer: peer.into(),
        }
    }

    pub fn peer(&self) -> &str {
        &self.peer
    }

    /// Full peer loop: wait for a stop from either side, notify, close.
    pub async fn run(mut self, flag: &ShutdownFlag) {
        self.await_signal(flag).await;
        self.send_signal().await;
        self.close().await;
    }

    /// Waits until the peer sends anything or goes away, or until the flag is
    /// set locally. Inbound data and a closed connection both set the flag.
    pub async fn await_signal(&mut self, flag: &ShutdownFlag) {
        let mut buf = [0u8; 64];

        tokio::select! {
            biased;

            _ = flag.wait() => {
                debug!("Local stop decision observed by peer loop");
            }
            read = self.stream.read(&mut buf) => match read {
                Ok(0) => {
                    info!("Peer {} closed the connection", self.peer);
                    flag.trigger(Trigger::PeerClosed);
                }
                Ok(n) => {
                    info!("Received stop signal from peer {} ({} bytes)", self.peer, n);
                    flag.trigger(Trigger::PeerData);
                }
                Err(err) => {
                    warn!("Connection to peer {} failed: {}", self.peer, err);
                    flag.trigger(Trigger::PeerClosed);
                }
            },
        }
    }

    /// Writes the stop token. Delivery failures are ignored.
    pub async fn send_signal(&mut self) {
        let write = async {
            self.stream.write_all(EXIT_TOKEN).await?;
            self.stream.flush().await
        };

        match timeout(SEND_TIMEOUT, write).await {
            Ok(Ok(())) => debug!("Sent stop signal to peer {}", self.peer),
            Ok(Err(err)) => debug!("Could not notify peer {}: {}", self.peer, err),
            Err(_) => debug!("Timed out notifying peer {}", self.peer),
        }
    }

    pub async fn close(mut self) {
        if let Err(err) = self.stream.shutdown().await {
            debug!("Error closing channel to {}: {}", self.peer, err);
        }
        debug!("Channel to {} closed", self.peer);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio_test::io::Builder;

    async fn connected_pair() -> (PeerChannel, PeerChannel) {
        let listener = PeerChannel::listen("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();

        let (accepted, initiated) =
            tokio::join!(PeerChannel::accept(listener), PeerChannel::initiate(addr));
        (accepted.unwrap(), initiated.unwrap())
    }

    #[tokio::test]
    async fn test_inbound_data_sets_flag_and_answers() {
        let stream = Builder::new().read(b"stop").write(EXIT_TOKEN).build();
        let flag = ShutdownFlag::new();

        PeerChannel::new(stream, "mock").run(&flag).await;

        assert_eq!(flag.cause(), Some(Trigger::PeerData));
    }

    #[tokio::test]
    async fn test_local_stop_notifies_peer() {
        let stream = Builder::new().write(EXIT_TOKEN).build();
        let flag = ShutdownFlag::new();
        flag.trigger(Trigger::LogMatch {
            line: "boom".to_string(),
        });

        PeerChannel::new(stream, "mock").run(&flag).await;

        assert!(matches!(flag.cause(), Some(Trigger::LogMatch { .. })));
    }

    #[tokio::test]
    async fn test_read_error_counts_as_closed() {
        let stream = Builder::new()
            .read_error(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "reset",
            ))
            .build();
        let flag = ShutdownFlag::new();
        let mut channel = PeerChannel::new(stream, "mock");

        channel.await_signal(&flag).await;

        assert_eq!(flag.cause(), Some(Trigger::PeerClosed));
    }

    #[tokio::test]
    async fn test_rendezvous_and_stop_propagation() {
        let (accepted, initiated) = connected_pair().await;

        let listener_flag = ShutdownFlag::new();
        let initiator_flag = ShutdownFlag::new();

        let listener_side = {
            let flag = listener_flag.clone();
            tokio::spawn(async move { accepted.run(&flag).await })
        };
        let initiator_side = {
            let flag = initiator_flag.clone();
            tokio::spawn(async move { initiated.run(&flag).await })
        };

        listener_flag.trigger(Trigger::LogMatch {
            line: "done".to_string(),
        });

        tokio::time::timeout(Duration::from_secs(2), async {
            listener_side.await.unwrap();
            initiator_side.await.unwrap();
        })
        .await
        .unwrap();

        assert_eq!(initiator_flag.cause(), Some(Trigger::PeerData));
    }

    #[tokio::test]
    async fn test_closed_peer_sets_flag_and_send_does_not_fail() {
        let (accepted, initiated) = connected_pair().await;
        drop(initiated);

        let flag = ShutdownFlag::new();
        tokio::time::timeout(Duration::from_secs(2), accepted.run(&flag))
            .await
            .unwrap();

        assert_eq!(flag.cause(), Some(Trigger::PeerClosed));
    }

    #[tokio::test]
    async fn test_connect_to_closed_port_fails() {
        let listener = PeerChannel::listen("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let result = PeerChannel::initiate(addr).await;
        assert!(matches!(result, Err(NetworkError::ConnectionFailed(_))));
    }

    #[tokio::test]
    async fn test_listener_accepts_only_one_peer() {
        let listener = PeerChannel::listen("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();

        let (accepted, initiated) =
            tokio::join!(PeerChannel::accept(listener), PeerChannel::initiate(addr));
        let _accepted = accepted.unwrap();
        let _initiated = initiated.unwrap();

        assert!(TcpStream::connect(addr).await.is_err());
    }
}
