use log::debug;
use std::fmt;
use std::sync::Arc;
use tokio::sync::watch;

/// What caused the session to end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// A new line in the monitored file satisfied the trigger condition.
    LogMatch { line: String },
    /// The peer sent data over the coordination channel.
    PeerData,
    /// The coordination channel was closed or failed.
    PeerClosed,
    /// The session was abandoned before either loop decided.
    Interrupted,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::LogMatch { line } => write!(f, "log match: {}", line),
            Trigger::PeerData => write!(f, "stop signal from peer"),
            Trigger::PeerClosed => write!(f, "peer channel closed"),
            Trigger::Interrupted => write!(f, "interrupted"),
        }
    }
}

/// One-way "stop now" flag shared by the monitor loops.
///
/// Transitions from clear to set exactly once; every later `trigger` is a
/// no-op and the first cause is kept. Waiters are woken when it is set.
#[derive(Debug, Clone)]
pub struct ShutdownFlag {
    state: Arc<watch::Sender<Option<Trigger>>>,
}

impl Default for ShutdownFlag {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownFlag {
    pub fn new() -> Self {
        let (state, _) = watch::channel(None);
        Self {
            state: Arc::new(state),
        }
    }

    /// Sets the flag. Returns `true` only for the call that actually set it.
    pub fn trigger(&self, cause: Trigger) -> bool {
        let set = self.state.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(cause.clone());
            true
        });
        if set {
            debug!("Shutdown flag set ({})", cause);
        }
        set
    }

    pub fn is_set(&self) -> bool {
        self.state.borrow().is_some()
    }

    /// The cause recorded by the first successful `trigger`.
    pub fn cause(&self) -> Option<Trigger> {
        self.state.borrow().clone()
    }

    /// Resolves once the flag is set; immediately if it already is.
    pub async fn wait(&self) {
        let mut rx = self.state.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|cause| cause.is_some()).await;
    }
}
