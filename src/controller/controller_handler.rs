use super::shutdown::{ShutdownFlag, Trigger};
use super::types::SessionReport;
use crate::capture_management::{CaptureProcess, GroupControl, ProcessGroup};
use crate::configuration::config::Config;
use crate::error_handling::types::*;
use crate::log_monitoring::LogMonitor;
use crate::network::PeerChannel;
use crate::pattern_matching::Pattern;
use chrono::Utc;
use log::{debug, error, info, warn};
use std::future::Future;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use uuid::Uuid;

/// Top-level supervisor for one capture session.
///
/// Owns the capture process for its whole life and sequences the run:
/// capture start, rendezvous, concurrent monitoring, capture stop.
pub struct Controller {
    session_id: Uuid,
    config: Config,
}

impl Controller {
    pub fn new(config: Config) -> Self {
        let session_id = Uuid::new_v4();
        info!("[{}] Controller created ({})", session_id, config.role);
        Self { session_id, config }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs the session to completion with no external interrupt.
    pub async fn run(&self) -> Result<SessionReport, ControllerError> {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Runs the session, aborting as soon as `interrupt` completes.
    ///
    /// On interrupt the capture group is killed immediately, skipping linger
    /// and grace, and [`ControllerError::Interrupted`] is returned.
    pub async fn run_until<F>(&self, interrupt: F) -> Result<SessionReport, ControllerError>
    where
        F: Future<Output = ()>,
    {
        let id = self.session_id;
        let started_at = Utc::now();
        tokio::pin!(interrupt);

        let mut capture = match &self.config.capture_command {
            Some(command) => Some(CaptureProcess::spawn_with_grace(
                command,
                self.config.capture_stop_grace,
            )?),
            None => {
                info!("[{}] No capture command configured", id);
                None
            }
        };
        let group = capture.as_ref().map(|c| c.group());

        let outcome = tokio::select! {
            outcome = self.monitor_session() => outcome,
            _ = &mut interrupt => return Err(self.abort(group)),
        };

        let trigger = match outcome {
            Ok(trigger) => trigger,
            Err(err) => {
                debug!("[{}] Session failed: {}", id, err);
                if let Some(capture) = capture.as_mut() {
                    info!("[{}] Stopping capture after failed session", id);
                    let stopped = tokio::select! {
                        stopped = capture.stop(Duration::ZERO) => stopped,
                        _ = &mut interrupt => return Err(self.abort(group)),
                    };
                    if let Err(stop_err) = stopped {
                        warn!("[{}] Unable to stop capture: {}", id, stop_err);
                    }
                }
                return Err(err);
            }
        };

        let stop_decided_at = Utc::now();
        info!("[{}] Stop decided: {}", id, trigger);

        let capture_exit = match capture.as_mut() {
            Some(capture) => {
                let exit = tokio::select! {
                    exit = capture.stop(self.config.capture_linger) => exit?,
                    _ = &mut interrupt => return Err(self.abort(group)),
                };
                Some(exit)
            }
            None => None,
        };

        let report = SessionReport {
            session_id: id,
            role: self.config.role,
            started_at,
            stop_decided_at,
            finished_at: Utc::now(),
            trigger,
            capture: capture_exit,
        };
        info!("[{}] Session complete: {}", id, report);
        Ok(report)
    }

    /// Rendezvous with the peer, open the log, and run both loops to a stop decision.
    async fn monitor_session(&self) -> Result<Trigger, ControllerError> {
        let channel = PeerChannel::connect(&self.config.role).await?;
        let monitor = LogMonitor::open(&self.config.monitor_file).await?;

        info!("[{}] Monitoring started", self.session_id);
        converge(channel, monitor, self.config.monitor_pattern.clone()).await
    }

    fn abort(&self, group: Option<ProcessGroup>) -> ControllerError {
        warn!("[{}] Interrupted, terminating capture immediately", self.session_id);
        if let Some(group) = group {
            if let Err(err) = group.kill() {
                error!(
                    "[{}] Unable to kill capture group {}: {}",
                    self.session_id, group, err
                );
            }
        }
        ControllerError::Interrupted
    }
}

/// Runs the peer loop and the file loop as separate tasks until both exit.
///
/// Whichever loop decides first sets the shared flag; the other observes it
/// and exits. Returns the first recorded cause.
pub async fn converge<S>(
    channel: PeerChannel<S>,
    monitor: LogMonitor,
    pattern: Option<Pattern>,
) -> Result<Trigger, ControllerError>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let flag = ShutdownFlag::new();
    // Dropping this future (interrupt) must still release both loops.
    let _release = ReleaseOnDrop(flag.clone());

    let peer_task = {
        let flag = flag.clone();
        tokio::spawn(async move { channel.run(&flag).await })
    };
    let file_task = {
        let flag = flag.clone();
        tokio::spawn(async move { monitor.run(pattern.as_ref(), &flag).await })
    };

    let (peer, file) = tokio::join!(peer_task, file_task);
    peer.map_err(|e| ControllerError::TaskFailed(format!("peer loop: {}", e)))?;
    file.map_err(|e| ControllerError::TaskFailed(format!("file loop: {}", e)))?;

    debug!("Both monitor loops exited");
    flag.cause().ok_or_else(|| {
        ControllerError::TaskFailed("monitor loops exited without a stop decision".to_string())
    })
}

struct ReleaseOnDrop(ShutdownFlag);

impl Drop for ReleaseOnDrop {
    fn drop(&mut self) {
        self.0.trigger(Trigger::Interrupted);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configuration::types::Role;
    use crate::network::EXIT_TOKEN;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;
    use tokio_test::io::Builder;

    fn listener_config(log: &NamedTempFile) -> Config {
        Config {
            role: Role::Listener { port: 0 },
            monitor_file: log.path().to_path_buf(),
            capture_command: None,
            capture_linger: Duration::ZERO,
            capture_stop_grace: Duration::from_secs(1),
            monitor_pattern: None,
        }
    }

    #[test]
    fn test_new_assigns_session_id() {
        let log = NamedTempFile::new().unwrap();
        let a = Controller::new(listener_config(&log));
        let b = Controller::new(listener_config(&log));
        assert_ne!(a.session_id(), b.session_id());
        assert_eq!(a.config().role, Role::Listener { port: 0 });
    }

    #[tokio::test]
    async fn test_converge_on_peer_signal() {
        let log = NamedTempFile::new().unwrap();
        let monitor = LogMonitor::open(log.path()).await.unwrap();
        let stream = Builder::new().read(b"x").write(EXIT_TOKEN).build();

        let trigger = tokio::time::timeout(
            Duration::from_secs(2),
            converge(PeerChannel::new(stream, "mock"), monitor, None),
        )
        .await
        .unwrap()
        .unwrap();

        assert_eq!(trigger, Trigger::PeerData);
    }

    #[tokio::test]
    async fn test_converge_on_log_match() {
        let log = NamedTempFile::new().unwrap();
        let monitor = LogMonitor::open(log.path()).await.unwrap();
        let stream = Builder::new().write(EXIT_TOKEN).build();
        let pattern = Pattern::compile("^STOP").ok();

        let path = log.path().to_path_buf();
        let writer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            let mut file = std::fs::OpenOptions::new().append(true).open(path).unwrap();
            file.write_all(b"keep going\nSTOP now\n").unwrap();
        });

        let trigger = tokio::time::timeout(
            Duration::from_secs(2),
            converge(PeerChannel::new(stream, "mock"), monitor, pattern),
        )
        .await
        .unwrap()
        .unwrap();
        writer.await.unwrap();

        assert_eq!(
            trigger,
            Trigger::LogMatch {
                line: "STOP now".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_dropped_converge_releases_both_loops() {
        use tokio::io::AsyncReadExt;
        use tokio::net::TcpStream;

        let log = NamedTempFile::new().unwrap();
        let monitor = LogMonitor::open(log.path()).await.unwrap();
        let listener = PeerChannel::listen("127.0.0.1:0".parse().unwrap()).unwrap();
        let addr = listener.local_addr().unwrap();
        let (channel, remote) = tokio::join!(PeerChannel::accept(listener), TcpStream::connect(addr));
        let mut remote = remote.unwrap();

        let abandoned = tokio::time::timeout(
            Duration::from_millis(200),
            converge(channel.unwrap(), monitor, None),
        )
        .await;
        assert!(abandoned.is_err());

        // The peer loop only writes the token and closes once it has been released.
        let mut received = Vec::new();
        tokio::time::timeout(Duration::from_secs(2), remote.read_to_end(&mut received))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(received, EXIT_TOKEN);
    }
}
