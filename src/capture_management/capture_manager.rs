use std::process::Stdio;
use std::time::{Duration, Instant};

use log::{debug, error, info, warn};
use tokio::process::Child;
use tokio::time::{sleep, timeout};

use crate::capture_management::types::{CaptureExit, GroupControl, ProcessGroup, DEFAULT_STOP_GRACE};
use crate::error_handling::types::CaptureError;

/// A running capture command and the process group it leads.
///
/// The capture is started before the peers rendezvous so that it is already
/// recording when traffic begins. It is stopped in two phases: a graceful
/// signal to the whole group, then a forced kill if the group is still alive
/// after the grace period.
#[derive(Debug)]
pub struct CaptureProcess {
    command_line: String,
    child: Child,
    group: ProcessGroup,
    grace: Duration,
    running: bool,
}

impl CaptureProcess {
    /// Starts `command_line` through the platform shell with the default grace period.
    pub fn spawn(command_line: &str) -> Result<Self, CaptureError> {
        Self::spawn_with_grace(command_line, DEFAULT_STOP_GRACE)
    }

    /// Starts `command_line` in a new process group.
    ///
    /// Stdout and stderr are inherited so the capture tool's diagnostics stay
    /// visible. Failing to launch the shell is an error; a command the shell
    /// cannot execute shows up later as [`CaptureExit::ExecFailed`].
    pub fn spawn_with_grace(command_line: &str, grace: Duration) -> Result<Self, CaptureError> {
        info!("Starting capture command: {}", command_line);

        let mut cmd = ProcessGroup::shell_command(command_line);
        cmd.stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(false);

        let child = cmd.spawn().map_err(|e| {
            error!("Failed to spawn capture command '{}': {}", command_line, e);
            CaptureError::SpawnFailed(e)
        })?;

        // `id()` is only `None` once the child has been reaped.
        let leader = child.id().ok_or_else(|| {
            CaptureError::SpawnFailed(std::io::Error::new(
                std::io::ErrorKind::Other,
                "capture process exited before its id could be read",
            ))
        })?;
        let group = ProcessGroup { leader };

        debug!("Capture command running as process group {}", group);
        Ok(Self {
            command_line: command_line.to_string(),
            child,
            group,
            grace,
            running: true,
        })
    }

    pub fn command_line(&self) -> &str {
        &self.command_line
    }

    /// Identity used for group-wide signalling, including the interrupt path.
    pub fn group(&self) -> ProcessGroup {
        self.group
    }

    pub fn grace(&self) -> Duration {
        self.grace
    }

    /// Polls the child without blocking; `false` once it has exited for any reason.
    pub fn is_running(&mut self) -> bool {
        if self.running {
            match self.child.try_wait() {
                Ok(Some(status)) => {
                    debug!("Capture process {} exited: {}", self.group, status);
                    self.running = false;
                }
                Ok(None) => {}
                Err(e) => warn!("Unable to poll capture process {}: {}", self.group, e),
            }
        }
        self.running
    }

    /// Stops the capture: optional linger, graceful signal, bounded wait, forced kill.
    pub async fn stop(&mut self, linger: Duration) -> Result<CaptureExit, CaptureError> {
        if !linger.is_zero() {
            info!(
                "Letting capture linger for {} ms before stopping",
                linger.as_millis()
            );
            sleep(linger).await;
        }

        if let Some(status) = self.child.try_wait().map_err(CaptureError::WaitFailed)? {
            self.running = false;
            let exit = CaptureExit::from_status(status);
            info!("Capture process had already stopped: {}", exit);
            return Ok(exit);
        }

        debug!("Sending graceful termination to capture group {}", self.group);
        if let Err(e) = self.group.terminate() {
            warn!(
                "Graceful termination of capture group {} failed: {}",
                self.group, e
            );
        }

        let started = Instant::now();
        match timeout(self.grace, self.child.wait()).await {
            Ok(status) => {
                let status = status.map_err(CaptureError::WaitFailed)?;
                self.running = false;
                let exit = CaptureExit::from_status(status);
                info!(
                    "Capture stopped after {} ms: {}",
                    started.elapsed().as_millis(),
                    exit
                );
                Ok(exit)
            }
            Err(_) => {
                warn!(
                    "Capture group {} ignored graceful shutdown for {} ms, killing it",
                    self.group,
                    self.grace.as_millis()
                );
                self.force_kill().await?;
                Ok(CaptureExit::Killed)
            }
        }
    }

    /// Waits for the capture to exit on its own.
    pub async fn wait(&mut self) -> Result<CaptureExit, CaptureError> {
        let status = self.child.wait().await.map_err(CaptureError::WaitFailed)?;
        self.running = false;
        Ok(CaptureExit::from_status(status))
    }

    async fn force_kill(&mut self) -> Result<(), CaptureError> {
        if let Err(e) = self.group.kill() {
            warn!("Killing capture group {} failed: {}", self.group, e);
            // Fall back to the leader alone so the wait below cannot hang.
            self.child.start_kill().map_err(CaptureError::SignalFailed)?;
        }
        self.child.wait().await.map_err(CaptureError::WaitFailed)?;
        self.running = false;
        Ok(())
    }
}
