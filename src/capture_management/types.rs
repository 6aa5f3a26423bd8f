//! Core types used by the capture management subsystem.

use std::fmt;
use std::process::ExitStatus;
use std::time::Duration;

/// How long a capture group gets to exit after the graceful signal before it
/// is force-killed.
pub const DEFAULT_STOP_GRACE: Duration = Duration::from_millis(5000);

/// Status code the shell reports when the command itself could not be executed.
pub const EXEC_FAILED_CODE: i32 = 127;

/// Final state of a capture process once it has been reaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureExit {
    /// The command ran and exited on its own with this status code.
    Exited(i32),
    /// The shell started but the command could not be executed.
    ExecFailed,
    /// Terminated by a signal (the signal number, where the platform has one).
    Signaled(Option<i32>),
    /// Did not honour the graceful stop and was force-killed.
    Killed,
}

impl CaptureExit {
    pub fn from_status(status: ExitStatus) -> Self {
        match status.code() {
            Some(EXEC_FAILED_CODE) => CaptureExit::ExecFailed,
            Some(code) => CaptureExit::Exited(code),
            None => CaptureExit::Signaled(signal_of(&status)),
        }
    }
}

#[cfg(unix)]
fn signal_of(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn signal_of(_status: &ExitStatus) -> Option<i32> {
    None
}

impl fmt::Display for CaptureExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureExit::Exited(code) => write!(f, "exited with status {}", code),
            CaptureExit::ExecFailed => write!(f, "command could not be executed"),
            CaptureExit::Signaled(Some(sig)) => write!(f, "terminated by signal {}", sig),
            CaptureExit::Signaled(None) => write!(f, "terminated"),
            CaptureExit::Killed => write!(f, "force-killed after the grace period"),
        }
    }
}

/// Identity of the process group the capture command runs in.
///
/// The group leader is the shell that runs the command line; everything it
/// starts stays in the group, so one signal reaches the whole capture tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessGroup {
    pub leader: u32,
}

impl fmt::Display for ProcessGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.leader)
    }
}

/// Platform hooks for launching and signalling a capture process group.
///
/// Implemented once per target platform in `unix.rs` / `windows.rs`.
pub trait GroupControl {
    /// Builds the shell invocation that starts `command_line` as the leader
    /// of a new process group, inheriting this process's stdout and stderr.
    fn shell_command(command_line: &str) -> tokio::process::Command;

    /// Asks every process in the group to exit.
    fn terminate(&self) -> std::io::Result<()>;

    /// Unconditionally terminates every process in the group.
    fn kill(&self) -> std::io::Result<()>;
}
