use std::io;
use std::process::Stdio;

use tokio::process::Command;
use ::windows::Win32::System::Console::{GenerateConsoleCtrlEvent, CTRL_BREAK_EVENT};

use super::types::{GroupControl, ProcessGroup};

const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;

impl GroupControl for ProcessGroup {
    fn shell_command(command_line: &str) -> Command {
        let mut cmd = Command::new("cmd");
        cmd.arg("/C")
            .raw_arg(command_line)
            .creation_flags(CREATE_NEW_PROCESS_GROUP);
        cmd
    }

    /// Sends CTRL_BREAK to the group. CTRL_C is disabled for processes
    /// started with `CREATE_NEW_PROCESS_GROUP`, so break is the only console
    /// event that reaches them.
    fn terminate(&self) -> io::Result<()> {
        unsafe { GenerateConsoleCtrlEvent(CTRL_BREAK_EVENT, self.leader) }
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))
    }

    /// Starts `taskkill /F /T` for the whole tree without waiting on it; the
    /// caller waits on the capture process itself.
    fn kill(&self) -> io::Result<()> {
        std::process::Command::new("taskkill")
            .args(["/F", "/T", "/PID"])
            .arg(self.leader.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map(drop)
    }
}
