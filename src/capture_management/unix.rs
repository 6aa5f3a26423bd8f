use std::io;

use tokio::process::Command;

use super::types::{GroupControl, ProcessGroup};

impl ProcessGroup {
    fn signal(&self, signal: libc::c_int) -> io::Result<()> {
        let pgid = self.leader as libc::pid_t;
        // A negative pid addresses the whole process group.
        let rc = unsafe { libc::kill(-pgid, signal) };
        if rc == 0 {
            return Ok(());
        }

        let err = io::Error::last_os_error();
        if err.raw_os_error() == Some(libc::ESRCH) {
            // Group already gone.
            return Ok(());
        }
        Err(err)
    }
}

impl GroupControl for ProcessGroup {
    fn shell_command(command_line: &str) -> Command {
        let mut cmd = Command::new("/bin/sh");
        cmd.arg("-c").arg(command_line).process_group(0);
        cmd
    }

    fn terminate(&self) -> io::Result<()> {
        self.signal(libc::SIGTERM)
    }

    fn kill(&self) -> io::Result<()> {
        self.signal(libc::SIGKILL)
    }
}
