use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use log::{debug, info, trace, warn};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncSeekExt, BufReader};
use tokio::time::sleep;

use super::types::{MAX_LINE_LEN, POLL_INTERVAL};
use crate::controller::shutdown::{ShutdownFlag, Trigger};
use crate::error_handling::types::MonitorError;
use crate::pattern_matching::Pattern;

/// Tails an append-only log file, starting at its end at open time.
#[derive(Debug)]
pub struct LogMonitor {
    path: PathBuf,
    reader: BufReader<File>,
    pending: Vec<u8>,
}

impl LogMonitor {
    /// Opens `path` and positions the read cursor at its current end, so
    /// content already present is never evaluated.
    pub async fn open(path: &Path) -> Result<Self, MonitorError> {
        let mut file = File::open(path)
            .await
            .map_err(|source| MonitorError::OpenFailed {
                path: path.to_path_buf(),
                source,
            })?;
        let offset = file
            .seek(SeekFrom::End(0))
            .await
            .map_err(MonitorError::SeekFailed)?;

        info!("Monitoring {} from offset {}", path.display(), offset);
        Ok(Self {
            path: path.to_path_buf(),
            reader: BufReader::new(file),
            pending: Vec::new(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Reads new lines until one triggers or `flag` is set elsewhere.
    ///
    /// Without a pattern any new line triggers. Trailing `\r`/`\n` are
    /// removed before matching.
    pub async fn run(mut self, pattern: Option<&Pattern>, flag: &ShutdownFlag) {
        let mut evaluated: u64 = 0;

        while !flag.is_set() {
            let line = match self.next_line().await {
                Some(line) => line,
                None => {
                    tokio::select! {
                        _ = sleep(POLL_INTERVAL) => continue,
                        _ = flag.wait() => break,
                    }
                }
            };
            evaluated += 1;

            let triggered = match pattern {
                Some(pattern) => pattern.is_match(&line[..]),
                None => true,
            };
            let text = String::from_utf8_lossy(&line).into_owned();
            trace!("New line in {}: {:?} (trigger: {})", self.path.display(), text, triggered);

            if triggered {
                info!("Trigger line in {}: {}", self.path.display(), text);
                flag.trigger(Trigger::LogMatch { line: text });
                break;
            }
        }

        debug!(
            "Stopped monitoring {} after {} new lines",
            self.path.display(),
            evaluated
        );
    }

    /// Next complete line with its line terminator stripped, or `None` when
    /// no complete line is available yet. Partial lines stay buffered, up to
    /// [`MAX_LINE_LEN`] bytes.
    async fn next_line(&mut self) -> Option<Vec<u8>> {
        let room = (MAX_LINE_LEN - self.pending.len()) as u64;
        let mut bounded = (&mut self.reader).take(room);

        match bounded.read_until(b'\n', &mut self.pending).await {
            Ok(_)
                if self.pending.last() == Some(&b'\n') || self.pending.len() >= MAX_LINE_LEN =>
            {
                let mut line = std::mem::take(&mut self.pending);
                while matches!(line.last(), Some(b'\n') | Some(b'\r')) {
                    line.pop();
                }
                Some(line)
            }
            Ok(_) => None,
            Err(e) => {
                warn!("Error reading {}: {}", self.path.display(), e);
                None
            }
        }
    }
}
