use super::shutdown::Trigger;
use crate::capture_management::CaptureExit;
use crate::configuration::types::Role;
use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

/// Summary of one completed capture session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionReport {
    pub session_id: Uuid,
    pub role: Role,
    pub started_at: DateTime<Utc>,
    pub stop_decided_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub trigger: Trigger,
    /// `None` when no capture command was configured.
    pub capture: Option<CaptureExit>,
}

impl SessionReport {
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }
}

impl fmt::Display for SessionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "session {} as {}: started {}, stop decided {}, finished {} ({} ms), trigger: {}, capture: ",
            self.session_id,
            self.role,
            self.started_at.to_rfc3339(),
            self.stop_decided_at.to_rfc3339(),
            self.finished_at.to_rfc3339(),
            self.duration().num_milliseconds(),
            self.trigger,
        )?;
        match &self.capture {
            Some(exit) => write!(f, "{}", exit),
            None => write!(f, "not configured"),
        }
    }
}
