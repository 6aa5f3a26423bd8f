use super::types::*;
use crate::capture_management::DEFAULT_STOP_GRACE;
use crate::error_handling::types::ConfigError;
use crate::pattern_matching::Pattern;
use log::debug;
use std::net::SocketAddrV4;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Validated, immutable run configuration.
///
/// Built once at startup from a `key=value` file and shared read-only by every
/// component afterwards.
///
/// # File format
///
/// ```text
/// # initiator side
/// init_ip=10.0.0.2
/// init_port=12000
/// mon_file=/var/log/app.log
/// mon_pattern=ERROR.*timeout
/// cap_cmd=tcpdump -i eth0 -w side_a.pcap
/// cap_linger_ms=500
/// ```
///
/// Recognised keys: `init_ip`, `init_port`, `listen_port`, `mon_file`,
/// `cap_cmd`, `cap_linger_ms`, `cap_stop_grace_ms`, `mon_pattern`. Blank lines
/// and lines starting with `#` are ignored. Values are taken verbatim after
/// the first `=`.
///
/// # Fields Overview
///
/// - `role`: initiator (`init_ip` + `init_port`) or listener (`listen_port`)
/// - `monitor_file`: the append-only log to watch; must exist
/// - `capture_command`: shell command line to run for the whole session
/// - `capture_linger`: delay between the stop decision and signalling the capture
/// - `capture_stop_grace`: how long the capture gets to exit before it is killed
/// - `monitor_pattern`: trigger pattern; `None` means any new line triggers
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub role: Role,
    pub monitor_file: PathBuf,
    pub capture_command: Option<String>,
    pub capture_linger: Duration,
    pub capture_stop_grace: Duration,
    pub monitor_pattern: Option<Pattern>,
}

impl Config {
    /// Reads and validates the configuration file at `path`.
    pub fn from_file(path: &Path) -> Result<Config, ConfigError> {
        debug!("Reading configuration from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Config::parse(&content)
    }

    /// Parses and validates configuration file contents.
    pub fn parse(content: &str) -> Result<Config, ConfigError> {
        let (raw, pattern) = parse_lines(content)?;
        Config::validate(raw, pattern)
    }

    fn validate(raw: RawConfig, monitor_pattern: Option<Pattern>) -> Result<Config, ConfigError> {
        let role = match (raw.init_ip, raw.init_port, raw.listen_port) {
            (Some(ip), Some(port), None) => Role::Initiator {
                peer: SocketAddrV4::new(ip, port),
            },
            (None, None, Some(port)) => Role::Listener { port },
            (Some(_), _, Some(_)) => {
                return Err(ConfigError::RoleConflict(
                    "init_ip and listen_port are mutually exclusive".to_string(),
                ))
            }
            (None, _, None) => {
                return Err(ConfigError::RoleConflict(
                    "one of init_ip or listen_port is required".to_string(),
                ))
            }
            (Some(_), None, None) => {
                return Err(ConfigError::RoleConflict(
                    "init_ip requires init_port".to_string(),
                ))
            }
            (None, Some(_), Some(_)) => {
                return Err(ConfigError::RoleConflict(
                    "init_port is only valid together with init_ip".to_string(),
                ))
            }
        };

        let monitor_file = raw.mon_file.ok_or(ConfigError::MissingKey("mon_file"))?;
        if !monitor_file.exists() {
            return Err(ConfigError::MonitorFileMissing(monitor_file));
        }

        Ok(Config {
            role,
            monitor_file,
            capture_command: raw.cap_cmd,
            capture_linger: Duration::from_millis(raw.cap_linger_ms.unwrap_or(0)),
            capture_stop_grace: raw
                .cap_stop_grace_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_STOP_GRACE),
            monitor_pattern,
        })
    }

    /// Normalised view of this configuration, keyed like the input file.
    pub fn to_raw(&self) -> RawConfig {
        let (init_ip, init_port, listen_port) = match self.role {
            Role::Initiator { peer } => (Some(*peer.ip()), Some(peer.port()), None),
            Role::Listener { port } => (None, None, Some(port)),
        };

        RawConfig {
            init_ip,
            init_port,
            listen_port,
            mon_file: Some(self.monitor_file.clone()),
            cap_cmd: self.capture_command.clone(),
            cap_linger_ms: Some(self.capture_linger.as_millis() as u64),
            cap_stop_grace_ms: Some(self.capture_stop_grace.as_millis() as u64),
            mon_pattern: self.monitor_pattern.as_ref().map(|p| p.as_str().to_string()),
        }
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string(&self.to_raw()).map_err(|e| ConfigError::TomlError(e.to_string()))
    }
}

fn parse_lines(content: &str) -> Result<(RawConfig, Option<Pattern>), ConfigError> {
    let mut raw = RawConfig::default();
    let mut pattern = None;

    for (index, line) in content.lines().enumerate() {
        let line_no = index + 1;
        let line = line.strip_suffix('\r').unwrap_or(line);

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let (key, value) = line.split_once('=').ok_or_else(|| ConfigError::MalformedLine {
            line: line_no,
            content: line.to_string(),
        })?;

        let invalid = || ConfigError::InvalidValue {
            line: line_no,
            key: key.to_string(),
            value: value.to_string(),
        };

        match key {
            "init_ip" => raw.init_ip = Some(value.parse().map_err(|_| invalid())?),
            "init_port" => raw.init_port = Some(parse_port(value).ok_or_else(invalid)?),
            "listen_port" => raw.listen_port = Some(parse_port(value).ok_or_else(invalid)?),
            "mon_file" => raw.mon_file = Some(PathBuf::from(value)),
            "cap_cmd" => raw.cap_cmd = Some(value.to_string()),
            "cap_linger_ms" => raw.cap_linger_ms = Some(value.parse().map_err(|_| invalid())?),
            "cap_stop_grace_ms" => {
                raw.cap_stop_grace_ms = Some(value.parse().map_err(|_| invalid())?)
            }
            "mon_pattern" => {
                let compiled = Pattern::compile(value).map_err(|source| {
                    ConfigError::InvalidPattern {
                        line: line_no,
                        source,
                    }
                })?;
                raw.mon_pattern = Some(value.to_string());
                pattern = Some(compiled);
            }
            _ => {
                return Err(ConfigError::UnknownKey {
                    line: line_no,
                    key: key.to_string(),
                })
            }
        }
    }

    Ok((raw, pattern))
}

fn parse_port(value: &str) -> Option<u16> {
    value.parse::<u16>().ok().filter(|port| *port > 0)
}
