use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    MalformedLine { line: usize, content: String },
    UnknownKey { line: usize, key: String },
    InvalidValue { line: usize, key: String, value: String },
    InvalidPattern { line: usize, source: PatternError },
    MissingKey(&'static str),
    RoleConflict(String),
    MonitorFileMissing(PathBuf),
    TomlError(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::MalformedLine { line, content } => {
                write!(f, "line {}: expected key=value, got '{}'", line, content)
            }
            ConfigError::UnknownKey { line, key } => write!(f, "line {}: unknown key '{}'", line, key),
            ConfigError::InvalidValue { line, key, value } => {
                write!(f, "line {}: invalid value '{}' for key '{}'", line, value, key)
            }
            ConfigError::InvalidPattern { line, source } => {
                write!(f, "line {}: invalid mon_pattern: {}", line, source)
            }
            ConfigError::MissingKey(key) => write!(f, "missing required key '{}'", key),
            ConfigError::RoleConflict(e) => write!(f, "Role selection error: {}", e),
            ConfigError::MonitorFileMissing(path) => {
                write!(f, "monitored file does not exist: {}", path.display())
            }
            ConfigError::TomlError(e) => write!(f, "TOML rendering error: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::IoError(e) => Some(e),
            ConfigError::InvalidPattern { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::IoError(err)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    TrailingBackslash { position: usize },
    UnterminatedClass { position: usize },
    DanglingClassEscape { position: usize },
    ClassBufferExhausted { limit: usize },
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternError::TrailingBackslash { position } => {
                write!(f, "trailing backslash at offset {}", position)
            }
            PatternError::UnterminatedClass { position } => {
                write!(f, "character class opened at offset {} is not terminated", position)
            }
            PatternError::DanglingClassEscape { position } => {
                write!(f, "escape at offset {} has no character to escape", position)
            }
            PatternError::ClassBufferExhausted { limit } => {
                write!(f, "character classes exceed the {} byte limit", limit)
            }
        }
    }
}

impl std::error::Error for PatternError {}

#[derive(Debug)]
pub enum NetworkError {
    BindError(std::io::Error),
    AcceptFailed(std::io::Error),
    ConnectionFailed(std::io::Error),
    SockError(std::io::Error),
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkError::BindError(e) => write!(f, "Network bind error: {}", e),
            NetworkError::AcceptFailed(e) => write!(f, "Accepting the peer failed: {}", e),
            NetworkError::ConnectionFailed(e) => write!(f, "Connection to peer failed: {}", e),
            NetworkError::SockError(e) => write!(f, "Socket error: {}", e),
        }
    }
}

impl std::error::Error for NetworkError {}

#[derive(Debug)]
pub enum CaptureError {
    SpawnFailed(std::io::Error),
    SignalFailed(std::io::Error),
    WaitFailed(std::io::Error),
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureError::SpawnFailed(e) => write!(f, "Capture command could not be started: {}", e),
            CaptureError::SignalFailed(e) => write!(f, "Signalling the capture group failed: {}", e),
            CaptureError::WaitFailed(e) => write!(f, "Waiting for the capture process failed: {}", e),
        }
    }
}

impl std::error::Error for CaptureError {}

#[derive(Debug)]
pub enum MonitorError {
    OpenFailed { path: PathBuf, source: std::io::Error },
    SeekFailed(std::io::Error),
}

impl fmt::Display for MonitorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonitorError::OpenFailed { path, source } => {
                write!(f, "Unable to open {}: {}", path.display(), source)
            }
            MonitorError::SeekFailed(e) => write!(f, "Unable to seek to end of file: {}", e),
        }
    }
}

impl std::error::Error for MonitorError {}

#[derive(Debug)]
pub enum ControllerError {
    ConfigurationError(ConfigError),
    NetworkError(NetworkError),
    CaptureError(CaptureError),
    MonitorError(MonitorError),
    TaskFailed(String),
    Interrupted,
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerError::ConfigurationError(e) => write!(f, "Configuration error: {}", e),
            ControllerError::NetworkError(e) => write!(f, "Network error: {}", e),
            ControllerError::CaptureError(e) => write!(f, "Capture error: {}", e),
            ControllerError::MonitorError(e) => write!(f, "Monitor error: {}", e),
            ControllerError::TaskFailed(e) => write!(f, "Monitor task failed: {}", e),
            ControllerError::Interrupted => write!(f, "Interrupted by operator"),
        }
    }
}

impl std::error::Error for ControllerError {}

impl From<ConfigError> for ControllerError {
    fn from(err: ConfigError) -> Self {
        ControllerError::ConfigurationError(err)
    }
}

impl From<NetworkError> for ControllerError {
    fn from(err: NetworkError) -> Self {
        ControllerError::NetworkError(err)
    }
}

impl From<CaptureError> for ControllerError {
    fn from(err: CaptureError) -> Self {
        ControllerError::CaptureError(err)
    }
}

impl From<MonitorError> for ControllerError {
    fn from(err: MonitorError) -> Self {
        ControllerError::MonitorError(err)
    }
}
