use std::path::PathBuf;
use thiserror::Error;

/// Validation failures raised while assembling a dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("invalid dashboard name \"{0}\": expected 1-75 characters from [a-zA-Z0-9_.-]")]
    InvalidName(String),
    #[error("dashboard \"{dashboard}\": invalid project name \"{project}\": expected 1-75 characters from [a-zA-Z0-9_.-]")]
    InvalidProject { dashboard: String, project: String },
    #[error("dashboard \"{0}\": display name is empty")]
    MissingDisplayName(String),
    #[error("dashboard \"{dashboard}\": invalid duration \"{duration}\"")]
    InvalidDuration { dashboard: String, duration: String },
    #[error("dashboard \"{dashboard}\": variable \"{variable}\" is defined more than once")]
    DuplicateVariable { dashboard: String, variable: String },
    #[error("dashboard \"{dashboard}\": panel group \"{group}\" has no panels")]
    EmptyGroup { dashboard: String, group: String },
    #[error("dashboard \"{dashboard}\": panel group \"{group}\" has {per_line} panels per line, expected 1-24")]
    InvalidPanelsPerLine {
        dashboard: String,
        group: String,
        per_line: u32,
    },
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("invalid project name \"{0}\": expected 1-75 characters from [a-zA-Z0-9_.-]")]
    InvalidProject(String),
    #[error("invalid cluster label name \"{0}\": expected [a-zA-Z_][a-zA-Z0-9_]*")]
    InvalidClusterLabel(String),
    #[error("invalid duration \"{0}\": expected a non-zero duration such as 1h, 30m or 1d12h")]
    InvalidDuration(String),
    #[error("unknown component \"{0}\"")]
    UnknownComponent(String),
    #[error("unknown output format \"{0}\": expected json or operator")]
    UnknownOutput(String),
    #[error("{0} must not be empty")]
    Empty(&'static str),
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to serialize dashboard \"{name}\": {source}")]
    Serialize {
        name: String,
        source: serde_json::Error,
    },
    #[error("{0} dashboard(s) failed to build")]
    Build(usize),
}
