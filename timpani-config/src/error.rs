use thiserror::Error;

/// Result alias used throughout `timpani-config`.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading or validating configuration. Maps onto the
/// `Config`/`Io` kinds of the system-wide taxonomy (spec §7).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io { path: String, #[source] source: std::io::Error },

    #[error("failed to parse {path} as YAML: {source}")]
    Parse { path: String, #[source] source: serde_yaml::Error },

    #[error("invalid value for {var}: {value:?}")]
    InvalidEnvValue { var: String, value: String },

    #[error("{0}")]
    Validation(String),
}
