use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),

    #[error("API error ({0}): {1}")]
    Api(u16, String),

    #[error("parse error: {0}")]
    Parse(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid CERBERO_GUARD_INTERVAL_SECS '{0}'")]
    Interval(String),
}
