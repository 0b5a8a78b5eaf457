use thiserror::Error;

/// Every error kind this crate surfaces, per the propagation policy: errors
/// are never recovered at strategy or walker level, only reported upward.
#[derive(Debug, Error)]
pub enum GopiumError {
    #[error("context canceled")]
    Cancellation,

    #[error("malformed tag: {0}")]
    MalformedTag(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl From<std::io::Error> for GopiumError {
    fn from(e: std::io::Error) -> Self {
        GopiumError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for GopiumError {
    fn from(e: serde_json::Error) -> Self {
        GopiumError::Io(e.to_string())
    }
}

impl From<csv::Error> for GopiumError {
    fn from(e: csv::Error) -> Self {
        GopiumError::Io(e.to_string())
    }
}
