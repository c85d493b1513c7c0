use crate::config::ConfigError;

/// Relay error types.
///
/// Everything here is fatal for node construction. Per-tick failures are
/// reported through [`crate::node::TickOutcome`] instead.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid topic '{topic}': {reason}")]
    InvalidTopic { topic: String, reason: String },

    #[error("Signal handler error: {0}")]
    Signal(String),

    #[error("Zenoh error: {0}")]
    Zenoh(String),
}

pub type Result<T> = std::result::Result<T, RelayError>;
