//! Errors of the replay tool.

use drawscope_core::DecodeError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Config(#[from] toml::de::Error),

    #[error("cannot render config: {0}")]
    ConfigWrite(#[from] toml::ser::Error),

    #[error("JSON output failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Stream framing or database snapshot failure.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("cycle {index}: {source}")]
    Cycle {
        index: usize,
        #[source]
        source: DecodeError,
    },
}
