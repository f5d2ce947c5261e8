//! Sampler error types

use thiserror::Error;

/// Sampler error
#[derive(Debug, Error)]
pub enum SamplerError {
    /// OS refused to start the sampler thread
    #[error("failed to spawn sampler thread for '{sensor_id}': {source}")]
    SpawnFailed {
        sensor_id: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result alias
pub type Result<T> = std::result::Result<T, SamplerError>;
