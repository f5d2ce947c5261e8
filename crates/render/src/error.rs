//! Render error types

use contracts::ContractError;
use thiserror::Error;

/// Render error
#[derive(Debug, Error)]
pub enum RenderError {
    /// Renderer could not be set up
    #[error("failed to create renderer '{renderer}': {message}")]
    CreateFailed { renderer: String, message: String },

    /// Invalid renderer parameter
    #[error("renderer '{renderer}' has invalid param '{param}': {message}")]
    InvalidParam {
        renderer: String,
        param: String,
        message: String,
    },

    /// Output could not be written
    #[error("renderer '{renderer}' write failed: {source}")]
    Write {
        renderer: String,
        #[source]
        source: std::io::Error,
    },
}

impl RenderError {
    pub fn create(renderer: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CreateFailed {
            renderer: renderer.into(),
            message: message.into(),
        }
    }

    pub fn invalid_param(
        renderer: impl Into<String>,
        param: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidParam {
            renderer: renderer.into(),
            param: param.into(),
            message: message.into(),
        }
    }

    pub fn write(renderer: impl Into<String>, source: std::io::Error) -> Self {
        Self::Write {
            renderer: renderer.into(),
            source,
        }
    }
}

impl From<RenderError> for ContractError {
    fn from(e: RenderError) -> Self {
        let renderer = match &e {
            RenderError::CreateFailed { renderer, .. }
            | RenderError::InvalidParam { renderer, .. }
            | RenderError::Write { renderer, .. } => renderer.clone(),
        };
        ContractError::render(renderer, e.to_string())
    }
}

/// Result alias
pub type Result<T> = std::result::Result<T, RenderError>;
