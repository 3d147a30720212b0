//! Image generation backends and on-disk image storage.
//!
//! - `ImageGenerator`: the one seam between the service and a provider.
//! - `openai`: OpenAI-compatible `/images/generations` client.
//! - `placeholder`: offline backend rendering a flat PNG.
//! - `storage`: writes generated bytes under the images directory.
use async_trait::async_trait;
use thiserror::Error;

use crate::config::GenerationOptions;

pub mod openai;
pub mod placeholder;
pub mod storage;

pub use openai::OpenAIImageClient;
pub use placeholder::PlaceholderGenerator;
pub use storage::ImageStorage;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("no API key configured for the image provider")]
    MissingCredentials,

    #[error("provider returned status {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("provider did not respond within {0}s")]
    Timeout(u64),

    #[error("malformed provider response: {0}")]
    MalformedResponse(String),

    #[error("request to provider failed: {0}")]
    Transport(reqwest::Error),

    #[error("failed to render image: {0}")]
    Render(String),
}

impl GenerationError {
    /// Short machine-readable cause, reported next to `generation_failed`.
    pub fn reason(&self) -> &'static str {
        match self {
            GenerationError::MissingCredentials => "configuration_error",
            GenerationError::Provider { .. } => "provider_error",
            GenerationError::Timeout(_) => "timeout",
            GenerationError::MalformedResponse(_) => "malformed_response",
            GenerationError::Transport(_) => "transport_error",
            GenerationError::Render(_) => "render_error",
        }
    }
}

/// Turns a finished prompt into image bytes. One call, one request; no
/// retries.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<Vec<u8>, GenerationError>;
}
