//! Env-driven configuration for the service and library.
//!
//! Values are read from the process environment; `dotenv` is loaded on demand
//! by the binaries. Defaults are provided for convenience during development.
//! The provider credential is optional here and only checked when an image is
//! actually requested.
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{AppError, AppResult};

pub const DEFAULT_API_PORT: u16 = 8000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Which `ImageGenerator` backend the service wires up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageProvider {
    OpenAI,
    Placeholder,
}

impl ImageProvider {
    pub fn parse(name: &str) -> AppResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(ImageProvider::OpenAI),
            "placeholder" => Ok(ImageProvider::Placeholder),
            other => Err(AppError::Configuration(format!(
                "Unknown IMAGE_PROVIDER '{}', expected 'openai' or 'placeholder'",
                other
            ))),
        }
    }
}

/// Options handed to every `ImageGenerator::generate` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationOptions {
    pub model: String,
    /// `WIDTHxHEIGHT`, e.g. `1024x1024`.
    pub size: String,
    pub timeout_secs: u64,
}

impl GenerationOptions {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Parse `size` into pixel dimensions.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        let (w, h) = self.size.trim().split_once(|c: char| c == 'x' || c == 'X')?;
        let w = w.trim().parse().ok()?;
        let h = h.trim().parse().ok()?;
        if w == 0 || h == 0 {
            return None;
        }
        Some((w, h))
    }
}

impl Default for GenerationOptions {
    fn default() -> Self {
        GenerationOptions {
            model: "gpt-image-1".to_string(),
            size: "1024x1024".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_host: String,
    pub api_port: u16,
    pub database_path: PathBuf,
    pub images_dir: PathBuf,
    pub context_path: PathBuf,
    pub image_provider: ImageProvider,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub generation: GenerationOptions,
}

impl Config {
    pub fn dotenv_load() {
        dotenv::dotenv().ok();
    }

    pub fn new() -> AppResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup; `new` passes the process
    /// environment.
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let data_dir = PathBuf::from(var("DATA_DIR", "./data"));
        let database_path = lookup("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("sayings.db"));
        let images_dir = lookup("IMAGES_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("images"));

        let port_str = var("API_PORT", &DEFAULT_API_PORT.to_string());
        let api_port = port_str.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid API_PORT '{}', falling back to {}", port_str, DEFAULT_API_PORT);
            DEFAULT_API_PORT
        });
        let timeout_str = var("IMAGE_TIMEOUT_SECS", &DEFAULT_TIMEOUT_SECS.to_string());
        let timeout_secs = match timeout_str.parse::<u64>() {
            Ok(secs) if secs > 0 => secs,
            _ => {
                tracing::warn!(
                    "Invalid IMAGE_TIMEOUT_SECS '{}', falling back to {}",
                    timeout_str,
                    DEFAULT_TIMEOUT_SECS
                );
                DEFAULT_TIMEOUT_SECS
            }
        };

        let defaults = GenerationOptions::default();
        Ok(Config {
            api_host: var("API_HOST", "127.0.0.1"),
            api_port,
            database_path,
            images_dir,
            context_path: PathBuf::from(var("CONTEXT_PATH", "./context.md")),
            image_provider: ImageProvider::parse(&var("IMAGE_PROVIDER", "openai"))?,
            openai_api_key: lookup("OPENAI_API_KEY").filter(|k| !k.trim().is_empty()),
            openai_base_url: var("OPENAI_BASE_URL", "https://api.openai.com/v1"),
            generation: GenerationOptions {
                model: var("IMAGE_MODEL", &defaults.model),
                size: var("IMAGE_SIZE", &defaults.size),
                timeout_secs,
            },
        })
    }

    pub fn log_summary(&self) {
        tracing::info!("API: {}:{}", self.api_host, self.api_port);
        tracing::info!("DATABASE_PATH: {}", self.database_path.display());
        tracing::info!("IMAGES_DIR: {}", self.images_dir.display());
        tracing::info!("CONTEXT_PATH: {}", self.context_path.display());
        tracing::info!("IMAGE_PROVIDER: {:?}", self.image_provider);
        tracing::info!("OPENAI_BASE_URL: {}", self.openai_base_url);
        tracing::info!(
            "OPENAI_API_KEY: {}",
            if self.openai_api_key.is_some() { "<set>" } else { "<unset>" }
        );
        tracing::info!(
            "IMAGE_MODEL: {}, IMAGE_SIZE: {}, IMAGE_TIMEOUT_SECS: {}",
            self.generation.model,
            self.generation.size,
            self.generation.timeout_secs
        );
    }
}
