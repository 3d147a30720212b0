//! Sayings Image API library
//!
//! Modules:
//! - `api`: Axum HTTP handlers and router setup used by the binary.
//! - `store`: SQLite-backed saying records with import/export.
//! - `prompt`: Prompt construction with `%1` replacement and the context document.
//! - `images`: Image provider backends and on-disk image storage.
//! - `generation`: Ties store, prompt and provider together for one saying.
//! - `config`: Env-driven configuration loader.
//! - `error`: Common error type and alias.
//!
//! Re-exports are provided for common types: `Config`, `SayingStore`,
//! `PromptConstructor`, and `GenerationService`.
pub mod api;
pub mod config;
pub mod error;
pub mod generation;
pub mod images;
pub mod prompt;
pub mod store;

pub use config::{Config, GenerationOptions};
pub use error::{AppError, AppResult};
pub use generation::GenerationService;
pub use images::{GenerationError, ImageGenerator};
pub use prompt::constructor::PromptConstructor;
pub use store::{Saying, SayingStore};
