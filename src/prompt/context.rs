//! The context document prepended to every prompt.
//!
//! Read from disk on each generation, so edits take effect without a restart.
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Default)]
pub struct ContextDocument {
    path: Option<PathBuf>,
}

impl ContextDocument {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        ContextDocument { path: Some(path.into()) }
    }

    /// A document that is always empty.
    pub fn empty() -> Self {
        ContextDocument { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Load the current contents verbatim. A missing file reads as empty.
    pub async fn load(&self) -> AppResult<String> {
        let Some(path) = &self.path else {
            return Ok(String::new());
        };
        match tokio::fs::read_to_string(path).await {
            Ok(text) => Ok(text),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("Context document {} not found, using empty context", path.display());
                Ok(String::new())
            }
            Err(e) => Err(AppError::Configuration(format!(
                "Failed to read context document {}: {}",
                path.display(),
                e
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::PromptConstructor;

    #[tokio::test]
    async fn missing_file_reads_as_empty() {
        let dir = tempfile::tempdir().unwrap();
        let doc = ContextDocument::from_path(dir.path().join("context.md"));
        assert_eq!(doc.load().await.unwrap(), "");
    }

    #[tokio::test]
    async fn contents_are_passed_through_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("context.md");
        std::fs::write(&path, "Use pastel tones.\n\nNo text.\n").unwrap();
        let doc = ContextDocument::from_path(&path);
        assert_eq!(doc.load().await.unwrap(), "Use pastel tones.\n\nNo text.\n");
    }

    #[tokio::test]
    async fn trailing_newline_yields_blank_line_before_prompt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("context.md");
        std::fs::write(&path, "ctx\n").unwrap();
        let context = ContextDocument::from_path(&path).load().await.unwrap();
        let prompt = PromptConstructor::new().construct_prompt(&context, "a watercolor of %1", "Hope");
        assert_eq!(prompt, "ctx\n\na watercolor of Hope");
    }

    #[tokio::test]
    async fn edits_are_picked_up_on_next_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("context.md");
        std::fs::write(&path, "first").unwrap();
        let doc = ContextDocument::from_path(&path);
        assert_eq!(doc.load().await.unwrap(), "first");
        std::fs::write(&path, "second").unwrap();
        assert_eq!(doc.load().await.unwrap(), "second");
    }

    #[tokio::test]
    async fn unreadable_document_is_a_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        // A directory cannot be read as a string.
        let doc = ContextDocument::from_path(dir.path());
        let err = doc.load().await.unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }

    #[tokio::test]
    async fn empty_document_has_no_path() {
        assert_eq!(ContextDocument::empty().load().await.unwrap(), "");
    }
}
