//! Generated image files on local disk.
//!
//! Files are named `saying_<id>_<utc timestamp>_<random>.png`, so repeated
//! generations for one saying never overwrite each other. Callers get back
//! the public path (`/images/<file>`) that is stored on the record and
//! served statically.
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::error::{AppError, AppResult};

pub const PUBLIC_PREFIX: &str = "/images/";

#[derive(Debug, Clone)]
pub struct ImageStorage {
    dir: PathBuf,
}

impl ImageStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        ImageStorage { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn ensure_dir(&self) -> AppResult<()> {
        tokio::fs::create_dir_all(&self.dir).await.map_err(|e| {
            AppError::Storage(format!("Failed to create {}: {}", self.dir.display(), e))
        })
    }

    pub fn file_name_for(saying_id: i64, at: DateTime<Utc>) -> String {
        let nonce = uuid::Uuid::new_v4().simple().to_string();
        format!(
            "saying_{}_{}_{}.png",
            saying_id,
            at.format("%Y%m%d%H%M%S%3f"),
            &nonce[..8]
        )
    }

    /// Write `bytes` to a new file and return its public path. The file is
    /// only visible under its final name once fully written.
    pub async fn save(&self, saying_id: i64, bytes: &[u8]) -> AppResult<String> {
        self.ensure_dir().await?;
        let file_name = Self::file_name_for(saying_id, Utc::now());
        let final_path = self.dir.join(&file_name);
        let tmp_path = self.dir.join(format!(".{}.part", file_name));

        tokio::fs::write(&tmp_path, bytes).await.map_err(|e| {
            AppError::Storage(format!("Failed to write {}: {}", tmp_path.display(), e))
        })?;
        if let Err(e) = tokio::fs::rename(&tmp_path, &final_path).await {
            let _ = tokio::fs::remove_file(&tmp_path).await;
            return Err(AppError::Storage(format!(
                "Failed to move image into {}: {}",
                final_path.display(),
                e
            )));
        }
        tracing::info!("Saved {} ({} bytes)", final_path.display(), bytes.len());
        Ok(format!("{}{}", PUBLIC_PREFIX, file_name))
    }

    /// Map a public path back to a file inside the images directory. Anything
    /// that could escape the directory resolves to `None`.
    pub fn resolve(&self, public_path: &str) -> Option<PathBuf> {
        let name = public_path.strip_prefix(PUBLIC_PREFIX)?;
        if name.is_empty()
            || name.starts_with('.')
            || name.contains('/')
            || name.contains('\\')
        {
            return None;
        }
        Some(self.dir.join(name))
    }

    /// Best-effort removal; failures are logged, not returned.
    pub async fn remove(&self, public_path: &str) {
        let Some(path) = self.resolve(public_path) else {
            tracing::warn!("Refusing to remove image outside storage: {}", public_path);
            return;
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => tracing::info!("Removed {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!("Failed to remove {}: {}", path.display(), e),
        }
    }
}
