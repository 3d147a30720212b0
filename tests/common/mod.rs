//! Shared fixtures: a scripted image generator and a temp-dir service.
#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use sayings_image_api::images::ImageStorage;
use sayings_image_api::prompt::ContextDocument;
use sayings_image_api::{GenerationError, GenerationOptions, GenerationService, ImageGenerator, SayingStore};
use tempfile::TempDir;

pub const FAKE_PNG: &[u8] = b"\x89PNG fake image bytes";

/// Returns `FAKE_PNG`, or a provider error when told to fail. Records every
/// prompt it sees.
#[derive(Default)]
pub struct ScriptedGenerator {
    pub fail_with_status: Option<u16>,
    pub prompts: Mutex<Vec<String>>,
    pub calls: AtomicUsize,
}

impl ScriptedGenerator {
    pub fn ok() -> Arc<Self> {
        Arc::new(ScriptedGenerator::default())
    }

    pub fn failing(status: u16) -> Arc<Self> {
        Arc::new(ScriptedGenerator { fail_with_status: Some(status), ..Default::default() })
    }

    pub fn seen_prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl ImageGenerator for ScriptedGenerator {
    async fn generate(
        &self,
        prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<Vec<u8>, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.to_string());
        match self.fail_with_status {
            Some(status) => Err(GenerationError::Provider {
                status,
                message: "content policy violation".to_string(),
            }),
            None => Ok(FAKE_PNG.to_vec()),
        }
    }
}

pub struct Fixture {
    pub dir: TempDir,
    pub store: SayingStore,
    pub service: GenerationService,
}

impl Fixture {
    pub fn images_dir(&self) -> std::path::PathBuf {
        self.dir.path().join("images")
    }

    pub fn image_files(&self) -> Vec<String> {
        match std::fs::read_dir(self.images_dir()) {
            Ok(entries) => {
                let mut names: Vec<String> = entries
                    .filter_map(|e| e.ok())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect();
                names.sort();
                names
            }
            Err(_) => Vec::new(),
        }
    }

    pub fn write_context(&self, text: &str) {
        std::fs::write(self.dir.path().join("context.md"), text).unwrap();
    }
}

pub fn fixture(generator: Arc<dyn ImageGenerator>) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let store = SayingStore::open(dir.path().join("sayings.db")).unwrap();
    let service = GenerationService::new(
        store.clone(),
        generator,
        ImageStorage::new(dir.path().join("images")),
        ContextDocument::from_path(dir.path().join("context.md")),
        GenerationOptions::default(),
    );
    Fixture { dir, store, service }
}
