//! Generation orchestrator: saying → prompt → provider → file → record.
//!
//! The record is read before the provider call and written after it; no lock
//! is held while waiting on the provider. A failed call leaves the record
//! untouched.
use std::sync::Arc;

use crate::config::GenerationOptions;
use crate::error::{AppError, AppResult};
use crate::images::{ImageGenerator, ImageStorage};
use crate::prompt::{ContextDocument, PromptConstructor};
use crate::store::{Saying, SayingStore};

#[derive(Clone)]
pub struct GenerationService {
    store: SayingStore,
    generator: Arc<dyn ImageGenerator>,
    storage: ImageStorage,
    context: ContextDocument,
    options: GenerationOptions,
    prompts: PromptConstructor,
}

impl GenerationService {
    pub fn new(
        store: SayingStore,
        generator: Arc<dyn ImageGenerator>,
        storage: ImageStorage,
        context: ContextDocument,
        options: GenerationOptions,
    ) -> Self {
        GenerationService {
            store,
            generator,
            storage,
            context,
            options,
            prompts: PromptConstructor::new(),
        }
    }

    pub fn storage(&self) -> &ImageStorage {
        &self.storage
    }

    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    async fn final_prompt(&self, saying: &Saying) -> AppResult<String> {
        let context = self.context.load().await?;
        Ok(self.prompts.construct_prompt(&context, &saying.prompt, &saying.saying))
    }

    /// The prompt that `generate` would send, without calling the provider.
    pub async fn preview_prompt(&self, id: i64) -> AppResult<String> {
        let saying = self.store.get(id).await?;
        self.final_prompt(&saying).await
    }

    pub async fn generate(&self, id: i64) -> AppResult<Saying> {
        let saying = self.store.get(id).await?;
        let prompt = self.final_prompt(&saying).await?;

        tracing::info!(id, "Generating image");
        let bytes = self.generator.generate(&prompt, &self.options).await.map_err(|e| {
            tracing::error!(id, "Image generation failed: {}", e);
            AppError::from(e)
        })?;

        let public_path = self.storage.save(id, &bytes).await?;
        match self.store.set_image(id, &public_path).await {
            Ok(updated) => {
                tracing::info!(id, image_path = %public_path, "Linked generated image");
                Ok(updated)
            }
            Err(e) => {
                // Deleted (or unwritable) while the provider was working.
                self.storage.remove(&public_path).await;
                Err(e)
            }
        }
    }
}
