//! Shared application state and the axum router.
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::api::handlers;
use crate::config::{Config, ImageProvider};
use crate::error::{AppError, AppResult};
use crate::generation::GenerationService;
use crate::images::{ImageGenerator, ImageStorage, OpenAIImageClient, PlaceholderGenerator};
use crate::prompt::ContextDocument;
use crate::store::SayingStore;

pub struct AppState {
    pub store: SayingStore,
    pub generation: GenerationService,
}

impl AppState {
    pub fn new(store: SayingStore, generation: GenerationService) -> Self {
        AppState { store, generation }
    }

    /// Open the database, prepare the images directory and pick the image
    /// backend named by the config.
    pub async fn from_config(config: &Config) -> AppResult<Self> {
        if let Some(parent) = config.database_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AppError::Configuration(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }
        let store = SayingStore::open(&config.database_path)?;

        let storage = ImageStorage::new(config.images_dir.clone());
        storage.ensure_dir().await?;

        let generator: Arc<dyn ImageGenerator> = match config.image_provider {
            ImageProvider::OpenAI => Arc::new(OpenAIImageClient::new(
                config.openai_base_url.clone(),
                config.openai_api_key.clone(),
            )),
            ImageProvider::Placeholder => Arc::new(PlaceholderGenerator::new()),
        };
        if config.image_provider == ImageProvider::OpenAI && config.openai_api_key.is_none() {
            tracing::warn!("OPENAI_API_KEY is not set; generate requests will fail until it is");
        }

        let generation = GenerationService::new(
            store.clone(),
            generator,
            storage,
            ContextDocument::from_path(config.context_path.clone()),
            config.generation.clone(),
        );
        Ok(AppState::new(store, generation))
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    let images = ServeDir::new(state.generation.storage().dir());
    Router::new()
        .route("/", get(handlers::root))
        .route("/api/sayings", get(handlers::list_sayings).post(handlers::create_saying))
        .route(
            "/api/sayings/:id",
            get(handlers::get_saying)
                .put(handlers::update_saying)
                .delete(handlers::delete_saying),
        )
        .route("/api/sayings/:id/generate", post(handlers::generate_image))
        .route("/api/sayings/:id/prompt", get(handlers::preview_prompt))
        .route("/api/export", get(handlers::export_sayings))
        .route("/api/import", post(handlers::import_sayings))
        .nest_service("/images", images)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
