//! Thin HTTP client for OpenAI-compatible image endpoints.
//!
//! - `generate` posts the prompt to `/images/generations` and returns the
//!   decoded bytes of the first image.
//! - Providers that answer with a `url` instead of `b64_json` get a second
//!   GET for the bytes.
//! - `options.timeout()` bounds the whole exchange, follow-up download
//!   included, not each request on its own.
use async_trait::async_trait;
use base64::prelude::*;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::GenerationOptions;
use crate::images::{GenerationError, ImageGenerator};

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageDatum>,
}

#[derive(Debug, Deserialize)]
struct ImageDatum {
    b64_json: Option<String>,
    url: Option<String>,
}

#[derive(Clone)]
pub struct OpenAIImageClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl OpenAIImageClient {
    pub fn new(base_url: String, api_key: Option<String>) -> Self {
        let base = base_url.trim_end_matches('/').to_string();
        OpenAIImageClient { client: Client::new(), base_url: base, api_key }
    }

    fn request_body(prompt: &str, options: &GenerationOptions) -> Value {
        let mut body = json!({
            "model": options.model,
            "prompt": prompt,
            "size": options.size,
            "n": 1,
        });
        // gpt-image models always answer with base64 and reject this field.
        if options.model.starts_with("dall-e") {
            body["response_format"] = json!("b64_json");
        }
        body
    }

    async fn download(&self, url: &str, options: &GenerationOptions) -> Result<Vec<u8>, GenerationError> {
        tracing::debug!("Fetching generated image from {}", url);
        let response = self.client.get(url)
            .send()
            .await
            .map_err(|e| map_request_error(e, options))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenerationError::Provider {
                status: status.as_u16(),
                message: format!("Failed to download generated image from {}", url),
            });
        }
        let bytes = response.bytes().await.map_err(|e| map_request_error(e, options))?;
        Ok(bytes.to_vec())
    }

    async fn request_image(
        &self,
        prompt: &str,
        options: &GenerationOptions,
        api_key: &str,
    ) -> Result<Vec<u8>, GenerationError> {
        let url = format!("{}/images/generations", self.base_url);
        tracing::info!(model = %options.model, size = %options.size, "Requesting image from {}", url);
        tracing::debug!("Prompt: {}", prompt);

        let response = self.client.post(&url)
            .bearer_auth(api_key)
            .json(&Self::request_body(prompt, options))
            .send()
            .await
            .map_err(|e| map_request_error(e, options))?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_else(|_| "Unable to read error body".to_string());
            let message = provider_message(&error_body);
            tracing::error!("Image provider returned {}: {}", status, message);
            return Err(GenerationError::Provider { status: status.as_u16(), message });
        }

        let payload: ImagesResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                GenerationError::Timeout(options.timeout_secs)
            } else {
                GenerationError::MalformedResponse(e.to_string())
            }
        })?;
        let first = payload.data.into_iter().next()
            .ok_or_else(|| GenerationError::MalformedResponse("response contained no images".to_string()))?;

        let bytes = match (first.b64_json, first.url) {
            (Some(b64), _) => BASE64_STANDARD.decode(b64.trim().as_bytes())
                .map_err(|e| GenerationError::MalformedResponse(format!("invalid base64 image data: {}", e)))?,
            (None, Some(image_url)) => self.download(&image_url, options).await?,
            (None, None) => {
                return Err(GenerationError::MalformedResponse(
                    "image entry has neither 'b64_json' nor 'url'".to_string(),
                ))
            }
        };
        if bytes.is_empty() {
            return Err(GenerationError::MalformedResponse("provider returned an empty image".to_string()));
        }
        tracing::info!("Received {} image bytes", bytes.len());
        Ok(bytes)
    }
}

#[async_trait]
impl ImageGenerator for OpenAIImageClient {
    async fn generate(
        &self,
        prompt: &str,
        options: &GenerationOptions,
    ) -> Result<Vec<u8>, GenerationError> {
        let api_key = self.api_key.as_deref().ok_or(GenerationError::MissingCredentials)?;
        match tokio::time::timeout(options.timeout(), self.request_image(prompt, options, api_key)).await {
            Ok(result) => result,
            Err(_) => {
                tracing::error!("Image provider timed out after {}s", options.timeout_secs);
                Err(GenerationError::Timeout(options.timeout_secs))
            }
        }
    }
}

fn map_request_error(e: reqwest::Error, options: &GenerationOptions) -> GenerationError {
    if e.is_timeout() {
        tracing::error!("Image provider timed out after {}s", options.timeout_secs);
        GenerationError::Timeout(options.timeout_secs)
    } else {
        tracing::error!("Image provider request failed: {:?}", e);
        GenerationError::Transport(e)
    }
}

/// Pull `error.message` out of an OpenAI-style error body, falling back to
/// the raw text.
fn provider_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.pointer("/error/message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| body.trim().to_string())
}
