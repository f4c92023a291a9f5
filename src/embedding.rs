//! Embedding service client. Fixed-dimension float vectors feed the
//! similarity index; the model itself is opaque.

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::GeminiConfig;
use crate::error::{BuildError, LlmError};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Unified trait for embedding providers.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError>;
}

/// Google Gemini `embedContent` client.
pub struct GoogleEmbeddingClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl GoogleEmbeddingClient {
    pub fn new(config: &GeminiConfig, timeout: Duration) -> Result<Self, BuildError> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            BuildError::Builder("GOOGLE_API_KEY not found in config or environment".to_string())
        })?;

        let client = Client::builder().timeout(timeout).build()?;

        Ok(GoogleEmbeddingClient {
            client,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
            model: config.embedding_model.clone(),
        })
    }
}

#[async_trait]
impl EmbeddingClient for GoogleEmbeddingClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        let url = format!(
            "{}/v1beta/models/{}:embedContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .json(&json!({
                "model": format!("models/{}", self.model),
                "content": { "parts": [{ "text": text }] }
            }))
            .send()
            .await?;

        let body: Value = response.json().await?;
        debug!("embedContent response: {:?}", body);

        if let Some(error) = body.get("error") {
            let message = error["message"].as_str().unwrap_or("unknown provider error");
            return Err(LlmError::Provider(message.to_string()));
        }

        let values = body["embedding"]["values"]
            .as_array()
            .ok_or_else(|| LlmError::ResponseShape("no embedding values".to_string()))?;

        let vector: Vec<f32> = values
            .iter()
            .filter_map(Value::as_f64)
            .map(|v| v as f32)
            .collect();

        if vector.len() != values.len() || vector.is_empty() {
            return Err(LlmError::ResponseShape(
                "embedding values are not all numbers".to_string(),
            ));
        }

        Ok(vector)
    }
}
