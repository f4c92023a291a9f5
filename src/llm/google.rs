use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

use super::{GenerationRequest, GenerationResponse, GenerativeClient, TokenUsage};
use crate::config::GeminiConfig;
use crate::error::{BuildError, LlmError};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Google Gemini `generateContent` client.
pub struct GoogleClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl GoogleClient {
    /// Create a client from configuration. The API key comes from config
    /// or the GOOGLE_API_KEY environment variable.
    pub fn new(config: &GeminiConfig, timeout: Duration) -> Result<Self, BuildError> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            BuildError::Builder("GOOGLE_API_KEY not found in config or environment".to_string())
        })?;

        let client = Client::builder().timeout(timeout).build()?;

        Ok(GoogleClient {
            client,
            base_url: config
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl GenerativeClient for GoogleClient {
    fn name(&self) -> &str {
        "google"
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationResponse, LlmError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, self.model, self.api_key
        );

        let mut generation_config = json!({
            "temperature": self.temperature,
            "maxOutputTokens": self.max_tokens,
        });
        if request.json_response {
            generation_config["responseMimeType"] = json!("application/json");
        }

        let response = self
            .client
            .post(&url)
            .json(&json!({
                "systemInstruction": {
                    "parts": [{ "text": request.system }]
                },
                "contents": [{
                    "parts": [{ "text": request.user }]
                }],
                "generationConfig": generation_config,
            }))
            .send()
            .await?;

        let body: Value = response.json().await?;
        debug!("Gemini response: {:?}", body);

        // API-level error object
        if let Some(error) = body.get("error") {
            let message = error["message"].as_str().unwrap_or("unknown provider error");
            return Err(LlmError::Provider(message.to_string()));
        }

        // Safety-policy rejection; treated like any other model failure
        if let Some(reason) = body["promptFeedback"]["blockReason"].as_str() {
            return Err(LlmError::Provider(format!(
                "request blocked by provider: {}",
                reason
            )));
        }

        let text = body["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| {
                LlmError::ResponseShape("no text in first candidate".to_string())
            })?
            .to_string();

        let usage = TokenUsage {
            prompt_tokens: body["usageMetadata"]["promptTokenCount"]
                .as_u64()
                .unwrap_or(0) as u32,
            output_tokens: body["usageMetadata"]["candidatesTokenCount"]
                .as_u64()
                .unwrap_or(0) as u32,
        };

        Ok(GenerationResponse { text, usage })
    }
}
