//! Image to text via the Google Cloud Vision API.
//!
//! Supplies the transcribed text for photographed-page inputs. The
//! pipeline treats the result like any other raw text, except that image
//! payloads carry no stable fingerprint and therefore skip the cache.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::debug;
use reqwest::Client;
use serde_json::{json, Value};
use std::path::Path;
use std::time::Duration;
use tokio::fs;

use crate::error::LlmError;

const DEFAULT_BASE_URL: &str = "https://vision.googleapis.com";

/// Where the image bytes come from.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Image file on disk
    Path(String),
    /// Base64-encoded image data (e.g. an upload held in memory)
    Base64(String),
}

pub struct OcrClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl OcrClient {
    pub fn new(api_key: String, base_url: Option<String>, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        OcrClient {
            client,
            base_url: base_url.unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            api_key,
        }
    }

    /// Extract text from a single image.
    pub async fn transcribe(&self, source: &ImageSource) -> Result<String, LlmError> {
        let base64_image = match source {
            ImageSource::Path(path) => {
                let data = fs::read(Path::new(path)).await.map_err(|e| {
                    LlmError::Provider(format!("failed to read image {}: {}", path, e))
                })?;
                STANDARD.encode(&data)
            }
            ImageSource::Base64(data) => data.clone(),
        };
        self.annotate(&base64_image).await
    }

    /// Extract text from several images, in order, separated by blank lines.
    pub async fn transcribe_all(&self, sources: &[ImageSource]) -> Result<String, LlmError> {
        let mut pages = Vec::with_capacity(sources.len());
        for source in sources {
            pages.push(self.transcribe(source).await?);
        }
        Ok(pages.join("\n\n"))
    }

    async fn annotate(&self, base64_image: &str) -> Result<String, LlmError> {
        let url = format!("{}/v1/images:annotate?key={}", self.base_url, self.api_key);

        let response = self
            .client
            .post(&url)
            .json(&json!({
                "requests": [{
                    "image": { "content": base64_image },
                    "features": [{ "type": "TEXT_DETECTION" }]
                }]
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LlmError::Provider(format!(
                "Vision API returned {}",
                status
            )));
        }

        let body: Value = response.json().await?;
        debug!("Vision API response: {:?}", body);

        let text = body["responses"][0]["fullTextAnnotation"]["text"]
            .as_str()
            .unwrap_or("")
            .to_string();

        if text.trim().is_empty() {
            return Err(LlmError::ResponseShape(
                "no text detected in image".to_string(),
            ));
        }

        Ok(text)
    }
}
