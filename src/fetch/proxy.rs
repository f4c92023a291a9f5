use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;

use crate::error::{FetchError, FetchErrorKind};

#[derive(Serialize)]
struct RenderRequest<'a> {
    url: &'a str,
}

/// Third-party rendering proxy used when direct retrieval is blocked.
///
/// The proxy answers either with a JSON object carrying the rendered page
/// in a `body` (or `content`) field, or with the raw HTML itself. Any
/// other shape is a failure.
pub struct ProxyFetcher {
    endpoint: String,
    api_key: String,
    client: Client,
}

impl ProxyFetcher {
    pub fn new(endpoint: String, api_key: String, timeout: Option<Duration>) -> Self {
        let timeout = timeout.unwrap_or(Duration::from_secs(30));
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            endpoint,
            api_key,
            client,
        }
    }

    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&RenderRequest { url })
            .send()
            .await
            .map_err(|e| {
                let kind = if e.is_timeout() {
                    FetchErrorKind::Timeout
                } else {
                    FetchErrorKind::Network
                };
                FetchError::new(kind, format!("proxy request failed: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::new(
                FetchErrorKind::ProxyStatus(status.as_u16()),
                format!("proxy returned {}", status),
            ));
        }

        let text = response.text().await.map_err(|e| {
            FetchError::new(FetchErrorKind::Network, format!("proxy body unreadable: {}", e))
        })?;

        extract_html(&text)
    }
}

fn extract_html(text: &str) -> Result<String, FetchError> {
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(map)) => map
            .get("body")
            .or_else(|| map.get("content"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                FetchError::new(
                    FetchErrorKind::ProxyShape,
                    "proxy JSON response has no body/content field",
                )
            }),
        Ok(Value::String(s)) => Ok(s),
        // Not JSON: the proxy returned the rendered HTML directly
        Err(_) => Ok(text.to_string()),
        Ok(_) => Err(FetchError::new(
            FetchErrorKind::ProxyShape,
            "proxy response is neither an object with a body nor a string",
        )),
    }
}
