use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Top-level pipeline configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct PipelineConfig {
    /// Generative-model and embedding-model settings
    #[serde(default)]
    pub gemini: GeminiConfig,
    /// Fallback rendering proxy; `None` api_key disables the fallback
    #[serde(default)]
    pub proxy: ProxyConfig,
    /// Request timeout in seconds, applied to every outbound client
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Minimum cosine similarity before a near-duplicate is reported
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,
    /// Hard ceiling on assembled prompt size, in characters
    #[serde(default = "default_max_prompt_chars")]
    pub max_prompt_chars: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        PipelineConfig {
            gemini: GeminiConfig::default(),
            proxy: ProxyConfig::default(),
            timeout_secs: default_timeout(),
            similarity_threshold: default_similarity_threshold(),
            max_prompt_chars: default_max_prompt_chars(),
        }
    }
}

/// Settings for the Google generative and embedding endpoints.
#[derive(Debug, Deserialize, Clone)]
pub struct GeminiConfig {
    /// API key (can also be set via GOOGLE_API_KEY)
    pub api_key: Option<String>,
    /// Generative model identifier
    #[serde(default = "default_model")]
    pub model: String,
    /// Embedding model identifier
    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,
    /// Override for the API base URL (tests point this at a local server)
    pub base_url: Option<String>,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        GeminiConfig {
            api_key: None,
            model: default_model(),
            embedding_model: default_embedding_model(),
            base_url: None,
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
        }
    }
}

impl GeminiConfig {
    /// Resolve the API key from config or the GOOGLE_API_KEY variable.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("GOOGLE_API_KEY").ok())
    }
}

/// Settings for the fallback rendering proxy.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ProxyConfig {
    /// Credential for the proxy; absent means the fallback is disabled
    pub api_key: Option<String>,
    /// Proxy endpoint URL
    pub endpoint: Option<String>,
}

impl ProxyConfig {
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some() && self.endpoint.is_some()
    }
}

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_embedding_model() -> String {
    "text-embedding-004".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

fn default_max_tokens() -> u32 {
    8192
}

fn default_timeout() -> u64 {
    30
}

fn default_similarity_threshold() -> f32 {
    0.55
}

fn default_max_prompt_chars() -> usize {
    60_000
}

impl PipelineConfig {
    /// Load configuration from file and environment variables.
    ///
    /// Priority, highest to lowest:
    /// 1. Environment variables with RECIPE__ prefix
    /// 2. config.toml in the current directory
    /// 3. Default values
    ///
    /// Environment variable format: RECIPE__GEMINI__API_KEY
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            // Optional config file (can be missing)
            .add_source(File::with_name("config").required(false))
            // Use double underscore for nested: RECIPE__GEMINI__API_KEY
            .add_source(
                Environment::with_prefix("RECIPE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}
