use thiserror::Error;

use crate::pipeline::Stage;

/// Status-level classification of a fetch failure.
///
/// Explicit kinds replace substring inspection of error messages: the
/// orchestrator and the fallback logic branch on these, never on text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// Direct request completed with a non-success status
    HttpStatus(u16),
    /// Transport-level failure (DNS, connection reset, TLS)
    Network,
    /// The request exceeded its configured timeout
    Timeout,
    /// The input was not a syntactically valid absolute URL
    InvalidUrl,
    /// The rendering proxy answered with a non-success status
    ProxyStatus(u16),
    /// The rendering proxy answered with an unusable payload shape
    ProxyShape,
}

/// Failure retrieving the raw document for a URL input.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct FetchError {
    pub kind: FetchErrorKind,
    pub message: String,
}

impl FetchError {
    pub fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        FetchError {
            kind,
            message: message.into(),
        }
    }
}

/// Failure talking to a generative or embedding model service.
#[derive(Error, Debug)]
pub enum LlmError {
    /// Assembled prompt exceeds the configured character ceiling.
    /// Failing fast beats silent truncation, which corrupts recipe
    /// boundaries mid-ingredient.
    #[error("prompt of {actual} characters exceeds ceiling of {ceiling}")]
    PromptTooLarge { actual: usize, ceiling: usize },

    /// The provider rejected or failed the request (includes safety-policy
    /// refusals; callers treat them like any other model failure)
    #[error("model request failed: {0}")]
    Provider(String),

    /// Transport failure reaching the provider
    #[error("model request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider response was missing the expected content
    #[error("unexpected model response shape: {0}")]
    ResponseShape(String),
}

/// Failure converting source text into the canonical recipe shape.
///
/// Callers treat every variant identically (retry or surface), so the
/// distinctions exist for logs and tests, not for control flow.
#[derive(Error, Debug)]
pub enum StructuringError {
    #[error("{0}")]
    Model(#[from] LlmError),

    #[error("model returned invalid JSON: {0}")]
    InvalidJson(String),

    #[error("source text contains no recipe: {0}")]
    NoRecipe(String),

    #[error("response failed schema validation: {}", fields.join(", "))]
    Schema { fields: Vec<String> },

    #[error("rewrite changed the step count: expected {expected}, got {actual}")]
    StepCountMismatch { expected: usize, actual: usize },
}

/// Cache failures are non-fatal: the pipeline downgrades to recompute.
#[derive(Error, Debug)]
#[error("cache unavailable: {0}")]
pub struct CacheError(pub String);

/// Index failures are non-fatal: the pipeline behaves as if no match exists.
#[derive(Error, Debug)]
#[error("similarity index unavailable: {0}")]
pub struct IndexError(pub String);

/// Terminal, user-visible failure of one pipeline run.
///
/// Carries the originating stage and a short diagnostic. Raw third-party
/// payloads never appear here; they go to debug logs only.
#[derive(Error, Debug)]
#[error("pipeline failed at {stage}: {message}")]
pub struct PipelineFailure {
    pub stage: Stage,
    pub message: String,
}

impl PipelineFailure {
    pub fn new(stage: Stage, message: impl Into<String>) -> Self {
        PipelineFailure {
            stage,
            message: message.into(),
        }
    }
}

/// Errors raised while assembling a pipeline or loading configuration.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("builder error: {0}")]
    Builder(String),

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
