//! Recipe ingestion and normalization pipeline.
//!
//! Takes a recipe from heterogeneous sources (a web URL, pasted text, a
//! photographed page, a video transcript), normalizes it into the
//! canonical structured schema, and guards the metered structuring model
//! with content-addressed caching and embedding-based near-duplicate
//! detection. Two derived transformations, ingredient substitution and
//! serving-size scaling, rewrite instructions through the same model
//! plumbing.
//!
//! ```no_run
//! use recipe_pipeline::{PipelineConfig, RecipeInput, RecipePipeline};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = RecipePipeline::builder()
//!     .config(PipelineConfig::load()?)
//!     .build()?;
//!
//! let outcome = pipeline
//!     .ingest(RecipeInput::Url("https://example.com/carbonara".into()))
//!     .await?;
//! println!("{} ({} steps)", outcome.recipe.title, outcome.recipe.instructions.len());
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod llm;
pub mod model;
pub mod ocr;
pub mod pipeline;
pub mod preprocess;
pub mod rewrite;
pub mod similarity;
pub mod structure;

pub use cache::{FingerprintCache, MemoryCache};
pub use config::PipelineConfig;
pub use embedding::{EmbeddingClient, GoogleEmbeddingClient};
pub use error::{
    BuildError, CacheError, FetchError, FetchErrorKind, IndexError, LlmError, PipelineFailure,
    StructuringError,
};
pub use llm::{GenerationRequest, GenerationResponse, GenerativeClient, GoogleClient, TokenUsage};
pub use model::{
    CacheEntry, CanonicalRecipe, ExtractedContent, FetchMethod, FetchResult, IngredientGroup,
    RecipeInput, SimilarityMatch, StructuredIngredient, Substitution,
};
pub use ocr::{ImageSource, OcrClient};
pub use pipeline::{PipelineOutcome, RecipePipeline, RecipePipelineBuilder, Stage, StageTiming};
pub use rewrite::{RewriteOutcome, ScalingRewriter, SubstitutionRewriter};
pub use similarity::{cosine_similarity, MemoryIndex, SimilarityIndex};
pub use structure::{StructuredOutcome, StructuringEngine};
