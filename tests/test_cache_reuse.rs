//! Cache semantics: identical inputs structure once, repeats bypass the
//! metered engine entirely.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use recipe_pipeline::{
    EmbeddingClient, GenerationRequest, GenerationResponse, GenerativeClient, LlmError,
    PipelineConfig, RecipeInput, RecipePipeline, TokenUsage,
};

/// Generative double that counts how often it is invoked.
struct CountingClient {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl GenerativeClient for CountingClient {
    fn name(&self) -> &str {
        "counting"
    }

    async fn generate(
        &self,
        _request: &GenerationRequest,
    ) -> Result<GenerationResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(GenerationResponse {
            text: r#"{
                "title": "Buttered Toast",
                "ingredientGroups": [{"name": "", "ingredients": [{"name": "bread"}, {"name": "butter"}]}],
                "instructions": ["Toast the bread.", "Butter it."]
            }"#
            .to_string(),
            usage: TokenUsage {
                prompt_tokens: 300,
                output_tokens: 60,
            },
        })
    }
}

struct FixedEmbedder;

#[async_trait]
impl EmbeddingClient for FixedEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, LlmError> {
        Ok(vec![0.4, 0.8, 0.2])
    }
}

fn pipeline_with_counter(calls: Arc<AtomicUsize>) -> RecipePipeline {
    RecipePipeline::builder()
        .config(PipelineConfig::default())
        .generative(Arc::new(CountingClient { calls }))
        .embeddings(Arc::new(FixedEmbedder))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_second_ingest_is_cache_hit_with_zero_usage() {
    let calls = Arc::new(AtomicUsize::new(0));
    let pipeline = pipeline_with_counter(Arc::clone(&calls));

    let text = "Toast.\n\nToast bread, butter it.".to_string();

    let first = pipeline
        .ingest(RecipeInput::RawText(text.clone()))
        .await
        .unwrap();
    assert!(!first.cache_hit);
    assert_eq!(first.usage.total(), 360);
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    let second = pipeline
        .ingest(RecipeInput::RawText(text))
        .await
        .unwrap();
    assert!(second.cache_hit);
    assert_eq!(second.usage.total(), 0);
    assert_eq!(second.recipe.title, first.recipe.title);
    // The engine was never consulted a second time
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_whitespace_variants_share_a_fingerprint() {
    let calls = Arc::new(AtomicUsize::new(0));
    let pipeline = pipeline_with_counter(Arc::clone(&calls));

    pipeline
        .ingest(RecipeInput::RawText(
            "Toast.\r\n\r\n\r\nToast bread, butter it.".to_string(),
        ))
        .await
        .unwrap();
    let second = pipeline
        .ingest(RecipeInput::RawText(
            "  Toast.\n\nToast bread, butter it.  ".to_string(),
        ))
        .await
        .unwrap();

    assert!(second.cache_hit);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_different_inputs_structure_independently() {
    let calls = Arc::new(AtomicUsize::new(0));
    let pipeline = pipeline_with_counter(Arc::clone(&calls));

    pipeline
        .ingest(RecipeInput::RawText("Toast recipe one.".to_string()))
        .await
        .unwrap();
    let second = pipeline
        .ingest(RecipeInput::RawText("Entirely different soup.".to_string()))
        .await
        .unwrap();

    assert!(!second.cache_hit);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}
