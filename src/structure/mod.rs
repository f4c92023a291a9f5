//! The structuring engine: one schema-constrained model call that turns
//! unstructured source text into a validated [`CanonicalRecipe`].
//!
//! The engine never retries internally. It returns a typed error and the
//! caller decides whether to retry with different input or surface the
//! failure. Every call records token usage and wall-clock latency.

pub mod schema;

use log::{debug, info};
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

use crate::error::StructuringError;
use crate::llm::{prompt, GenerativeClient, TokenUsage};
use crate::model::CanonicalRecipe;

/// A successful structuring result with its observed cost.
#[derive(Debug, Clone)]
pub struct StructuredOutcome {
    pub recipe: CanonicalRecipe,
    pub usage: TokenUsage,
    pub time_ms: u64,
}

pub struct StructuringEngine {
    client: Arc<dyn GenerativeClient>,
    max_prompt_chars: usize,
}

impl StructuringEngine {
    pub fn new(client: Arc<dyn GenerativeClient>, max_prompt_chars: usize) -> Self {
        StructuringEngine {
            client,
            max_prompt_chars,
        }
    }

    /// Convert `source_text` into a canonical recipe.
    pub async fn structure(
        &self,
        source_text: &str,
        source_kind: &str,
    ) -> Result<StructuredOutcome, StructuringError> {
        let request = prompt::structure_request(source_text, source_kind, self.max_prompt_chars)?;

        let start = Instant::now();
        let response = self.client.generate(&request).await?;
        let time_ms = start.elapsed().as_millis() as u64;

        debug!(
            "structuring call to {} took {}ms ({} prompt / {} output tokens)",
            self.client.name(),
            time_ms,
            response.usage.prompt_tokens,
            response.usage.output_tokens
        );

        let value = parse_json_response(&response.text)?;

        // The prompt asks the model to answer {"error": ...} when the text
        // holds no recipe at all.
        if let Some(reason) = value.get("error").and_then(Value::as_str) {
            return Err(StructuringError::NoRecipe(reason.to_string()));
        }

        let recipe = schema::validate_recipe(&value)?;
        info!(
            "structured \"{}\": {} ingredients, {} steps",
            recipe.title,
            recipe.ingredient_count(),
            recipe.instructions.len()
        );

        Ok(StructuredOutcome {
            recipe,
            usage: response.usage,
            time_ms,
        })
    }
}

/// Parse model output as JSON, tolerating markdown code fences some models
/// wrap around the object despite instructions.
pub(crate) fn parse_json_response(text: &str) -> Result<Value, StructuringError> {
    let trimmed = strip_code_fence(text.trim());
    serde_json::from_str(trimmed).map_err(|e| StructuringError::InvalidJson(e.to_string()))
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.trim_start_matches('\n')
        .strip_suffix("```")
        .unwrap_or(rest)
        .trim()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LlmError;
    use crate::llm::{GenerationRequest, GenerationResponse};
    use async_trait::async_trait;

    /// Test double returning a canned response.
    struct FakeClient {
        response: String,
    }

    #[async_trait]
    impl GenerativeClient for FakeClient {
        fn name(&self) -> &str {
            "fake"
        }

        async fn generate(
            &self,
            _request: &GenerationRequest,
        ) -> Result<GenerationResponse, LlmError> {
            Ok(GenerationResponse {
                text: self.response.clone(),
                usage: TokenUsage {
                    prompt_tokens: 100,
                    output_tokens: 50,
                },
            })
        }
    }

    fn engine_with(response: &str) -> StructuringEngine {
        StructuringEngine::new(
            Arc::new(FakeClient {
                response: response.to_string(),
            }),
            60_000,
        )
    }

    const VALID_RESPONSE: &str = r#"{
        "title": "Omelette",
        "ingredientGroups": [{"name": "", "ingredients": [{"name": "egg", "amount": "3"}]}],
        "instructions": ["Whisk eggs.", "Cook in butter."]
    }"#;

    #[tokio::test]
    async fn test_structure_happy_path_records_usage() {
        let engine = engine_with(VALID_RESPONSE);
        let outcome = engine.structure("three eggs...", "raw_text").await.unwrap();
        assert_eq!(outcome.recipe.title, "Omelette");
        assert_eq!(outcome.usage.prompt_tokens, 100);
        assert_eq!(outcome.usage.output_tokens, 50);
    }

    #[tokio::test]
    async fn test_structure_tolerates_code_fence() {
        let fenced = format!("```json\n{}\n```", VALID_RESPONSE);
        let engine = engine_with(&fenced);
        let outcome = engine.structure("three eggs...", "raw_text").await.unwrap();
        assert_eq!(outcome.recipe.instructions.len(), 2);
    }

    #[tokio::test]
    async fn test_structure_invalid_json_is_typed_error() {
        let engine = engine_with("Sure! Here is the recipe you asked for:");
        let err = engine.structure("text", "raw_text").await.unwrap_err();
        assert!(matches!(err, StructuringError::InvalidJson(_)));
    }

    #[tokio::test]
    async fn test_structure_no_recipe_answer() {
        let engine = engine_with(r#"{"error": "this is a car review"}"#);
        let err = engine.structure("text", "raw_text").await.unwrap_err();
        assert!(matches!(err, StructuringError::NoRecipe(_)));
        assert!(err.to_string().contains("car review"));
    }

    #[tokio::test]
    async fn test_structure_oversized_input_rejected_before_call() {
        let engine = StructuringEngine::new(
            Arc::new(FakeClient {
                response: VALID_RESPONSE.to_string(),
            }),
            500,
        );
        let huge = "word ".repeat(1_000);
        let err = engine.structure(&huge, "raw_text").await.unwrap_err();
        assert!(matches!(
            err,
            StructuringError::Model(LlmError::PromptTooLarge { .. })
        ));
    }

    #[test]
    fn test_strip_code_fence_variants() {
        assert_eq!(strip_code_fence("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{\"a\":1}\n```"), "{\"a\":1}");
    }
}
