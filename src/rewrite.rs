//! Instruction rewriters for ingredient substitution and serving-size
//! scaling. Both reuse the structuring engine's prompt-ceiling, JSON
//! parsing, and usage tracking, and both enforce the one property the
//! model cannot be trusted with: the step count never changes. Rewrites
//! replace steps positionally; they never reorder or resize the list.

use log::debug;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;

use crate::error::StructuringError;
use crate::llm::{prompt, GenerationRequest, GenerativeClient, TokenUsage};
use crate::model::IngredientGroup;
use crate::structure::parse_json_response;

/// A successful rewrite with its observed cost.
#[derive(Debug, Clone)]
pub struct RewriteOutcome {
    pub instructions: Vec<String>,
    pub usage: TokenUsage,
    pub time_ms: u64,
}

/// Rewrites instructions after one ingredient is swapped for another.
pub struct SubstitutionRewriter {
    client: Arc<dyn GenerativeClient>,
    max_prompt_chars: usize,
}

impl SubstitutionRewriter {
    pub fn new(client: Arc<dyn GenerativeClient>, max_prompt_chars: usize) -> Self {
        SubstitutionRewriter {
            client,
            max_prompt_chars,
        }
    }

    pub async fn rewrite(
        &self,
        instructions: &[String],
        original: &str,
        substitute: &str,
    ) -> Result<RewriteOutcome, StructuringError> {
        let request = prompt::substitution_request(
            instructions,
            original,
            substitute,
            self.max_prompt_chars,
        )?;
        run_rewrite(
            &*self.client,
            &request,
            "rewrittenInstructions",
            instructions.len(),
        )
        .await
    }
}

/// Rewrites instruction quantities after a recipe is scaled.
pub struct ScalingRewriter {
    client: Arc<dyn GenerativeClient>,
    max_prompt_chars: usize,
}

impl ScalingRewriter {
    pub fn new(client: Arc<dyn GenerativeClient>, max_prompt_chars: usize) -> Self {
        ScalingRewriter {
            client,
            max_prompt_chars,
        }
    }

    pub async fn rewrite(
        &self,
        instructions: &[String],
        original: &[IngredientGroup],
        scaled: &[IngredientGroup],
    ) -> Result<RewriteOutcome, StructuringError> {
        let request =
            prompt::scaling_request(instructions, original, scaled, self.max_prompt_chars)?;
        run_rewrite(
            &*self.client,
            &request,
            "scaledInstructions",
            instructions.len(),
        )
        .await
    }
}

async fn run_rewrite(
    client: &dyn GenerativeClient,
    request: &GenerationRequest,
    field: &str,
    expected_steps: usize,
) -> Result<RewriteOutcome, StructuringError> {
    let start = Instant::now();
    let response = client.generate(request).await?;
    let time_ms = start.elapsed().as_millis() as u64;

    debug!(
        "rewrite call took {}ms ({} tokens total)",
        time_ms,
        response.usage.total()
    );

    let value = parse_json_response(&response.text)?;
    let steps = match value.get(field) {
        Some(Value::Array(items)) => {
            let steps: Vec<String> = items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect();
            if steps.len() != items.len() {
                return Err(StructuringError::Schema {
                    fields: vec![format!("{} (non-string element)", field)],
                });
            }
            steps
        }
        _ => {
            return Err(StructuringError::Schema {
                fields: vec![field.to_string()],
            })
        }
    };

    if steps.len() != expected_steps {
        return Err(StructuringError::StepCountMismatch {
            expected: expected_steps,
            actual: steps.len(),
        });
    }

    Ok(RewriteOutcome {
        instructions: steps,
        usage: response.usage,
        time_ms,
    })
}
