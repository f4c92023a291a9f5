//! Prompt templates and prompt-size enforcement.
//!
//! Every prompt that reaches the generative service is assembled here and
//! checked against a hard character ceiling first. Oversized prompts fail
//! fast instead of being truncated: truncation cuts recipes mid-ingredient
//! and the model then hallucinates the missing half.

use crate::error::LlmError;
use crate::llm::GenerationRequest;
use crate::model::{IngredientGroup, StructuredIngredient};

/// System prompt for converting source text into the canonical recipe JSON.
///
/// Loaded from `structure_prompt.txt` at compile time so the prompt can be
/// edited without touching Rust string syntax.
pub const STRUCTURE_SYSTEM_PROMPT: &str = include_str!("structure_prompt.txt");

const SUBSTITUTION_SYSTEM_PROMPT: &str = r#"
You rewrite cooking instructions after one ingredient has been swapped for
another. You receive the original numbered steps and the substitution.

Produce ONLY a JSON object of this shape, nothing else:

{"rewrittenInstructions": ["<step 1>", "<step 2>"]}

Rules:
- Return exactly as many steps as you were given, in the same order.
- Only touch wording that refers to the substituted ingredient, including
  technique changes the new ingredient requires.
- Leave every other step byte-for-byte unchanged.
"#;

const SCALING_SYSTEM_PROMPT: &str = r#"
You rewrite cooking instructions after a recipe has been scaled to a
different number of servings. You receive the original numbered steps, the
original ingredient quantities, and the scaled quantities.

Produce ONLY a JSON object of this shape, nothing else:

{"scaledInstructions": ["<step 1>", "<step 2>"]}

Rules:
- Return exactly as many steps as you were given, in the same order.
- Only change quantities that are explicitly written in a step. Vague
  references like "the onion" or "the remaining flour" stay as they are.
- Indivisible items (eggs, whole spices, bay leaves) round up to a whole
  number; never produce a fractional physical object.
- Leave steps without explicit quantities byte-for-byte unchanged.
"#;

/// Build the structuring request for one piece of source text.
pub fn structure_request(
    source_text: &str,
    source_kind: &str,
    ceiling: usize,
) -> Result<GenerationRequest, LlmError> {
    let user = format!("Source kind: {}\n\n{}", source_kind, source_text);
    within_ceiling(STRUCTURE_SYSTEM_PROMPT, &user, ceiling)?;
    Ok(GenerationRequest {
        system: STRUCTURE_SYSTEM_PROMPT.to_string(),
        user,
        json_response: true,
    })
}

/// Build the substitution-rewrite request.
pub fn substitution_request(
    instructions: &[String],
    original: &str,
    substitute: &str,
    ceiling: usize,
) -> Result<GenerationRequest, LlmError> {
    let user = format!(
        "Substitution: replace \"{}\" with \"{}\".\n\nSteps:\n{}",
        original,
        substitute,
        numbered(instructions)
    );
    within_ceiling(SUBSTITUTION_SYSTEM_PROMPT, &user, ceiling)?;
    Ok(GenerationRequest {
        system: SUBSTITUTION_SYSTEM_PROMPT.to_string(),
        user,
        json_response: true,
    })
}

/// Build the scaling-rewrite request.
pub fn scaling_request(
    instructions: &[String],
    original: &[IngredientGroup],
    scaled: &[IngredientGroup],
    ceiling: usize,
) -> Result<GenerationRequest, LlmError> {
    let user = format!(
        "Original quantities:\n{}\n\nScaled quantities:\n{}\n\nSteps:\n{}",
        quantity_lines(original),
        quantity_lines(scaled),
        numbered(instructions)
    );
    within_ceiling(SCALING_SYSTEM_PROMPT, &user, ceiling)?;
    Ok(GenerationRequest {
        system: SCALING_SYSTEM_PROMPT.to_string(),
        user,
        json_response: true,
    })
}

fn numbered(steps: &[String]) -> String {
    steps
        .iter()
        .enumerate()
        .map(|(i, step)| format!("{}. {}", i + 1, step))
        .collect::<Vec<_>>()
        .join("\n")
}

fn quantity_lines(groups: &[IngredientGroup]) -> String {
    groups
        .iter()
        .flat_map(|g| g.ingredients.iter())
        .map(ingredient_line)
        .collect::<Vec<_>>()
        .join("\n")
}

fn ingredient_line(ing: &StructuredIngredient) -> String {
    match (&ing.amount, &ing.unit) {
        (Some(amount), Some(unit)) => format!("- {} {} {}", amount, unit, ing.name),
        (Some(amount), None) => format!("- {} {}", amount, ing.name),
        _ => format!("- {}", ing.name),
    }
}

fn within_ceiling(system: &str, user: &str, ceiling: usize) -> Result<(), LlmError> {
    let actual = system.len() + user.len();
    if actual > ceiling {
        return Err(LlmError::PromptTooLarge { actual, ceiling });
    }
    Ok(())
}
