//! Explicit schema validation of the model's JSON output.
//!
//! The external service's output shape is never trusted implicitly.
//! Required array fields must actually be arrays; elements of the wrong
//! type are filtered rather than failing the whole parse, so a response
//! with 9 valid ingredients and 1 malformed one yields 9, not zero.

use log::warn;
use serde_json::Value;

use crate::error::StructuringError;
use crate::model::{CanonicalRecipe, IngredientGroup, StructuredIngredient};

/// Validate a parsed JSON value into a [`CanonicalRecipe`].
///
/// Collects every failed field before erroring so a diagnostic names all
/// of them at once.
pub fn validate_recipe(value: &Value) -> Result<CanonicalRecipe, StructuringError> {
    let Some(object) = value.as_object() else {
        return Err(StructuringError::Schema {
            fields: vec!["root (not an object)".to_string()],
        });
    };

    let mut failed: Vec<String> = Vec::new();

    let title = match object.get("title").and_then(Value::as_str) {
        Some(t) if !t.trim().is_empty() => t.trim().to_string(),
        _ => {
            failed.push("title".to_string());
            String::new()
        }
    };

    let ingredient_groups = match object.get("ingredientGroups") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => {
            let groups: Vec<IngredientGroup> =
                items.iter().filter_map(parse_group).collect();
            let dropped = items.len() - groups.len();
            if dropped > 0 {
                warn!("dropped {} malformed ingredient group(s)", dropped);
            }
            groups
        }
        Some(_) => {
            failed.push("ingredientGroups (not an array)".to_string());
            Vec::new()
        }
    };

    let instructions = match object.get("instructions") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => string_elements(items, "instructions"),
        Some(_) => {
            failed.push("instructions (not an array)".to_string());
            Vec::new()
        }
    };

    // A recipe that parsed into nothing at all is a validation failure,
    // not an empty success.
    if ingredient_groups.is_empty() && instructions.is_empty() {
        failed.push("ingredientGroups/instructions (both empty)".to_string());
    }

    if !failed.is_empty() {
        return Err(StructuringError::Schema { fields: failed });
    }

    let tips = match object.get("tips") {
        Some(Value::Array(items)) => string_elements(items, "tips"),
        _ => Vec::new(),
    };

    Ok(CanonicalRecipe {
        id: None,
        title,
        description: optional_string(object.get("description")).unwrap_or_default(),
        short_description: optional_string(object.get("shortDescription")).unwrap_or_default(),
        image: optional_string(object.get("image")),
        source_url: None,
        recipe_yield: optional_string(object.get("recipeYield")),
        prep_time: optional_string(object.get("prepTime")),
        cook_time: optional_string(object.get("cookTime")),
        total_time: optional_string(object.get("totalTime")),
        ingredient_groups,
        instructions,
        tips,
        nutrition: optional_string(object.get("nutrition")),
        embedding: None,
    })
}

fn parse_group(value: &Value) -> Option<IngredientGroup> {
    let object = value.as_object()?;
    let items = object.get("ingredients")?.as_array()?;

    let ingredients: Vec<StructuredIngredient> =
        items.iter().filter_map(parse_ingredient).collect();
    let dropped = items.len() - ingredients.len();
    if dropped > 0 {
        warn!("dropped {} malformed ingredient(s)", dropped);
    }
    if ingredients.is_empty() {
        return None;
    }

    Some(IngredientGroup {
        name: optional_string(object.get("name")).unwrap_or_default(),
        ingredients,
    })
}

fn parse_ingredient(value: &Value) -> Option<StructuredIngredient> {
    let object = value.as_object()?;
    let name = object.get("name")?.as_str()?.trim();
    if name.is_empty() {
        return None;
    }

    Some(StructuredIngredient {
        name: name.to_string(),
        // Some models emit numbers for amounts; keep the textual form
        amount: textual(object.get("amount")),
        unit: optional_string(object.get("unit")),
        preparation: optional_string(object.get("preparation")),
        suggested_substitutions: None,
    })
}

fn string_elements(items: &[Value], field: &str) -> Vec<String> {
    let kept: Vec<String> = items
        .iter()
        .filter_map(Value::as_str)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if kept.len() < items.len() {
        warn!("dropped {} malformed {} element(s)", items.len() - kept.len(), field);
    }
    kept
}

fn optional_string(value: Option<&Value>) -> Option<String> {
    value
        .and_then(Value::as_str)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn textual(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    }
}
