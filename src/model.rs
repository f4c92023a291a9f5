use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Input source for a single ingestion request.
#[derive(Debug, Clone)]
pub enum RecipeInput {
    /// Fetch and extract from a web page
    Url(String),
    /// Pasted recipe text
    RawText(String),
    /// A single photographed page (OCR'd before structuring)
    Image(crate::ocr::ImageSource),
    /// Multiple photographed pages, combined in order
    Images(Vec<crate::ocr::ImageSource>),
    /// Transcript derived from a cooking video
    Video(String),
}

impl RecipeInput {
    /// Short label used in stage diagnostics and prompts.
    pub fn kind(&self) -> &'static str {
        match self {
            RecipeInput::Url(_) => "url",
            RecipeInput::RawText(_) => "raw_text",
            RecipeInput::Image(_) => "image",
            RecipeInput::Images(_) => "images",
            RecipeInput::Video(_) => "video",
        }
    }
}

/// How the HTML for a URL input was ultimately obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchMethod {
    Direct,
    FallbackProxy,
}

/// Raw document retrieved for a URL input.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub html: String,
    pub method: FetchMethod,
}

/// Plain-text regions pulled out of a page by structural heuristics.
///
/// Either field may be empty; downstream stages tolerate partial content
/// and let the structuring model perform final semantic correction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedContent {
    pub ingredients_text: String,
    pub instructions_text: String,
}

impl ExtractedContent {
    pub fn is_empty(&self) -> bool {
        self.ingredients_text.is_empty() && self.instructions_text.is_empty()
    }

    /// Combined text handed to the structuring engine.
    pub fn combined(&self) -> String {
        match (
            self.ingredients_text.is_empty(),
            self.instructions_text.is_empty(),
        ) {
            (false, false) => format!(
                "Ingredients:\n{}\n\nInstructions:\n{}",
                self.ingredients_text, self.instructions_text
            ),
            (false, true) => format!("Ingredients:\n{}", self.ingredients_text),
            (true, false) => format!("Instructions:\n{}", self.instructions_text),
            (true, true) => String::new(),
        }
    }
}

/// A suggested ingredient replacement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Substitution {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// A single ingredient in canonical form.
///
/// `amount` stays a string: source quantities are frequently vulgar
/// fractions, ranges, or "to taste", and the canonical schema preserves
/// the original textual form. Numeric scaling is a derived concern done
/// only when rewriting instructions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredIngredient {
    pub name: String,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub preparation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_substitutions: Option<Vec<Substitution>>,
}

impl StructuredIngredient {
    pub fn named(name: impl Into<String>) -> Self {
        StructuredIngredient {
            name: name.into(),
            amount: None,
            unit: None,
            preparation: None,
            suggested_substitutions: None,
        }
    }
}

/// Named, ordered group of ingredients ("For the sauce", ...).
/// List order is display/processing order and survives every transformation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientGroup {
    #[serde(default)]
    pub name: String,
    pub ingredients: Vec<StructuredIngredient>,
}

/// The canonical structured recipe every input normalizes into.
///
/// `id` is assigned only once persisted; an in-memory recipe fresh out of
/// structuring has none. `instructions` order is the cooking order and is
/// never reordered; rewriters replace elements positionally.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecipe {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub short_description: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub recipe_yield: Option<String>,
    #[serde(default)]
    pub prep_time: Option<String>,
    #[serde(default)]
    pub cook_time: Option<String>,
    #[serde(default)]
    pub total_time: Option<String>,
    #[serde(default)]
    pub ingredient_groups: Vec<IngredientGroup>,
    #[serde(default)]
    pub instructions: Vec<String>,
    #[serde(default)]
    pub tips: Vec<String>,
    #[serde(default)]
    pub nutrition: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl CanonicalRecipe {
    pub fn ingredient_count(&self) -> usize {
        self.ingredient_groups
            .iter()
            .map(|g| g.ingredients.len())
            .sum()
    }

    /// Flat text rendering used when embedding the recipe.
    pub fn embedding_text(&self) -> String {
        let mut parts = vec![self.title.clone()];
        if !self.description.is_empty() {
            parts.push(self.description.clone());
        }
        for group in &self.ingredient_groups {
            for ing in &group.ingredients {
                parts.push(ing.name.clone());
            }
        }
        parts.join("\n")
    }
}

/// An authoritative cached structuring result keyed by input fingerprint.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub fingerprint: String,
    pub recipe: CanonicalRecipe,
    pub created_at: SystemTime,
}

/// A candidate near-duplicate returned by the similarity index.
/// Ephemeral: recomputed per query, never persisted.
#[derive(Debug, Clone)]
pub struct SimilarityMatch {
    pub recipe: CanonicalRecipe,
    pub similarity: f32,
}
