//! Heuristic extraction strategies for pages without schema.org markup:
//! recipe-card class names and heading adjacency.

use scraper::{ElementRef, Html, Selector};

use super::{Candidate, StrategyOutput};

// Recipe plugin class names seen across WordPress recipe cards
// (WPRM, Tasty, Mediavine Create, WP Zoom) and common hand-rolled themes.
const INGREDIENT_CLASSES: &[&str] = &[
    "wprm-recipe-ingredients-container",
    "tasty-recipes-ingredients",
    "mv-create-ingredients",
    "wpzoom-recipe-ingredients",
    "recipe-ingredients",
    "recipe-ingredient-list",
    "recipe-card-ingredients",
    "recipe_ingredients",
    "ingredient-list",
];

const INSTRUCTION_CLASSES: &[&str] = &[
    "wprm-recipe-instructions-container",
    "tasty-recipes-instructions",
    "mv-create-instructions",
    "wpzoom-recipe-instructions",
    "recipe-instructions",
    "recipe-instruction-list",
    "recipe-card-instructions",
    "recipe_instructions",
    "recipe-directions",
    "directions",
];

/// Look for known recipe-card container classes.
pub(crate) fn class_names(document: &Html) -> StrategyOutput {
    StrategyOutput {
        ingredients: class_candidates(document, INGREDIENT_CLASSES),
        instructions: class_candidates(document, INSTRUCTION_CLASSES),
    }
}

fn class_candidates(document: &Html, classes: &[&str]) -> Vec<Candidate> {
    let mut candidates = Vec::new();
    for class in classes {
        let selector = Selector::parse(&format!(".{}", class)).expect("valid class selector");
        for element in document.select(&selector) {
            if let Some(candidate) = Candidate::from_lines(block_lines(element)) {
                candidates.push(candidate);
            }
        }
    }
    candidates
}

/// Prefer list items inside the block; fall back to the whole block text.
fn block_lines(element: ElementRef) -> Vec<String> {
    let li = Selector::parse("li").expect("static selector");
    let items: Vec<String> = element
        .select(&li)
        .map(|el| el.text().collect::<Vec<_>>().join(" ").trim().to_string())
        .filter(|t| !t.is_empty())
        .collect();
    if !items.is_empty() {
        return items;
    }
    element
        .text()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

/// Look for an "Ingredients"/"Instructions" heading and harvest the list
/// or paragraph blocks that follow it, up to the next heading.
pub(crate) fn headings(document: &Html) -> StrategyOutput {
    let mut output = StrategyOutput::default();
    let heading_selector = Selector::parse("h1, h2, h3, h4").expect("static selector");

    for heading in document.select(&heading_selector) {
        let title = heading
            .text()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        let region = if title.contains("ingredient") {
            Region::Ingredients
        } else if title.contains("instruction")
            || title.contains("direction")
            || title.contains("method")
            || title.contains("preparation")
        {
            Region::Instructions
        } else {
            continue;
        };

        let Some(candidate) = following_block(heading) else {
            continue;
        };
        match region {
            Region::Ingredients => output.ingredients.push(candidate),
            Region::Instructions => output.instructions.push(candidate),
        }
    }

    output
}

enum Region {
    Ingredients,
    Instructions,
}

fn following_block(heading: ElementRef) -> Option<Candidate> {
    let mut lines = Vec::new();

    for sibling in heading.next_siblings() {
        let Some(element) = ElementRef::wrap(sibling) else {
            continue;
        };
        let tag = element.value().name();
        if matches!(tag, "h1" | "h2" | "h3" | "h4") {
            break;
        }
        match tag {
            "ul" | "ol" => lines.extend(block_lines(element)),
            "p" | "div" => {
                let text = element.text().collect::<Vec<_>>().join(" ").trim().to_string();
                if !text.is_empty() {
                    lines.push(text);
                }
            }
            _ => {}
        }
    }

    Candidate::from_lines(lines)
}
