//! Structural content extraction.
//!
//! Reduces raw HTML to two plain-text regions, candidate ingredients and
//! candidate instructions, without any model call. Strategies run in
//! order of reliability: schema.org signals (JSON-LD, then microdata),
//! recipe-card class names, then heading adjacency. Per region the single
//! most plausible block wins; unrelated candidates are never concatenated.
//! Extraction cannot fail: anything it cannot locate comes back empty,
//! and the structuring model performs final semantic correction.

mod heuristics;
mod schema_org;

use log::debug;
use scraper::{Html, Selector};

use crate::model::ExtractedContent;

/// One candidate text block for a region, scored for plausibility.
#[derive(Debug, Clone)]
pub(crate) struct Candidate {
    pub text: String,
    /// Number of non-empty lines; more lines means a more list-like block
    pub lines: usize,
}

impl Candidate {
    pub(crate) fn from_lines(lines: Vec<String>) -> Option<Candidate> {
        let lines: Vec<String> = lines
            .into_iter()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        if lines.is_empty() {
            return None;
        }
        Some(Candidate {
            lines: lines.len(),
            text: lines.join("\n"),
        })
    }
}

/// Candidates produced by one strategy.
#[derive(Debug, Default)]
pub(crate) struct StrategyOutput {
    pub ingredients: Vec<Candidate>,
    pub instructions: Vec<Candidate>,
}

/// Extract candidate ingredient and instruction text from an HTML page.
pub fn extract(html: &str) -> ExtractedContent {
    let document = Html::parse_document(html);

    let outputs = [
        ("json_ld", schema_org::json_ld(&document)),
        ("microdata", schema_org::microdata(&document)),
        ("class_names", heuristics::class_names(&document)),
        ("headings", heuristics::headings(&document)),
    ];

    let mut content = ExtractedContent::default();

    for (name, output) in outputs {
        if content.ingredients_text.is_empty() {
            if let Some(best) = pick_best(output.ingredients) {
                debug!("ingredients region found by {} strategy", name);
                content.ingredients_text = best.text;
            }
        }
        if content.instructions_text.is_empty() {
            if let Some(best) = pick_best(output.instructions) {
                debug!("instructions region found by {} strategy", name);
                content.instructions_text = best.text;
            }
        }
        if !content.ingredients_text.is_empty() && !content.instructions_text.is_empty() {
            break;
        }
    }

    content
}

/// Visible text of the page body, used as a last-resort source when no
/// strategy finds either region. The structuring model does the sifting.
pub fn body_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let selector = Selector::parse("body").expect("static selector");
    document
        .select(&selector)
        .next()
        .map(|el| {
            el.text()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default()
}

/// Most plausible single block: most lines, longest text as tiebreak.
fn pick_best(candidates: Vec<Candidate>) -> Option<Candidate> {
    candidates
        .into_iter()
        .max_by_key(|c| (c.lines, c.text.len()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON_LD_PAGE: &str = r#"
        <html><head>
        <script type="application/ld+json">
        {
            "@context": "https://schema.org",
            "@type": "Recipe",
            "name": "Pancakes",
            "recipeIngredient": ["2 cups flour", "1 egg", "1 cup milk"],
            "recipeInstructions": [
                {"@type": "HowToStep", "text": "Whisk the dry ingredients."},
                {"@type": "HowToStep", "text": "Fold in the milk and egg."}
            ]
        }
        </script>
        </head><body><p>blog chatter</p></body></html>
    "#;

    #[test]
    fn test_json_ld_page() {
        let content = extract(JSON_LD_PAGE);
        assert_eq!(content.ingredients_text, "2 cups flour\n1 egg\n1 cup milk");
        assert!(content
            .instructions_text
            .starts_with("Whisk the dry ingredients."));
        assert_eq!(content.instructions_text.lines().count(), 2);
    }

    #[test]
    fn test_heading_page() {
        let html = r#"
            <html><body>
            <h2>Ingredients</h2>
            <ul><li>3 eggs</li><li>100g sugar</li></ul>
            <h2>Directions</h2>
            <ol><li>Beat the eggs with sugar.</li><li>Bake.</li></ol>
            </body></html>
        "#;
        let content = extract(html);
        assert_eq!(content.ingredients_text, "3 eggs\n100g sugar");
        assert_eq!(content.instructions_text, "Beat the eggs with sugar.\nBake.");
    }

    #[test]
    fn test_recipe_card_classes() {
        let html = r#"
            <html><body>
            <div class="wprm-recipe-ingredients-container">
                <ul><li>1 lb pasta</li><li>4 oz guanciale</li></ul>
            </div>
            <div class="wprm-recipe-instructions-container">
                <ol><li>Boil the pasta.</li><li>Crisp the guanciale.</li></ol>
            </div>
            </body></html>
        "#;
        let content = extract(html);
        assert_eq!(content.ingredients_text, "1 lb pasta\n4 oz guanciale");
        assert_eq!(
            content.instructions_text,
            "Boil the pasta.\nCrisp the guanciale."
        );
    }

    #[test]
    fn test_missing_regions_come_back_empty() {
        let content = extract("<html><body><p>Just a story about soup.</p></body></html>");
        assert!(content.is_empty());
    }

    #[test]
    fn test_partial_page_keeps_found_region() {
        let html = r#"
            <html><body>
            <h3>Instructions</h3>
            <ol><li>Stir.</li><li>Serve.</li></ol>
            </body></html>
        "#;
        let content = extract(html);
        assert!(content.ingredients_text.is_empty());
        assert_eq!(content.instructions_text, "Stir.\nServe.");
    }

    #[test]
    fn test_body_text_strips_markup() {
        let text = body_text("<html><body><h1>Soup</h1><p>Simmer gently.</p></body></html>");
        assert_eq!(text, "Soup\nSimmer gently.");
    }

    #[test]
    fn test_malformed_html_does_not_panic() {
        let content = extract("<html><body><ul><li>2 cups<h2>Ingredients</h2></body>");
        // Nothing plausible, but no panic either
        let _ = content;
    }

    #[test]
    fn test_picks_larger_candidate_block() {
        let html = r#"
            <html><body>
            <div class="recipe-ingredients"><ul><li>salt</li></ul></div>
            <div class="recipe-ingredients">
                <ul><li>2 cups flour</li><li>1 tsp salt</li><li>3 eggs</li></ul>
            </div>
            </body></html>
        "#;
        let content = extract(html);
        assert_eq!(content.ingredients_text.lines().count(), 3);
    }
}
