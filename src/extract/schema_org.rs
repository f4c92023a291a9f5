//! Schema.org extraction strategies: JSON-LD blocks and microdata markup.

use scraper::{ElementRef, Html, Selector};
use serde_json::Value;

use super::{Candidate, StrategyOutput};

/// Pull recipe regions from `application/ld+json` script blocks.
pub(crate) fn json_ld(document: &Html) -> StrategyOutput {
    let mut output = StrategyOutput::default();

    let selector =
        Selector::parse(r#"script[type="application/ld+json"]"#).expect("static selector");

    for script in document.select(&selector) {
        let raw: String = script.text().collect();
        let Ok(value) = serde_json::from_str::<Value>(&raw) else {
            continue;
        };
        for recipe in find_recipe_objects(&value) {
            if let Some(candidate) = ingredient_candidate(recipe) {
                output.ingredients.push(candidate);
            }
            if let Some(candidate) = instruction_candidate(recipe) {
                output.instructions.push(candidate);
            }
        }
    }

    output
}

/// A JSON-LD document may be the recipe itself, an array of items, or a
/// container with an `@graph` list.
fn find_recipe_objects(value: &Value) -> Vec<&Value> {
    let mut found = Vec::new();
    collect_recipes(value, &mut found);
    found
}

fn collect_recipes<'a>(value: &'a Value, found: &mut Vec<&'a Value>) {
    match value {
        Value::Object(map) => {
            if is_recipe_type(map.get("@type")) {
                found.push(value);
            } else if let Some(graph) = map.get("@graph") {
                collect_recipes(graph, found);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_recipes(item, found);
            }
        }
        _ => {}
    }
}

fn is_recipe_type(type_field: Option<&Value>) -> bool {
    match type_field {
        Some(Value::String(s)) => s.eq_ignore_ascii_case("recipe"),
        Some(Value::Array(items)) => items
            .iter()
            .any(|v| v.as_str().is_some_and(|s| s.eq_ignore_ascii_case("recipe"))),
        _ => false,
    }
}

fn ingredient_candidate(recipe: &Value) -> Option<Candidate> {
    let field = recipe
        .get("recipeIngredient")
        .or_else(|| recipe.get("ingredients"))?;
    let lines = match field {
        Value::Array(items) => items
            .iter()
            .filter_map(Value::as_str)
            .map(decode)
            .collect(),
        Value::String(s) => vec![decode(s)],
        _ => return None,
    };
    Candidate::from_lines(lines)
}

fn instruction_candidate(recipe: &Value) -> Option<Candidate> {
    let field = recipe.get("recipeInstructions")?;
    Candidate::from_lines(instruction_lines(field))
}

/// `recipeInstructions` shows up as a plain string, a list of strings, a
/// list of HowToStep objects, or HowToSections wrapping steps.
fn instruction_lines(field: &Value) -> Vec<String> {
    match field {
        Value::String(s) => vec![decode(s)],
        Value::Array(items) => items.iter().flat_map(instruction_lines).collect(),
        Value::Object(map) => {
            if let Some(list) = map.get("itemListElement") {
                instruction_lines(list)
            } else if let Some(text) = map.get("text").and_then(Value::as_str) {
                vec![decode(text)]
            } else {
                Vec::new()
            }
        }
        _ => Vec::new(),
    }
}

fn decode(s: &str) -> String {
    html_escape::decode_html_entities(s).trim().to_string()
}

/// Pull recipe regions from microdata (`itemscope`/`itemprop`) markup.
///
/// Scoped strictly to a Recipe container: global itemprop searches pick
/// up unrelated page content (site title, author bio, ads).
pub(crate) fn microdata(document: &Html) -> StrategyOutput {
    let mut output = StrategyOutput::default();

    let Some(container) = find_recipe_container(document) else {
        return output;
    };

    for prop in ["recipeIngredient", "ingredients"] {
        if let Some(candidate) = Candidate::from_lines(itemprop_texts(container, prop)) {
            output.ingredients.push(candidate);
            break;
        }
    }
    if let Some(candidate) =
        Candidate::from_lines(itemprop_texts(container, "recipeInstructions"))
    {
        output.instructions.push(candidate);
    }

    output
}

fn find_recipe_container(document: &Html) -> Option<ElementRef<'_>> {
    let selector = Selector::parse("[itemscope]").expect("static selector");
    document.select(&selector).find(|element| {
        element.value().attr("itemtype").is_some_and(|t| {
            t.contains("schema.org/Recipe") || t.contains("data-vocabulary.org/Recipe")
        })
    })
}

fn itemprop_texts(root: ElementRef, prop: &str) -> Vec<String> {
    let selector = Selector::parse(&format!("[itemprop='{}']", prop)).expect("valid selector");
    root.select(&selector)
        .map(|el| el.text().collect::<Vec<_>>().join(" ").trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(html: &str) -> Html {
        Html::parse_document(html)
    }

    #[test]
    fn test_json_ld_graph_wrapper() {
        let html = r#"
            <script type="application/ld+json">
            {"@graph": [
                {"@type": "WebPage", "name": "blog"},
                {"@type": "Recipe",
                 "recipeIngredient": ["1 onion"],
                 "recipeInstructions": "Chop the onion."}
            ]}
            </script>
        "#;
        let output = json_ld(&parse(html));
        assert_eq!(output.ingredients[0].text, "1 onion");
        assert_eq!(output.instructions[0].text, "Chop the onion.");
    }

    #[test]
    fn test_json_ld_how_to_sections() {
        let html = r#"
            <script type="application/ld+json">
            {"@type": "Recipe",
             "recipeIngredient": ["dough", "sauce"],
             "recipeInstructions": [
                {"@type": "HowToSection", "name": "Dough",
                 "itemListElement": [{"@type": "HowToStep", "text": "Knead."}]},
                {"@type": "HowToSection", "name": "Assembly",
                 "itemListElement": [{"@type": "HowToStep", "text": "Top and bake."}]}
             ]}
            </script>
        "#;
        let output = json_ld(&parse(html));
        assert_eq!(output.instructions[0].text, "Knead.\nTop and bake.");
    }

    #[test]
    fn test_json_ld_type_array() {
        let html = r#"
            <script type="application/ld+json">
            {"@type": ["Recipe", "NewsArticle"], "recipeIngredient": ["salt"]}
            </script>
        "#;
        let output = json_ld(&parse(html));
        assert_eq!(output.ingredients.len(), 1);
    }

    #[test]
    fn test_json_ld_decodes_entities() {
        let html = r#"
            <script type="application/ld+json">
            {"@type": "Recipe", "recipeIngredient": ["salt &amp; pepper"]}
            </script>
        "#;
        let output = json_ld(&parse(html));
        assert_eq!(output.ingredients[0].text, "salt & pepper");
    }

    #[test]
    fn test_json_ld_invalid_json_skipped() {
        let html = r#"<script type="application/ld+json">{not json}</script>"#;
        let output = json_ld(&parse(html));
        assert!(output.ingredients.is_empty());
        assert!(output.instructions.is_empty());
    }

    #[test]
    fn test_microdata_scoped_to_recipe_container() {
        let html = r#"
            <div itemscope itemtype="https://schema.org/Recipe">
                <li itemprop="recipeIngredient">2 cups rice</li>
                <li itemprop="recipeIngredient">1 tbsp oil</li>
                <div itemprop="recipeInstructions">Rinse and simmer.</div>
            </div>
            <span itemprop="recipeIngredient">unrelated sidebar text</span>
        "#;
        let output = microdata(&parse(html));
        assert_eq!(output.ingredients[0].text, "2 cups rice\n1 tbsp oil");
        assert_eq!(output.instructions[0].text, "Rinse and simmer.");
    }

    #[test]
    fn test_microdata_without_container_is_empty() {
        let html = r#"<div><span itemprop="recipeIngredient">stray</span></div>"#;
        let output = microdata(&parse(html));
        assert!(output.ingredients.is_empty());
    }
}
