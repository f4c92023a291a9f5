//! Smoke-test harness: runs each argument through the pipeline and prints
//! the structured result with per-stage timings and token usage.
//!
//! Usage:
//!   recipe-pipeline <url> [<url> ...]
//!   recipe-pipeline --text "2 eggs. Beat them. Fry in butter."

use std::env;

use recipe_pipeline::{PipelineConfig, RecipeInput, RecipePipeline};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() {
        eprintln!("usage: recipe-pipeline <url>... | --text <recipe text>");
        std::process::exit(2);
    }

    let inputs: Vec<RecipeInput> = if args[0] == "--text" {
        let text = args[1..].join(" ");
        vec![RecipeInput::RawText(text)]
    } else {
        args.into_iter().map(RecipeInput::Url).collect()
    };

    let pipeline = RecipePipeline::builder()
        .config(PipelineConfig::load()?)
        .build()?;

    for input in inputs {
        let label = match &input {
            RecipeInput::Url(url) => url.clone(),
            other => other.kind().to_string(),
        };

        match pipeline.ingest(input).await {
            Ok(outcome) => {
                let recipe = &outcome.recipe;
                println!("== {}", label);
                println!("title:        {}", recipe.title);
                println!("ingredients:  {}", recipe.ingredient_count());
                println!("steps:        {}", recipe.instructions.len());
                if let Some(y) = &recipe.recipe_yield {
                    println!("yield:        {}", y);
                }
                if let Some(method) = outcome.fetch_method {
                    println!("fetched via:  {:?}", method);
                }
                if outcome.cache_hit {
                    println!("cache:        hit");
                }
                if let Some(similar) = &outcome.similar {
                    println!(
                        "similar:      \"{}\" ({:.2})",
                        similar.recipe.title, similar.similarity
                    );
                }
                println!(
                    "tokens:       {} prompt / {} output",
                    outcome.usage.prompt_tokens, outcome.usage.output_tokens
                );
                for timing in &outcome.timings {
                    println!("  {:<12} {}ms", timing.stage.to_string(), timing.millis);
                }
            }
            Err(failure) => {
                eprintln!("== {}", label);
                eprintln!("failed at {}: {}", failure.stage, failure.message);
            }
        }
        println!();
    }

    Ok(())
}
