//! Rewriters driven through the real Gemini client against a mocked
//! endpoint, covering the whole request/response path.

use std::sync::Arc;
use std::time::Duration;

use recipe_pipeline::config::GeminiConfig;
use recipe_pipeline::{
    GoogleClient, IngredientGroup, ScalingRewriter, StructuredIngredient, StructuringError,
    SubstitutionRewriter,
};
use serde_json::json;

fn gemini_client(server: &mockito::ServerGuard) -> Arc<GoogleClient> {
    let config = GeminiConfig {
        api_key: Some("test-key".to_string()),
        base_url: Some(server.url()),
        ..Default::default()
    };
    Arc::new(GoogleClient::new(&config, Duration::from_secs(5)).unwrap())
}

async fn mock_generate(server: &mut mockito::ServerGuard, payload: serde_json::Value) {
    server
        .mock(
            "POST",
            mockito::Matcher::Regex(":generateContent".to_string()),
        )
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(
            json!({
                "candidates": [{"content": {"parts": [{"text": payload.to_string()}]}}],
                "usageMetadata": {"promptTokenCount": 200, "candidatesTokenCount": 80}
            })
            .to_string(),
        )
        .create_async()
        .await;
}

fn flour_groups(amount: &str) -> Vec<IngredientGroup> {
    vec![IngredientGroup {
        name: String::new(),
        ingredients: vec![StructuredIngredient {
            amount: Some(amount.to_string()),
            unit: Some("cups".to_string()),
            ..StructuredIngredient::named("flour")
        }],
    }]
}

#[tokio::test]
async fn test_scaling_rewrite_end_to_end() {
    let mut server = mockito::Server::new_async().await;
    mock_generate(
        &mut server,
        json!({"scaledInstructions": ["Add 1 cup flour", "Add the onion"]}),
    )
    .await;

    let rewriter = ScalingRewriter::new(gemini_client(&server), 60_000);
    let steps = vec!["Add 2 cups flour".to_string(), "Add the onion".to_string()];

    let outcome = rewriter
        .rewrite(&steps, &flour_groups("2"), &flour_groups("1"))
        .await
        .unwrap();

    assert_eq!(outcome.instructions.len(), 2);
    assert_eq!(outcome.instructions[0], "Add 1 cup flour");
    assert_eq!(outcome.instructions[1], "Add the onion");
    assert_eq!(outcome.usage.prompt_tokens, 200);
    assert_eq!(outcome.usage.output_tokens, 80);
}

#[tokio::test]
async fn test_substitution_rewrite_end_to_end() {
    let mut server = mockito::Server::new_async().await;
    mock_generate(
        &mut server,
        json!({"rewrittenInstructions": ["Warm the ghee.", "Serve."]}),
    )
    .await;

    let rewriter = SubstitutionRewriter::new(gemini_client(&server), 60_000);
    let steps = vec!["Warm the butter.".to_string(), "Serve.".to_string()];

    let outcome = rewriter.rewrite(&steps, "butter", "ghee").await.unwrap();
    assert_eq!(outcome.instructions, vec!["Warm the ghee.", "Serve."]);
}

#[tokio::test]
async fn test_step_count_drift_is_rejected() {
    let mut server = mockito::Server::new_async().await;
    mock_generate(
        &mut server,
        json!({"rewrittenInstructions": ["One merged step."]}),
    )
    .await;

    let rewriter = SubstitutionRewriter::new(gemini_client(&server), 60_000);
    let steps = vec!["Step A.".to_string(), "Step B.".to_string()];

    let err = rewriter.rewrite(&steps, "a", "b").await.unwrap_err();
    assert!(matches!(
        err,
        StructuringError::StepCountMismatch {
            expected: 2,
            actual: 1
        }
    ));
}
