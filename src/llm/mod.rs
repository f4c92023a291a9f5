//! Generative-model plumbing shared by the structuring engine and the
//! rewriters. The model is an opaque service behind [`GenerativeClient`];
//! test doubles implement the same trait.

mod google;
pub mod prompt;

pub use google::GoogleClient;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LlmError;

/// One request to the generative service.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub system: String,
    pub user: String,
    /// Ask the provider to constrain output to JSON
    pub json_response: bool,
}

/// Token accounting reported by the provider for one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub output_tokens: u32,
}

impl TokenUsage {
    pub fn add(&mut self, other: TokenUsage) {
        self.prompt_tokens = self.prompt_tokens.saturating_add(other.prompt_tokens);
        self.output_tokens = self.output_tokens.saturating_add(other.output_tokens);
    }

    pub fn total(&self) -> u32 {
        self.prompt_tokens.saturating_add(self.output_tokens)
    }
}

/// The provider's answer plus its metered cost.
#[derive(Debug, Clone)]
pub struct GenerationResponse {
    pub text: String,
    pub usage: TokenUsage,
}

/// Unified trait for generative-text providers.
#[async_trait]
pub trait GenerativeClient: Send + Sync {
    /// Provider name used in logs
    fn name(&self) -> &str;

    async fn generate(&self, request: &GenerationRequest)
        -> Result<GenerationResponse, LlmError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_add_accumulates() {
        let mut usage = TokenUsage {
            prompt_tokens: 100,
            output_tokens: 20,
        };
        usage.add(TokenUsage {
            prompt_tokens: 50,
            output_tokens: 5,
        });
        assert_eq!(usage.prompt_tokens, 150);
        assert_eq!(usage.output_tokens, 25);
        assert_eq!(usage.total(), 175);
    }

    #[test]
    fn test_usage_add_saturates() {
        let mut usage = TokenUsage {
            prompt_tokens: u32::MAX,
            output_tokens: 0,
        };
        usage.add(TokenUsage {
            prompt_tokens: 1,
            output_tokens: 0,
        });
        assert_eq!(usage.prompt_tokens, u32::MAX);
    }
}
