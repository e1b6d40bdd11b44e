mod anthropic_adapter;
mod ollama_adapter;
mod openai_adapter;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;

use crate::config::GeneratorConfig;

pub use anthropic_adapter::AnthropicAdapter;
pub use ollama_adapter::OllamaAdapter;
pub use openai_adapter::OpenAiAdapter;

/// Upper bound on reply length. A caption plus a handful of hashtags fits
/// comfortably.
pub const CAPTION_MAX_TOKENS: u32 = 400;

/// A caption request as handed to a provider: standing instructions that go
/// in the system slot, and the per-post brief that goes in the user turn.
#[derive(Debug, Clone, Copy)]
pub struct CompletionRequest<'a> {
    pub instructions: &'a str,
    pub brief: &'a str,
}

/// Trait for LLM provider implementations
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Raw reply text. Callers parse the caption JSON out of it.
    async fn generate_completion(&self, request: &CompletionRequest<'_>) -> Result<String>;

    fn name(&self) -> &'static str;
}

/// Build the LLM adapter named by the generator config. `None` for the local
/// template generator.
pub fn provider_from_config(config: &GeneratorConfig) -> Result<Option<Box<dyn LlmProvider>>> {
    let client = Client::new();
    let provider: Box<dyn LlmProvider> = match config.provider_type.as_str() {
        "template" | "" => return Ok(None),
        "ollama" => Box::new(OllamaAdapter::new(client, config)?),
        "openai" | "lmstudio" | "custom_llm" => Box::new(OpenAiAdapter::new(client, config)?),
        "anthropic" => Box::new(AnthropicAdapter::new(client, config)?),
        other => return Err(anyhow!("Unsupported LLM provider type: {}", other)),
    };
    Ok(Some(provider))
}
