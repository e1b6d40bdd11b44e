use super::{CompletionRequest, LlmProvider, CAPTION_MAX_TOKENS};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::GeneratorConfig;

/// `/api/generate` with the instructions in `system` and JSON output forced.
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    system: &'a str,
    prompt: &'a str,
    stream: bool,
    format: &'static str,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

pub struct OllamaAdapter {
    client: Client,
    endpoint_url: String,
    model: String,
}

impl OllamaAdapter {
    pub fn new(client: Client, config: &GeneratorConfig) -> Result<Self> {
        let endpoint_url = config
            .endpoint_url
            .clone()
            .unwrap_or_else(|| "http://localhost:11434/api/generate".to_string());

        let model = config
            .model_name
            .clone()
            .unwrap_or_else(|| "llama3".to_string());

        Ok(Self {
            client,
            endpoint_url,
            model,
        })
    }

    fn generate_request<'a>(&'a self, request: &CompletionRequest<'a>) -> GenerateRequest<'a> {
        GenerateRequest {
            model: &self.model,
            system: request.instructions,
            prompt: request.brief,
            stream: false,
            format: "json",
            options: GenerateOptions {
                num_predict: CAPTION_MAX_TOKENS,
            },
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaAdapter {
    async fn generate_completion(&self, request: &CompletionRequest<'_>) -> Result<String> {
        let res = self
            .client
            .post(&self.endpoint_url)
            .json(&self.generate_request(request))
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(anyhow!("caption request failed ({})", res.status()));
        }

        let body: GenerateResponse = res.json().await?;
        Ok(body.response)
    }

    fn name(&self) -> &'static str {
        "ollama"
    }
}
