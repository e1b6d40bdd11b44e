use super::{CompletionRequest, LlmProvider, CAPTION_MAX_TOKENS};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use crate::config::GeneratorConfig;

pub struct AnthropicAdapter {
    client: Client,
    endpoint_url: String,
    api_key: String,
    model: String,
}

impl AnthropicAdapter {
    pub fn new(client: Client, config: &GeneratorConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| anyhow!("Anthropic provider API key is missing"))?;

        let endpoint_url = config
            .endpoint_url
            .clone()
            .unwrap_or_else(|| "https://api.anthropic.com/v1/messages".to_string());

        let model = config
            .model_name
            .clone()
            .unwrap_or_else(|| "claude-3-5-haiku-latest".to_string());

        Ok(Self {
            client,
            endpoint_url,
            api_key,
            model,
        })
    }

    /// The brief is the only user turn. Prefilling the assistant turn with
    /// `{` keeps the reply on the JSON object.
    fn payload(&self, request: &CompletionRequest<'_>) -> Value {
        json!({
            "model": self.model,
            "max_tokens": CAPTION_MAX_TOKENS,
            "system": request.instructions,
            "messages": [
                { "role": "user", "content": request.brief },
                { "role": "assistant", "content": "{" }
            ]
        })
    }
}

/// Joins the text blocks of a messages reply and restores the prefilled `{`.
fn reply_text(body: &Value) -> Result<String> {
    let text: String = body["content"]
        .as_array()
        .ok_or_else(|| anyhow!("messages reply has no content"))?
        .iter()
        .filter(|block| block["type"] == "text")
        .filter_map(|block| block["text"].as_str())
        .collect();

    let text = text.trim();
    if text.is_empty() {
        return Err(anyhow!("messages reply carried no caption"));
    }
    if text.starts_with('{') {
        Ok(text.to_string())
    } else {
        Ok(format!("{{{}", text))
    }
}

#[async_trait]
impl LlmProvider for AnthropicAdapter {
    async fn generate_completion(&self, request: &CompletionRequest<'_>) -> Result<String> {
        let res = self
            .client
            .post(&self.endpoint_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .json(&self.payload(request))
            .send()
            .await?;

        if !res.status().is_success() {
            let status = res.status();
            let error_text = res.text().await?;
            return Err(anyhow!("caption request failed ({}): {}", status, error_text));
        }

        let body: Value = res.json().await?;
        reply_text(&body)
    }

    fn name(&self) -> &'static str {
        "anthropic"
    }
}
