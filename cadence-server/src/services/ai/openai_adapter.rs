//! OpenAI-compatible chat completions (OpenAI, LM Studio and similar local
//! servers). Captions are requested in JSON mode.

use super::{CompletionRequest, LlmProvider, CAPTION_MAX_TOKENS};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::GeneratorConfig;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f32,
    /// Omitted for servers that reject `response_format`.
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

pub struct OpenAiAdapter {
    client: Client,
    endpoint_url: String,
    model: String,
    api_key: Option<String>,
    json_mode: bool,
}

impl OpenAiAdapter {
    pub fn new(client: Client, config: &GeneratorConfig) -> Result<Self> {
        let endpoint_url = config
            .endpoint_url
            .clone()
            .unwrap_or_else(|| "https://api.openai.com/v1/chat/completions".to_string());

        let model = config
            .model_name
            .clone()
            .unwrap_or_else(|| "gpt-4o-mini".to_string());

        // Local servers usually run without a key and without JSON mode.
        let api_key = config.api_key.clone().filter(|k| !k.is_empty());
        let json_mode = config.provider_type == "openai";

        Ok(Self {
            client,
            endpoint_url,
            model,
            api_key,
            json_mode,
        })
    }

    fn chat_request<'a>(&'a self, request: &CompletionRequest<'a>) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: request.instructions,
                },
                ChatMessage {
                    role: "user",
                    content: request.brief,
                },
            ],
            max_tokens: CAPTION_MAX_TOKENS,
            temperature: 0.8,
            response_format: self.json_mode.then_some(ResponseFormat {
                kind: "json_object",
            }),
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiAdapter {
    async fn generate_completion(&self, request: &CompletionRequest<'_>) -> Result<String> {
        let mut call = self
            .client
            .post(&self.endpoint_url)
            .json(&self.chat_request(request));
        if let Some(key) = &self.api_key {
            call = call.bearer_auth(key);
        }
        let res = call.send().await?;

        if !res.status().is_success() {
            let status = res.status();
            let error_text = res.text().await?;
            return Err(anyhow!("caption request failed ({}): {}", status, error_text));
        }

        let raw_text = res.text().await?;
        let body: ChatResponse = serde_json::from_str(&raw_text)
            .map_err(|e| anyhow!("unreadable chat completion: {}. Body: {}", e, raw_text))?;

        body.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| anyhow!("chat completion carried no caption"))
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}
