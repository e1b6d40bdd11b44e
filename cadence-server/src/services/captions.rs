//! Caption generation for drafts.
//!
//! The scheduler only hands inputs to a [`CaptionGenerator`] and consumes the
//! copy and hashtags it returns. A generator failure never stalls a batch:
//! [`generate_or_placeholder`] falls back to a deterministic caption built from
//! the subcategory description.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::GeneratorConfig;
use crate::models::{Brand, Subcategory};
use crate::services::ai::{self, CompletionRequest, LlmProvider};
use crate::services::recurrence::TimeSlot;
use crate::services::rules::{HashtagRule, ScheduleRule};

/// Brand-wide caption preferences, stored as JSON in `brands.settings`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BrandPreferences {
    #[serde(default)]
    pub tone: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub emoji: bool,
}

impl BrandPreferences {
    pub fn from_brand(brand: &Brand) -> Self {
        match brand.settings.as_deref().map(str::trim) {
            None | Some("") => Self::default(),
            Some(raw) => serde_json::from_str(raw).unwrap_or_else(|e| {
                tracing::warn!("Ignoring malformed settings for brand {}: {}", brand.id, e);
                Self::default()
            }),
        }
    }
}

pub struct CaptionRequest<'a> {
    pub brand: &'a Brand,
    pub rule: &'a ScheduleRule,
    pub subcategory: &'a Subcategory,
    pub prefs: &'a BrandPreferences,
    pub slot: Option<TimeSlot>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Caption {
    pub copy: String,
    #[serde(default)]
    pub hashtags: Vec<String>,
}

#[async_trait]
pub trait CaptionGenerator: Send + Sync {
    async fn generate_caption(&self, request: &CaptionRequest<'_>) -> Result<Caption>;
}

/// Local, deterministic captions. Used when no LLM provider is configured.
pub struct TemplateCaptions;

#[async_trait]
impl CaptionGenerator for TemplateCaptions {
    async fn generate_caption(&self, request: &CaptionRequest<'_>) -> Result<Caption> {
        Ok(placeholder_caption(request.subcategory))
    }
}

/// Standing instructions sent with every caption brief.
pub const CAPTION_INSTRUCTIONS: &str = "You write short social media captions for small brands. \
Keep the copy under 280 characters and match the requested tone and language. \
Respond ONLY with a JSON object of the form {\"copy\": \"...\", \"hashtags\": [\"#tag\"]} \
and no other text.";

/// Captions written by an LLM provider.
pub struct LlmCaptions {
    provider: Box<dyn LlmProvider>,
}

impl LlmCaptions {
    pub fn new(provider: Box<dyn LlmProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl CaptionGenerator for LlmCaptions {
    async fn generate_caption(&self, request: &CaptionRequest<'_>) -> Result<Caption> {
        let brief = build_prompt(request);
        let raw = self
            .provider
            .generate_completion(&CompletionRequest {
                instructions: CAPTION_INSTRUCTIONS,
                brief: &brief,
            })
            .await?;
        parse_completion(&raw)
    }
}

pub fn generator_from_config(config: &GeneratorConfig) -> Result<Arc<dyn CaptionGenerator>> {
    match ai::provider_from_config(config)? {
        Some(provider) => {
            tracing::info!("Captions generated by the {} provider", provider.name());
            Ok(Arc::new(LlmCaptions::new(provider)))
        }
        None => {
            tracing::info!("Captions generated from local templates");
            Ok(Arc::new(TemplateCaptions))
        }
    }
}

/// Deterministic caption derived from the subcategory.
pub fn placeholder_caption(subcategory: &Subcategory) -> Caption {
    let copy = match subcategory.description.as_deref().map(str::trim) {
        Some(description) if !description.is_empty() => description.to_string(),
        _ => format!("{} - new post coming up.", subcategory.name),
    };
    Caption {
        copy,
        hashtags: subcategory_hashtags(subcategory),
    }
}

/// Run the generator, substituting the placeholder caption when it fails.
/// The second value is the failure, if any, for the caller to log.
pub async fn generate_or_placeholder(
    generator: &dyn CaptionGenerator,
    request: &CaptionRequest<'_>,
) -> (Caption, Option<anyhow::Error>) {
    match generator.generate_caption(request).await {
        Ok(caption) if !caption.copy.trim().is_empty() => (caption, None),
        Ok(_) => (
            placeholder_caption(request.subcategory),
            Some(anyhow!("generator returned empty copy")),
        ),
        Err(e) => (placeholder_caption(request.subcategory), Some(e)),
    }
}

/// Final hashtag list for a draft according to the rule's hashtag policy.
pub fn apply_hashtag_rule(
    rule: &HashtagRule,
    generated: &[String],
    subcategory: &Subcategory,
    max_hashtags: usize,
) -> Vec<String> {
    let (source, limit): (Vec<String>, usize) = match rule {
        HashtagRule::None => (Vec::new(), 0),
        HashtagRule::Fixed { tags } => (tags.clone(), max_hashtags),
        HashtagRule::Subcategory => (subcategory_hashtags(subcategory), max_hashtags),
        HashtagRule::Generated { max } => (
            generated.to_vec(),
            max.map_or(max_hashtags, |m| m.min(max_hashtags)),
        ),
    };
    normalize_hashtags(source).into_iter().take(limit).collect()
}

fn subcategory_hashtags(subcategory: &Subcategory) -> Vec<String> {
    let raw = match subcategory.default_hashtags.as_deref().map(str::trim) {
        None | Some("") => return Vec::new(),
        Some(raw) => raw,
    };
    let tags: Vec<String> = if raw.starts_with('[') {
        serde_json::from_str(raw).unwrap_or_default()
    } else {
        raw.split([',', ' ']).map(str::to_string).collect()
    };
    normalize_hashtags(tags)
}

/// `#`-prefixed, whitespace-free, case-insensitively unique.
pub fn normalize_hashtags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let body: String = tag
            .trim()
            .trim_start_matches('#')
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        if body.is_empty() {
            continue;
        }
        let tag = format!("#{}", body);
        if !out.iter().any(|t| t.eq_ignore_ascii_case(&tag)) {
            out.push(tag);
        }
    }
    out
}

fn build_prompt(request: &CaptionRequest<'_>) -> String {
    let mut prompt = format!(
        "Write a social media caption for the brand \"{}\".\nTopic: {}\n",
        request.brand.name, request.subcategory.name
    );
    if let Some(description) = &request.subcategory.description {
        prompt.push_str(&format!("Topic details: {}\n", description));
    }
    prompt.push_str(&format!("Channels: {}\n", request.rule.channels.join(", ")));
    if let Some(slot) = request.slot {
        prompt.push_str(&format!("Publishing on: {}\n", slot));
    }

    let tone = request
        .rule
        .settings
        .tone
        .as_deref()
        .or(request.prefs.tone.as_deref());
    if let Some(tone) = tone {
        prompt.push_str(&format!("Tone: {}\n", tone));
    }
    let language = request
        .rule
        .settings
        .language
        .as_deref()
        .or(request.prefs.language.as_deref());
    if let Some(language) = language {
        prompt.push_str(&format!("Language: {}\n", language));
    }
    if let Some(cta) = &request.rule.settings.cta {
        prompt.push_str(&format!("Call to action: {}\n", cta));
    }
    if request.prefs.emoji {
        prompt.push_str("Emoji are welcome.\n");
    }
    prompt
}

/// Accepts the requested JSON (optionally inside a code fence); anything else
/// is taken as plain copy with inline `#tags` lifted out.
fn parse_completion(raw: &str) -> Result<Caption> {
    let trimmed = raw.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|s| s.strip_suffix("```"))
        .unwrap_or(trimmed)
        .trim();

    if let Ok(caption) = serde_json::from_str::<Caption>(unfenced) {
        return Ok(caption);
    }

    if unfenced.is_empty() {
        return Err(anyhow!("empty completion"));
    }

    let hashtags = unfenced
        .split_whitespace()
        .filter(|w| w.starts_with('#') && w.len() > 1)
        .map(str::to_string)
        .collect();
    Ok(Caption {
        copy: unfenced.to_string(),
        hashtags,
    })
}
