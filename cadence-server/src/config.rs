use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Zone used for brands whose timezone column is blank.
    pub default_timezone: String,
    /// Usage entries kept per (brand, subcategory) rotation bucket.
    pub rotation_history_cap: usize,
    /// Skip draft creation for slots that have no eligible asset.
    pub require_assets: bool,
    pub max_hashtags: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            default_timezone: "UTC".to_string(),
            rotation_history_cap: 50,
            require_assets: false,
            max_hashtags: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// "template", "openai", "lmstudio", "custom_llm", "ollama" or "anthropic".
    pub provider_type: String,
    pub endpoint_url: Option<String>,
    pub model_name: Option<String>,
    pub api_key: Option<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            provider_type: "template".to_string(),
            endpoint_url: None,
            model_name: None,
            api_key: None,
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn default_template() -> &'static str {
        r#"[server]
host = "0.0.0.0"
port = 8080

[database]
# URL for the SQLite database. Ensure the directory exists.
url = "sqlite://cadence.db"

[logging]
level = "info"

[scheduler]
default_timezone = "UTC"
rotation_history_cap = 50
# When true, slots without an eligible asset are skipped instead of
# producing a text-only draft.
require_assets = false
max_hashtags = 10

[generator]
# "template" builds placeholder captions locally.
# LLM providers: "openai", "lmstudio", "custom_llm", "ollama", "anthropic"
provider_type = "template"
# endpoint_url = "http://localhost:11434/api/generate"
# model_name = "llama3"
# api_key = ""
"#
    }
}
