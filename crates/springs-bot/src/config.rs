//! Application configuration loaded from environment variables.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Discord configuration
    pub discord: DiscordConfig,

    /// LLM relay configuration; the relay is disabled when absent
    #[serde(default)]
    pub llm: Option<LlmConfig>,

    /// Bot behavior configuration
    #[serde(default)]
    pub bot: BotConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DiscordConfig {
    /// Bot token
    pub token: String,

    /// Application (client) id
    pub application_id: String,

    /// Guild whose scoped commands are cleared on deploy
    #[serde(default)]
    pub guild_id: Option<String>,

    /// REST API base URL
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Wait before reconnecting a dropped gateway session
    #[serde(default = "default_reconnect_delay", with = "humantime_serde")]
    pub reconnect_delay: Duration,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// API key
    pub api_key: String,

    /// API base URL
    #[serde(default = "default_llm_url")]
    pub base_url: String,

    /// Model id
    #[serde(default = "default_model")]
    pub model: String,

    /// Request timeout; unset means wait indefinitely
    #[serde(default, with = "humantime_serde")]
    pub timeout: Option<Duration>,

    /// System prompt placed before the channel history
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Number of recent channel messages fetched for context
    #[serde(default = "default_history_limit")]
    pub history_limit: u8,

    /// Messages starting with this prefix never reach the LLM
    #[serde(default = "default_ignore_prefix")]
    pub ignore_prefix: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BotConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Wait before the Nine Springs reply
    #[serde(default = "default_canned_reply_delay", with = "humantime_serde")]
    pub canned_reply_delay: Duration,

    /// Typing indicator period while a completion is pending
    #[serde(default = "default_typing_interval", with = "humantime_serde")]
    pub typing_interval: Duration,

    /// Pause between chunks of a long reply
    #[serde(default = "default_chunk_delay", with = "humantime_serde")]
    pub chunk_delay: Duration,
}

impl DiscordConfig {
    /// Configured guild id, treating an empty value as unset.
    pub fn guild_id(&self) -> Option<&str> {
        self.guild_id.as_deref().filter(|id| !id.is_empty())
    }
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            canned_reply_delay: default_canned_reply_delay(),
            typing_interval: default_typing_interval(),
            chunk_delay: default_chunk_delay(),
        }
    }
}

// Default value functions
fn default_api_base() -> String {
    discord_client::DEFAULT_API_BASE.into()
}

fn default_reconnect_delay() -> Duration {
    Duration::from_secs(5)
}

fn default_llm_url() -> String {
    "https://api.openai.com/v1".into()
}

fn default_model() -> String {
    "gpt-4o-mini".into()
}

pub(crate) fn default_system_prompt() -> String {
    "You are a friendly, slightly sarcastic Discord chatbot hanging out in a golf league server. \
     Keep answers short and conversational."
        .into()
}

pub(crate) fn default_history_limit() -> u8 {
    10
}

pub(crate) fn default_ignore_prefix() -> String {
    "!".into()
}

fn default_log_level() -> String {
    "info".into()
}

pub(crate) fn default_canned_reply_delay() -> Duration {
    Duration::from_secs(2)
}

pub(crate) fn default_typing_interval() -> Duration {
    Duration::from_secs(5)
}

pub(crate) fn default_chunk_delay() -> Duration {
    Duration::from_secs(1)
}

impl Config {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self> {
        // Load .env file if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .separator("__")
                    // Snowflake ids must stay strings.
                    .try_parsing(false),
            )
            .build()
            .context("Failed to build configuration")?;

        Self::from_config(config)
    }

    fn from_config(config: config::Config) -> Result<Self> {
        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}
