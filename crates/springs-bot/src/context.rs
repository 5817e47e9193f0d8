//! Shared state handed to every event handler.

use crate::commands::CommandRegistry;
use crate::config::{self, Config};
use crate::platform::{Completer, Platform};
use discord_client::User;
use std::sync::Arc;
use std::time::Duration;

/// Timings and relay knobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplySettings {
    pub canned_reply_delay: Duration,
    pub typing_interval: Duration,
    pub chunk_delay: Duration,
    pub history_limit: u8,
    pub ignore_prefix: String,
    pub system_prompt: String,
}

impl Default for ReplySettings {
    fn default() -> Self {
        Self {
            canned_reply_delay: config::default_canned_reply_delay(),
            typing_interval: config::default_typing_interval(),
            chunk_delay: config::default_chunk_delay(),
            history_limit: config::default_history_limit(),
            ignore_prefix: config::default_ignore_prefix(),
            system_prompt: config::default_system_prompt(),
        }
    }
}

impl ReplySettings {
    pub fn from_config(config: &Config) -> Self {
        let mut settings = Self {
            canned_reply_delay: config.bot.canned_reply_delay,
            typing_interval: config.bot.typing_interval,
            chunk_delay: config.bot.chunk_delay,
            ..Self::default()
        };

        if let Some(llm) = &config.llm {
            settings.history_limit = llm.history_limit;
            settings.ignore_prefix = llm.ignore_prefix.clone();
            settings.system_prompt = llm.system_prompt.clone();
        }

        settings
    }
}

/// Everything a handler needs, built once at startup.
#[derive(Clone)]
pub struct BotContext {
    pub platform: Arc<dyn Platform>,
    pub commands: Arc<CommandRegistry>,
    /// Absent when no LLM is configured
    pub completer: Option<Arc<dyn Completer>>,
    /// The bot's own account
    pub bot_user: User,
    pub settings: ReplySettings,
}

impl BotContext {
    pub fn new(platform: Arc<dyn Platform>, commands: Arc<CommandRegistry>, bot_user: User) -> Self {
        Self {
            platform,
            commands,
            completer: None,
            bot_user,
            settings: ReplySettings::default(),
        }
    }

    pub fn with_completer(mut self, completer: Arc<dyn Completer>) -> Self {
        self.completer = Some(completer);
        self
    }

    pub fn with_settings(mut self, settings: ReplySettings) -> Self {
        self.settings = settings;
        self
    }
}
