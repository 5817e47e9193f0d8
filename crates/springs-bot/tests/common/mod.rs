//! Common test utilities for integration tests.

#![allow(dead_code)]

use discord_client::{DiscordClient, User};
use llm_client::LlmClient;
use serde_json::{json, Value};
use springs_bot::commands::{builtin_categories, CommandRegistry};
use springs_bot::context::{BotContext, ReplySettings};
use std::sync::Arc;
use std::time::Duration;
use wiremock::MockServer;

pub const BOT_ID: &str = "900000000000000001";
pub const CHANNEL_ID: &str = "700000000000000001";

/// Create a Discord client configured for a mock server.
pub fn test_discord_client(mock_server: &MockServer) -> DiscordClient {
    DiscordClient::new(mock_server.uri(), "test-token", "app-1").unwrap()
}

/// Create an LLM client configured for a mock server.
pub fn test_llm_client(mock_server: &MockServer) -> LlmClient {
    LlmClient::new(
        "test-api-key",
        mock_server.uri(),
        "test-model",
        Some(Duration::from_secs(5)),
    )
    .unwrap()
}

pub fn bot_user() -> User {
    serde_json::from_value(user_json(BOT_ID, "SpringsBot", true)).unwrap()
}

/// Context with short delays so flows finish quickly in real time.
pub fn test_context(discord: DiscordClient) -> BotContext {
    let settings = ReplySettings {
        canned_reply_delay: Duration::from_millis(20),
        chunk_delay: Duration::from_millis(10),
        ..ReplySettings::default()
    };

    BotContext::new(
        Arc::new(discord),
        Arc::new(CommandRegistry::load(builtin_categories())),
        bot_user(),
    )
    .with_settings(settings)
}

pub fn user_json(id: &str, username: &str, bot: bool) -> Value {
    json!({
        "id": id,
        "username": username,
        "global_name": null,
        "discriminator": "0",
        "bot": bot
    })
}

pub fn message_json(id: &str, author: Value, content: &str, mentions: Vec<Value>) -> Value {
    json!({
        "id": id,
        "channel_id": CHANNEL_ID,
        "guild_id": "800000000000000001",
        "author": author,
        "content": content,
        "timestamp": "2024-06-01T12:00:00.000000+00:00",
        "mentions": mentions,
        "type": 0
    })
}

pub fn completion_json(content: &str) -> Value {
    json!({
        "id": "chatcmpl-123",
        "object": "chat.completion",
        "created": 1677652288,
        "model": "test-model",
        "choices": [{
            "index": 0,
            "message": { "role": "assistant", "content": content },
            "finish_reason": "stop"
        }]
    })
}
