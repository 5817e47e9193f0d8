//! Seams between the bot logic and the remote services.
//!
//! Handlers talk to Discord through [`Platform`] and to the completion API
//! through [`Completer`], so tests can swap in mocks.

use async_trait::async_trait;
use discord_client::{
    CommandDeclaration, DiscordClient, DiscordError, Guild, InteractionResponse, Message,
    MessagePayload,
};
use llm_client::{LlmClient, LlmError, Role};

/// Discord operations the bot performs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Platform: Send + Sync {
    /// Initial response to an interaction.
    async fn respond(
        &self,
        interaction_id: &str,
        token: &str,
        response: &InteractionResponse,
    ) -> Result<(), DiscordError>;

    /// Follow-up message after the initial response.
    async fn follow_up(&self, token: &str, payload: &MessagePayload) -> Result<(), DiscordError>;

    /// Post a message to a channel.
    async fn send_message(
        &self,
        channel_id: &str,
        payload: &MessagePayload,
    ) -> Result<(), DiscordError>;

    async fn trigger_typing(&self, channel_id: &str) -> Result<(), DiscordError>;

    /// Most recent messages of a channel, newest first.
    async fn recent_messages(&self, channel_id: &str, limit: u8)
        -> Result<Vec<Message>, DiscordError>;

    async fn guild(&self, guild_id: &str) -> Result<Guild, DiscordError>;

    /// Guilds the bot belongs to.
    async fn guilds(&self) -> Result<Vec<Guild>, DiscordError>;

    /// Replace a guild's commands, returning how many Discord kept.
    async fn overwrite_guild_commands(
        &self,
        guild_id: &str,
        commands: &[CommandDeclaration],
    ) -> Result<usize, DiscordError>;

    /// Replace the global commands, returning how many Discord kept.
    async fn overwrite_global_commands(
        &self,
        commands: &[CommandDeclaration],
    ) -> Result<usize, DiscordError>;
}

#[async_trait]
impl Platform for DiscordClient {
    async fn respond(
        &self,
        interaction_id: &str,
        token: &str,
        response: &InteractionResponse,
    ) -> Result<(), DiscordError> {
        self.create_interaction_response(interaction_id, token, response)
            .await
    }

    async fn follow_up(&self, token: &str, payload: &MessagePayload) -> Result<(), DiscordError> {
        self.create_followup_message(token, payload).await.map(|_| ())
    }

    async fn send_message(
        &self,
        channel_id: &str,
        payload: &MessagePayload,
    ) -> Result<(), DiscordError> {
        self.create_message(channel_id, payload).await.map(|_| ())
    }

    async fn trigger_typing(&self, channel_id: &str) -> Result<(), DiscordError> {
        DiscordClient::trigger_typing(self, channel_id).await
    }

    async fn recent_messages(
        &self,
        channel_id: &str,
        limit: u8,
    ) -> Result<Vec<Message>, DiscordError> {
        self.get_channel_messages(channel_id, limit).await
    }

    async fn guild(&self, guild_id: &str) -> Result<Guild, DiscordError> {
        self.get_guild(guild_id).await
    }

    async fn guilds(&self) -> Result<Vec<Guild>, DiscordError> {
        self.current_user_guilds().await
    }

    async fn overwrite_guild_commands(
        &self,
        guild_id: &str,
        commands: &[CommandDeclaration],
    ) -> Result<usize, DiscordError> {
        self.bulk_overwrite_guild_commands(guild_id, commands)
            .await
            .map(|registered| registered.len())
    }

    async fn overwrite_global_commands(
        &self,
        commands: &[CommandDeclaration],
    ) -> Result<usize, DiscordError> {
        self.bulk_overwrite_global_commands(commands)
            .await
            .map(|registered| registered.len())
    }
}

/// One entry of the conversation context sent to the completion API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationTurn {
    pub role: Role,
    /// Speaker name, restricted to `[A-Za-z0-9_]`; empty for the system turn
    pub speaker_label: String,
    pub content: String,
}

impl ConversationTurn {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            speaker_label: String::new(),
            content: content.into(),
        }
    }
}

/// Produces a reply from a conversation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Completer: Send + Sync {
    async fn complete(&self, turns: Vec<ConversationTurn>) -> Result<String, LlmError>;
}

#[async_trait]
impl Completer for LlmClient {
    async fn complete(&self, turns: Vec<ConversationTurn>) -> Result<String, LlmError> {
        let messages = turns
            .into_iter()
            .map(|turn| {
                llm_client::Message {
                    role: turn.role,
                    content: turn.content,
                    name: None,
                }
                .with_name(turn.speaker_label)
            })
            .collect();

        self.chat(messages).await
    }
}
