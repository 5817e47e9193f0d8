//! Slash command handlers.

mod publisher;
mod registry;
pub mod utility;

pub use publisher::publish;
pub use registry::{validate_declaration, CommandCategory, CommandRegistry, RegisteredCommand};

use crate::error::AppResult;
use crate::platform::Platform;
use async_trait::async_trait;
use discord_client::{
    CommandDeclaration, Interaction, InteractionResponse, MessagePayload, User,
};
use tracing::debug;

/// Command handler trait.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Declaration registered with Discord. Its name is the dispatch key.
    fn declaration(&self) -> CommandDeclaration;

    /// Execute the command.
    async fn execute(&self, ctx: &mut InteractionContext<'_>) -> AppResult<()>;
}

/// An interaction being handled, with its acknowledgement state.
pub struct InteractionContext<'a> {
    interaction: &'a Interaction,
    platform: &'a dyn Platform,
    replied: bool,
    deferred: bool,
}

impl<'a> InteractionContext<'a> {
    pub fn new(interaction: &'a Interaction, platform: &'a dyn Platform) -> Self {
        Self {
            interaction,
            platform,
            replied: false,
            deferred: false,
        }
    }

    pub fn interaction(&self) -> &Interaction {
        self.interaction
    }

    pub fn platform(&self) -> &dyn Platform {
        self.platform
    }

    /// Who invoked the command.
    pub fn author(&self) -> Option<&User> {
        self.interaction.author()
    }

    pub fn guild_id(&self) -> Option<&str> {
        self.interaction.guild_id.as_deref()
    }

    pub fn replied(&self) -> bool {
        self.replied
    }

    pub fn deferred(&self) -> bool {
        self.deferred
    }

    /// Whether Discord has already received an initial response.
    pub fn is_acknowledged(&self) -> bool {
        self.replied || self.deferred
    }

    pub async fn reply(&mut self, content: impl Into<String> + Send) -> AppResult<()> {
        self.respond_with(MessagePayload::text(content)).await
    }

    pub async fn reply_ephemeral(&mut self, content: impl Into<String> + Send) -> AppResult<()> {
        self.respond_with(MessagePayload::text(content).ephemeral())
            .await
    }

    /// Send `payload` as the initial response, or as a follow-up once the
    /// interaction is acknowledged.
    pub async fn respond_with(&mut self, payload: MessagePayload) -> AppResult<()> {
        if self.is_acknowledged() {
            return self.follow_up(payload).await;
        }

        self.platform
            .respond(
                &self.interaction.id,
                &self.interaction.token,
                &InteractionResponse::message(payload),
            )
            .await?;
        self.replied = true;
        Ok(())
    }

    /// Acknowledge now and answer later with [`Self::follow_up`].
    pub async fn defer(&mut self, ephemeral: bool) -> AppResult<()> {
        if self.is_acknowledged() {
            debug!("Interaction {} already acknowledged", self.interaction.id);
            return Ok(());
        }

        self.platform
            .respond(
                &self.interaction.id,
                &self.interaction.token,
                &InteractionResponse::deferred(ephemeral),
            )
            .await?;
        self.deferred = true;
        Ok(())
    }

    pub async fn follow_up(&mut self, payload: MessagePayload) -> AppResult<()> {
        self.platform
            .follow_up(&self.interaction.token, &payload)
            .await?;
        self.replied = true;
        Ok(())
    }
}

/// Every command the bot ships with, grouped by category.
pub fn builtin_categories() -> Vec<CommandCategory> {
    vec![utility::category()]
}
