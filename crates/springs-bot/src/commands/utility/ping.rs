//! /ping command.

use crate::commands::{CommandHandler, InteractionContext};
use crate::error::AppResult;
use async_trait::async_trait;
use discord_client::CommandDeclaration;

pub struct PingCommand;

#[async_trait]
impl CommandHandler for PingCommand {
    fn declaration(&self) -> CommandDeclaration {
        CommandDeclaration::new("ping", "Replies with Pong!")
    }

    async fn execute(&self, ctx: &mut InteractionContext<'_>) -> AppResult<()> {
        ctx.reply("Pong!").await
    }
}
