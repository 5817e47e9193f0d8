//! /server command.

use crate::commands::{CommandHandler, InteractionContext};
use crate::error::AppResult;
use async_trait::async_trait;
use discord_client::CommandDeclaration;

pub struct ServerCommand;

#[async_trait]
impl CommandHandler for ServerCommand {
    fn declaration(&self) -> CommandDeclaration {
        CommandDeclaration::new("server", "Provides information about the server.").guild_only()
    }

    async fn execute(&self, ctx: &mut InteractionContext<'_>) -> AppResult<()> {
        let Some(guild_id) = ctx.guild_id().map(str::to_owned) else {
            return ctx
                .reply_ephemeral("This command only works in a server.")
                .await;
        };

        let guild = ctx.platform().guild(&guild_id).await?;

        let text = match guild.approximate_member_count {
            Some(count) => format!("This server is {} and has {} members.", guild.name, count),
            None => format!("This server is {}.", guild.name),
        };

        ctx.reply(text).await
    }
}
