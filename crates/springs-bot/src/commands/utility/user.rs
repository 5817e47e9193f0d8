//! /user command.

use crate::commands::{CommandHandler, InteractionContext};
use crate::error::{AppError, AppResult};
use async_trait::async_trait;
use discord_client::CommandDeclaration;

pub struct UserCommand;

#[async_trait]
impl CommandHandler for UserCommand {
    fn declaration(&self) -> CommandDeclaration {
        CommandDeclaration::new("user", "Provides information about the user.")
    }

    async fn execute(&self, ctx: &mut InteractionContext<'_>) -> AppResult<()> {
        let username = ctx
            .author()
            .map(|user| user.username.clone())
            .ok_or_else(|| AppError::Command("interaction has no author".into()))?;

        let joined_at = ctx
            .interaction()
            .member
            .as_ref()
            .and_then(|member| member.joined_at);

        let text = match joined_at {
            Some(joined_at) => format!(
                "This command was run by {}, who joined on {}.",
                username,
                joined_at.format("%B %-d, %Y")
            ),
            None => format!("This command was run by {}.", username),
        };

        ctx.reply(text).await
    }
}
