//! Registers the command set with Discord.

use super::CommandRegistry;
use crate::platform::Platform;
use discord_client::DiscordError;
use tracing::{debug, info};

/// Replace the bot's commands with the registry's declarations.
///
/// Guild-scoped commands are cleared first: the configured guild when one is
/// given, otherwise every guild the bot is in. The full set is then
/// registered globally. The first failure aborts the publish.
pub async fn publish(
    registry: &CommandRegistry,
    platform: &dyn Platform,
    guild_id: Option<&str>,
) -> Result<usize, DiscordError> {
    let declarations = registry.declarations();

    info!(
        "Started refreshing {} application (/) commands.",
        declarations.len()
    );

    match guild_id {
        Some(guild_id) => clear_guild(platform, guild_id).await?,
        None => {
            for guild in platform.guilds().await? {
                clear_guild(platform, &guild.id).await?;
            }
        }
    }

    let registered = platform.overwrite_global_commands(&declarations).await?;

    info!(
        "Successfully reloaded {} application (/) commands.",
        registered
    );
    Ok(registered)
}

async fn clear_guild(platform: &dyn Platform, guild_id: &str) -> Result<(), DiscordError> {
    platform.overwrite_guild_commands(guild_id, &[]).await?;
    debug!("Cleared guild commands for {}", guild_id);
    Ok(())
}
