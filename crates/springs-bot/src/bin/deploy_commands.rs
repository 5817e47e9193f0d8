//! Registers the bot's slash commands with Discord.

use anyhow::Context;
use discord_client::DiscordClient;
use springs_bot::commands::{builtin_categories, publish, CommandRegistry};
use springs_bot::config::Config;
use springs_bot::error::AppResult;
use springs_bot::init_logging;
use tracing::error;

#[tokio::main]
async fn main() -> AppResult<()> {
    let config = Config::load().context("Failed to load configuration")?;
    init_logging(&config.bot.log_level);

    let discord = DiscordClient::new(
        &config.discord.api_base,
        &config.discord.token,
        &config.discord.application_id,
    )
    .context("Failed to create Discord client")?;

    let registry = CommandRegistry::load(builtin_categories());

    if let Err(e) = publish(&registry, &discord, config.discord.guild_id()).await {
        error!("Failed to deploy commands: {}", e);
        return Err(e.into());
    }

    Ok(())
}
