//! Nine Springs bot - Main entry point.

use anyhow::Context;
use discord_client::{intents, DiscordClient, Gateway};
use llm_client::LlmClient;
use springs_bot::commands::{builtin_categories, CommandRegistry};
use springs_bot::config::Config;
use springs_bot::context::{BotContext, ReplySettings};
use springs_bot::error::AppResult;
use springs_bot::events::{builtin_handlers, EventDispatcher};
use springs_bot::init_logging;
use std::sync::Arc;
use tokio::signal;
use tokio_stream::StreamExt;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> AppResult<()> {
    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    // Initialize logging
    init_logging(&config.bot.log_level);

    info!("Starting Nine Springs bot...");

    let discord = DiscordClient::new(
        &config.discord.api_base,
        &config.discord.token,
        &config.discord.application_id,
    )
    .context("Failed to create Discord client")?;

    // Verifies the token before opening the gateway.
    let bot_user = discord
        .current_user()
        .await
        .context("Failed to log in to Discord")?;
    info!("Authenticated as {}", bot_user.tag());

    let commands = Arc::new(CommandRegistry::load(builtin_categories()));
    info!("Registered {} slash commands", commands.len());

    let mut ctx = BotContext::new(Arc::new(discord.clone()), commands, bot_user)
        .with_settings(ReplySettings::from_config(&config));

    match &config.llm {
        Some(llm) => {
            let client = LlmClient::new(&llm.api_key, &llm.base_url, &llm.model, llm.timeout)
                .context("Failed to create LLM client")?;
            info!("LLM relay enabled - Model: {}", client.model());
            ctx = ctx.with_completer(Arc::new(client));
        }
        None => warn!("LLM__API_KEY not set - mention relay disabled"),
    }

    let ctx = Arc::new(ctx);
    let dispatcher = Arc::new(EventDispatcher::new(builtin_handlers(
        ctx.completer.is_some(),
    )));
    info!("Subscribed {} event handlers", dispatcher.len());

    let gateway = Gateway::new(discord, intents::DEFAULT, config.discord.reconnect_delay);
    let mut events = Box::pin(gateway.stream());

    info!("Listening for events...");

    // Main event loop
    loop {
        tokio::select! {
            Some(event) = events.next() => {
                let dispatcher = dispatcher.clone();
                let ctx = ctx.clone();
                tokio::spawn(async move {
                    dispatcher.dispatch(&event, &ctx).await;
                });
            }
            _ = signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    info!("Shutting down...");
    Ok(())
}
