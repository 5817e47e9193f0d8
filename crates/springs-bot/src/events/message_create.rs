//! The Nine Springs reply.

use super::EventHandler;
use crate::context::BotContext;
use crate::error::AppResult;
use async_trait::async_trait;
use discord_client::{EventKind, GatewayEvent, Message, MessagePayload};
use rand::Rng;
use tokio::time::sleep;
use tracing::debug;

/// Case-insensitive phrase that triggers a canned reply.
pub const TRIGGER_PHRASE: &str = "nine springs";

pub const CANNED_REPLIES: [&str; 5] = [
    "Cash is king!",
    "Smile, you're on camera!",
    "I'm Rob Brose and Nine Springs is the best course ever",
    "Five dollars a round, not 2 or 3",
    "You still need to pay the greens fee on top of the tournament fee",
];

/// Replies to any mention of Nine Springs with a random one-liner.
pub struct CannedReply;

impl CannedReply {
    /// Messages addressed to the bot belong to the mention relay.
    pub fn should_reply(message: &Message, bot_id: &str) -> bool {
        !message.mentions_user(bot_id)
            && !message.author.bot
            && message.content.to_lowercase().contains(TRIGGER_PHRASE)
    }

    pub async fn respond(&self, message: &Message, ctx: &BotContext) -> AppResult<bool> {
        if !Self::should_reply(message, &ctx.bot_user.id) {
            return Ok(false);
        }

        sleep(ctx.settings.canned_reply_delay).await;

        let reply = pick_reply();
        debug!("Nine Springs reply in {}: {}", message.channel_id, reply);
        ctx.platform
            .send_message(
                &message.channel_id,
                &MessagePayload::text(reply).reply_to(message),
            )
            .await?;
        Ok(true)
    }
}

fn pick_reply() -> &'static str {
    CANNED_REPLIES[rand::thread_rng().gen_range(0..CANNED_REPLIES.len())]
}

#[async_trait]
impl EventHandler for CannedReply {
    fn name(&self) -> &'static str {
        "canned_reply"
    }

    fn event(&self) -> EventKind {
        EventKind::MessageCreate
    }

    async fn execute(&self, event: &GatewayEvent, ctx: &BotContext) -> AppResult<()> {
        if let GatewayEvent::MessageCreate(message) = event {
            self.respond(message, ctx).await?;
        }
        Ok(())
    }
}
