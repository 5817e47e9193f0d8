//! Relays conversations that mention the bot to the completion API.

use super::EventHandler;
use crate::context::BotContext;
use crate::error::AppResult;
use crate::platform::{Completer, ConversationTurn};
use crate::reply::{send_chunked, TypingIndicator};
use async_trait::async_trait;
use discord_client::{EventKind, GatewayEvent, Message, MessagePayload, User};
use llm_client::Role;
use tracing::{debug, error, info};

/// Sent when no completion could be produced.
pub const FAILURE_REPLY: &str = "Sorry, I couldn't come up with a reply right now. Try again later.";

/// Answers mentions of the bot using recent channel history as context.
pub struct MentionRelay;

impl MentionRelay {
    pub fn should_respond(message: &Message, ctx: &BotContext) -> bool {
        let prefix = ctx.settings.ignore_prefix.as_str();

        message.mentions_user(&ctx.bot_user.id)
            && !message.author.bot
            && (prefix.is_empty() || !message.content.starts_with(prefix))
    }

    /// Reply to `message` if it is addressed to the bot. Returns whether a
    /// reply was attempted.
    pub async fn respond(&self, message: &Message, ctx: &BotContext) -> AppResult<bool> {
        let Some(completer) = ctx.completer.as_deref() else {
            return Ok(false);
        };
        if !Self::should_respond(message, ctx) {
            return Ok(false);
        }

        info!(
            "Relaying mention from {} in {}",
            message.author.username, message.channel_id
        );

        let typing = TypingIndicator::start(
            ctx.platform.clone(),
            message.channel_id.clone(),
            ctx.settings.typing_interval,
        );
        let completion = self.complete(message, completer, ctx).await;
        typing.stop();

        match completion {
            Ok(text) => {
                let chunks =
                    send_chunked(ctx.platform.as_ref(), message, &text, ctx.settings.chunk_delay)
                        .await?;
                debug!("Sent reply in {} chunk(s)", chunks);
            }
            Err(e) => {
                error!("Mention relay failed: {}", e);
                ctx.platform
                    .send_message(
                        &message.channel_id,
                        &MessagePayload::text(FAILURE_REPLY).reply_to(message),
                    )
                    .await?;
            }
        }

        Ok(true)
    }

    async fn complete(
        &self,
        message: &Message,
        completer: &dyn Completer,
        ctx: &BotContext,
    ) -> AppResult<String> {
        let history = ctx
            .platform
            .recent_messages(&message.channel_id, ctx.settings.history_limit)
            .await?;

        let turns = build_context(history, &ctx.bot_user, &ctx.settings.system_prompt);
        debug!("Completing with {} turns", turns.len());

        Ok(completer.complete(turns).await?)
    }
}

/// Turn channel history (newest first) into a chronological conversation.
///
/// Only messages that mention the bot or were written by it are kept. The
/// system prompt leads.
pub fn build_context(
    history: Vec<Message>,
    bot_user: &User,
    system_prompt: &str,
) -> Vec<ConversationTurn> {
    let mut turns = vec![ConversationTurn::system(system_prompt)];

    turns.extend(
        history
            .into_iter()
            .rev()
            .filter(|m| m.author.id == bot_user.id || m.mentions_user(&bot_user.id))
            .map(|m| ConversationTurn {
                role: if m.author.id == bot_user.id {
                    Role::Assistant
                } else {
                    Role::User
                },
                speaker_label: speaker_label(&m.author),
                content: strip_mentions(&m.content, bot_user),
            }),
    );

    turns
}

/// The author's username with everything outside `[A-Za-z0-9_]` removed.
pub fn speaker_label(author: &User) -> String {
    author
        .username
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

fn strip_mentions(content: &str, bot_user: &User) -> String {
    content
        .replace(&bot_user.mention(), "")
        .replace(&format!("<@!{}>", bot_user.id), "")
        .trim()
        .to_string()
}

#[async_trait]
impl EventHandler for MentionRelay {
    fn name(&self) -> &'static str {
        "mention_relay"
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
