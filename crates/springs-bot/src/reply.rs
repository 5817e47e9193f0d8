//! Sending long replies and keeping the typing indicator alive.

use crate::platform::Platform;
use discord_client::{DiscordError, Message, MessagePayload};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval, sleep, MissedTickBehavior};
use tracing::debug;

/// Discord's message length limit, in characters.
pub const MESSAGE_CHUNK_SIZE: usize = 2000;

const MIN_TYPING_INTERVAL: Duration = Duration::from_secs(1);

/// Split `text` into pieces of at most `size` characters.
pub fn split_chunks(text: &str, size: usize) -> Vec<String> {
    let size = size.max(1);
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(size).map(|c| c.iter().collect()).collect()
}

/// Reply to `original` with `text`, one message per chunk, pausing `delay`
/// between chunks.
pub async fn send_chunked(
    platform: &dyn Platform,
    original: &Message,
    text: &str,
    delay: Duration,
) -> Result<usize, DiscordError> {
    let chunks = split_chunks(text, MESSAGE_CHUNK_SIZE);

    for (i, chunk) in chunks.iter().enumerate() {
        if i > 0 {
            sleep(delay).await;
        }
        platform
            .send_message(
                &original.channel_id,
                &MessagePayload::text(chunk.as_str()).reply_to(original),
            )
            .await?;
    }

    Ok(chunks.len())
}

/// Shows "Bot is typing..." in a channel until dropped.
///
/// The indicator is sent right away and then every `period`.
pub struct TypingIndicator {
    task: JoinHandle<()>,
}

impl TypingIndicator {
    pub fn start(platform: Arc<dyn Platform>, channel_id: String, period: Duration) -> Self {
        let task = tokio::spawn(async move {
            let mut ticker = interval(period.max(MIN_TYPING_INTERVAL));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                if let Err(e) = platform.trigger_typing(&channel_id).await {
                    debug!("Typing indicator failed in {}: {}", channel_id, e);
                }
            }
        });

        Self { task }
    }

    pub fn stop(self) {
        self.task.abort();
    }
}

impl Drop for TypingIndicator {
    fn drop(&mut self) {
        self.task.abort();
    }
}
