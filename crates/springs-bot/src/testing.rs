//! Fixtures and fakes shared by the unit tests.

use crate::commands::{builtin_categories, CommandRegistry};
use crate::context::{BotContext, ReplySettings};
use crate::platform::{Completer, ConversationTurn, Platform};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use discord_client::{
    CommandData, CommandDeclaration, DiscordError, Guild, GuildMember, Interaction,
    InteractionResponse, Message, MessagePayload, User, COMMAND_CHAT_INPUT,
    INTERACTION_APPLICATION_COMMAND,
};
use llm_client::LlmError;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;
use tracing_subscriber::fmt::MakeWriter;

pub const BOT_ID: &str = "bot-1";

pub fn user(id: &str, username: &str, bot: bool) -> User {
    User {
        id: id.into(),
        username: username.into(),
        global_name: None,
        discriminator: None,
        bot,
    }
}

pub fn bot_user() -> User {
    user(BOT_ID, "SpringsBot", true)
}

pub fn guild(id: &str, name: &str, members: Option<u64>) -> Guild {
    Guild {
        id: id.into(),
        name: name.into(),
        approximate_member_count: members,
    }
}

pub fn channel_message(id: &str, author: User, content: &str, mentions: &[User]) -> Message {
    Message {
        id: id.into(),
        channel_id: "channel-1".into(),
        guild_id: Some("guild-1".into()),
        author,
        content: content.into(),
        timestamp: Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        mentions: mentions.to_vec(),
    }
}

/// Slash command invocation by "golfer". With a guild id the user arrives as
/// a member who joined on March 4, 2024; without one as a DM user.
pub fn command_interaction(name: &str, guild_id: Option<&str>) -> Interaction {
    let golfer = user("user-1", "golfer", false);
    let (member, dm_user) = match guild_id {
        Some(_) => (
            Some(GuildMember {
                user: Some(golfer),
                nick: None,
                joined_at: Some(Utc.with_ymd_and_hms(2024, 3, 4, 18, 30, 0).unwrap()),
            }),
            None,
        ),
        None => (None, Some(golfer)),
    };

    Interaction {
        id: "interaction-1".into(),
        application_id: "app-1".into(),
        kind: INTERACTION_APPLICATION_COMMAND,
        data: Some(CommandData {
            id: "command-1".into(),
            name: name.into(),
            kind: COMMAND_CHAT_INPUT,
            options: Vec::new(),
        }),
        guild_id: guild_id.map(Into::into),
        channel_id: Some("channel-1".into()),
        member,
        user: dm_user,
        token: "token-1".into(),
    }
}

pub fn dm_interaction(name: &str) -> Interaction {
    command_interaction(name, None)
}

pub fn test_context(platform: Arc<dyn Platform>) -> BotContext {
    BotContext::new(
        platform,
        Arc::new(CommandRegistry::load(builtin_categories())),
        bot_user(),
    )
    .with_settings(ReplySettings::default())
}

/// A message sent through [`RecordingPlatform`].
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub channel_id: String,
    pub payload: MessagePayload,
    pub at: Instant,
}

/// In-memory platform that records what the bot sends.
#[derive(Default)]
pub struct RecordingPlatform {
    sent: Mutex<Vec<SentMessage>>,
    typing: Mutex<Vec<Instant>>,
    history: Mutex<Vec<Message>>,
    fail_history: bool,
}

impl RecordingPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Channel history, newest first.
    pub fn with_history(self, history: Vec<Message>) -> Self {
        *self.history.lock().unwrap() = history;
        self
    }

    pub fn failing_history(mut self) -> Self {
        self.fail_history = true;
        self
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|m| m.payload.content)
            .collect()
    }

    pub fn typing_count(&self) -> usize {
        self.typing.lock().unwrap().len()
    }
}

#[async_trait]
impl Platform for RecordingPlatform {
    async fn respond(
        &self,
        _interaction_id: &str,
        _token: &str,
        _response: &InteractionResponse,
    ) -> Result<(), DiscordError> {
        Ok(())
    }

    async fn follow_up(&self, _token: &str, _payload: &MessagePayload) -> Result<(), DiscordError> {
        Ok(())
    }

    async fn send_message(
        &self,
        channel_id: &str,
        payload: &MessagePayload,
    ) -> Result<(), DiscordError> {
        self.sent.lock().unwrap().push(SentMessage {
            channel_id: channel_id.into(),
            payload: payload.clone(),
            at: Instant::now(),
        });
        Ok(())
    }

    async fn trigger_typing(&self, _channel_id: &str) -> Result<(), DiscordError> {
        self.typing.lock().unwrap().push(Instant::now());
        Ok(())
    }

    async fn recent_messages(
        &self,
        _channel_id: &str,
        limit: u8,
    ) -> Result<Vec<Message>, DiscordError> {
        if self.fail_history {
            return Err(DiscordError::Api {
                status: 403,
                message: "Missing Access".into(),
            });
        }
        let history = self.history.lock().unwrap();
        Ok(history.iter().take(limit as usize).cloned().collect())
    }

    async fn guild(&self, guild_id: &str) -> Result<Guild, DiscordError> {
        Ok(guild(guild_id, "Test Guild", Some(1)))
    }

    async fn guilds(&self) -> Result<Vec<Guild>, DiscordError> {
        Ok(Vec::new())
    }

    async fn overwrite_guild_commands(
        &self,
        _guild_id: &str,
        commands: &[CommandDeclaration],
    ) -> Result<usize, DiscordError> {
        Ok(commands.len())
    }

    async fn overwrite_global_commands(
        &self,
        commands: &[CommandDeclaration],
    ) -> Result<usize, DiscordError> {
        Ok(commands.len())
    }
}

/// Completer that answers after a fixed delay.
pub struct FakeCompleter {
    delay: Duration,
    reply: Option<String>,
    seen: Mutex<Vec<Vec<ConversationTurn>>>,
}

impl FakeCompleter {
    pub fn replying(reply: impl Into<String>, delay: Duration) -> Self {
        Self {
            delay,
            reply: Some(reply.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(delay: Duration) -> Self {
        Self {
            delay,
            reply: None,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }
}

#[async_trait]
impl Completer for FakeCompleter {
    async fn complete(&self, turns: Vec<ConversationTurn>) -> Result<String, LlmError> {
        self.seen.lock().unwrap().push(turns);
        tokio::time::sleep(self.delay).await;
        self.reply.clone().ok_or(LlmError::Api {
            status: 503,
            message: "overloaded".into(),
        })
    }
}

/// Log lines captured from a scoped subscriber.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// Number of lines logged at `level` ("ERROR", "WARN", ...).
    pub fn count(&self, level: &str) -> usize {
        self.contents()
            .lines()
            .filter(|line| line.split_whitespace().any(|word| word == level))
            .count()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Capture everything logged on this thread until the guard drops.
pub fn capture_logs() -> (LogBuffer, tracing::subscriber::DefaultGuard) {
    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::TRACE)
        .finish();

    (buffer, tracing::subscriber::set_default(subscriber))
}
