//! Discord API types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Gateway intent bits.
pub mod intents {
    pub const GUILDS: u64 = 1 << 0;
    pub const GUILD_MESSAGES: u64 = 1 << 9;
    pub const MESSAGE_CONTENT: u64 = 1 << 15;

    /// Guild metadata, guild messages and their content.
    pub const DEFAULT: u64 = GUILDS | GUILD_MESSAGES | MESSAGE_CONTENT;
}

/// Application command option types.
pub mod option_type {
    pub const STRING: u8 = 3;
    pub const INTEGER: u8 = 4;
    pub const BOOLEAN: u8 = 5;
    pub const USER: u8 = 6;
}

/// Interaction type for application commands.
pub const INTERACTION_APPLICATION_COMMAND: u8 = 2;

/// Application command type for slash commands.
pub const COMMAND_CHAT_INPUT: u8 = 1;

/// Interaction callback: respond with a message.
pub const RESPONSE_CHANNEL_MESSAGE: u8 = 4;

/// Interaction callback: acknowledge now, follow up later.
pub const RESPONSE_DEFERRED_CHANNEL_MESSAGE: u8 = 5;

/// Message flag: only the invoking user can see the message.
pub const EPHEMERAL: u64 = 1 << 6;

fn chat_input() -> u8 {
    COMMAND_CHAT_INPUT
}

/// Discord user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub global_name: Option<String>,
    #[serde(default)]
    pub discriminator: Option<String>,
    #[serde(default)]
    pub bot: bool,
}

impl User {
    /// User tag as shown in clients ("name#1234", or the bare username for
    /// accounts without a discriminator).
    pub fn tag(&self) -> String {
        match self.discriminator.as_deref() {
            Some(d) if d != "0" => format!("{}#{}", self.username, d),
            _ => self.username.clone(),
        }
    }

    /// Mention markup for this user.
    pub fn mention(&self) -> String {
        format!("<@{}>", self.id)
    }
}

/// Guild member attached to guild interactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuildMember {
    #[serde(default)]
    pub user: Option<User>,
    #[serde(default)]
    pub nick: Option<String>,
    #[serde(default)]
    pub joined_at: Option<DateTime<Utc>>,
}

/// Channel message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub channel_id: String,
    #[serde(default)]
    pub guild_id: Option<String>,
    pub author: User,
    #[serde(default)]
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub mentions: Vec<User>,
}

impl Message {
    /// Whether the message mentions the given user.
    pub fn mentions_user(&self, user_id: &str) -> bool {
        self.mentions.iter().any(|u| u.id == user_id)
    }
}

/// Incoming interaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub id: String,
    pub application_id: String,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub data: Option<CommandData>,
    #[serde(default)]
    pub guild_id: Option<String>,
    #[serde(default)]
    pub channel_id: Option<String>,
    /// Present for interactions inside a guild.
    #[serde(default)]
    pub member: Option<GuildMember>,
    /// Present for interactions in DMs.
    #[serde(default)]
    pub user: Option<User>,
    pub token: String,
}

impl Interaction {
    /// Whether this is a slash command invocation.
    pub fn is_chat_input_command(&self) -> bool {
        self.kind == INTERACTION_APPLICATION_COMMAND
            && self
                .data
                .as_ref()
                .is_some_and(|d| d.kind == COMMAND_CHAT_INPUT)
    }

    /// Invoked command name, if this is a command interaction.
    pub fn command_name(&self) -> Option<&str> {
        self.data.as_ref().map(|d| d.name.as_str())
    }

    /// The invoking user, whether in a guild or a DM.
    pub fn author(&self) -> Option<&User> {
        self.member
            .as_ref()
            .and_then(|m| m.user.as_ref())
            .or(self.user.as_ref())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandData {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default = "chat_input")]
    pub kind: u8,
    #[serde(default)]
    pub options: Vec<CommandDataOption>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandDataOption {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
}

/// Slash command declaration, as sent to the bulk-overwrite endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandDeclaration {
    pub name: String,
    pub description: String,
    #[serde(rename = "type", default = "chat_input")]
    pub kind: u8,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<CommandOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dm_permission: Option<bool>,
}

impl CommandDeclaration {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            kind: COMMAND_CHAT_INPUT,
            options: Vec::new(),
            dm_permission: None,
        }
    }

    pub fn option(mut self, option: CommandOption) -> Self {
        self.options.push(option);
        self
    }

    /// Restrict the command to guilds.
    pub fn guild_only(mut self) -> Self {
        self.dm_permission = Some(false);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandOption {
    #[serde(rename = "type")]
    pub kind: u8,
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub required: bool,
}

impl CommandOption {
    pub fn new(kind: u8, name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind,
            name: name.into(),
            description: description.into(),
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

/// Command as registered on Discord.
#[derive(Debug, Clone, Deserialize)]
pub struct ApplicationCommand {
    pub id: String,
    pub application_id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// Guild, optionally with approximate counts.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Guild {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub approximate_member_count: Option<u64>,
}

/// Interaction callback body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InteractionResponse {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<MessagePayload>,
}

impl InteractionResponse {
    /// Respond immediately with a message.
    pub fn message(payload: MessagePayload) -> Self {
        Self {
            kind: RESPONSE_CHANNEL_MESSAGE,
            data: Some(payload),
        }
    }

    /// Acknowledge now and send the content as a follow-up.
    pub fn deferred(ephemeral: bool) -> Self {
        Self {
            kind: RESPONSE_DEFERRED_CHANNEL_MESSAGE,
            data: ephemeral.then(|| MessagePayload {
                flags: Some(EPHEMERAL),
                ..Default::default()
            }),
        }
    }

    pub fn is_deferred(&self) -> bool {
        self.kind == RESPONSE_DEFERRED_CHANNEL_MESSAGE
    }
}

/// Outgoing message body (channel messages, interaction responses, follow-ups).
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MessagePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flags: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message_reference: Option<MessageReference>,
}

impl MessagePayload {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    pub fn ephemeral(mut self) -> Self {
        self.flags = Some(self.flags.unwrap_or(0) | EPHEMERAL);
        self
    }

    /// Send as a reply to `message`.
    pub fn reply_to(mut self, message: &Message) -> Self {
        self.message_reference = Some(MessageReference {
            message_id: message.id.clone(),
            channel_id: Some(message.channel_id.clone()),
        });
        self
    }

    pub fn is_ephemeral(&self) -> bool {
        self.flags.is_some_and(|f| f & EPHEMERAL != 0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageReference {
    pub message_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_id: Option<String>,
}

/// Response of `GET /gateway/bot`.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayBot {
    pub url: String,
}

/// Raw gateway frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayPayload {
    pub op: u8,
    #[serde(default)]
    pub d: Option<serde_json::Value>,
    #[serde(default)]
    pub s: Option<u64>,
    #[serde(default)]
    pub t: Option<String>,
}

/// `READY` dispatch data.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Ready {
    pub user: User,
    pub session_id: String,
}

/// Gateway kinds the bot subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Ready,
    InteractionCreate,
    MessageCreate,
}

impl EventKind {
    /// Dispatch name used on the gateway.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Ready => "READY",
            EventKind::InteractionCreate => "INTERACTION_CREATE",
            EventKind::MessageCreate => "MESSAGE_CREATE",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded gateway dispatch.
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayEvent {
    Ready(Ready),
    InteractionCreate(Box<Interaction>),
    MessageCreate(Box<Message>),
}

impl GatewayEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            GatewayEvent::Ready(_) => EventKind::Ready,
            GatewayEvent::InteractionCreate(_) => EventKind::InteractionCreate,
            GatewayEvent::MessageCreate(_) => EventKind::MessageCreate,
        }
    }
}
