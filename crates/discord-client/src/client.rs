//! Discord REST client.

use crate::error::DiscordError;
use crate::types::*;
use reqwest::{Client, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Discord REST API base URL.
pub const DEFAULT_API_BASE: &str = "https://discord.com/api/v10";

/// Largest page `GET /users/@me/guilds` returns.
const GUILD_PAGE_SIZE: usize = 200;

/// Discord REST API client.
///
/// The bot token is stored using `SecretString` so it never shows up in
/// debug output.
#[derive(Clone)]
pub struct DiscordClient {
    client: Client,
    base_url: String,
    token: SecretString,
    application_id: String,
}

impl DiscordClient {
    /// Create a new Discord client.
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        application_id: impl Into<String>,
    ) -> Result<Self, DiscordError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into(),
            token: SecretString::new(token.into()),
            application_id: application_id.into(),
        })
    }

    pub(crate) fn token(&self) -> &str {
        self.token.expose_secret()
    }

    /// Get the user the bot token belongs to.
    #[instrument(skip(self))]
    pub async fn current_user(&self) -> Result<User, DiscordError> {
        let response = self.get("/users/@me").send().await?;
        self.handle_response(response).await
    }

    /// Guilds the bot is a member of, following pagination to the end.
    #[instrument(skip(self))]
    pub async fn current_user_guilds(&self) -> Result<Vec<Guild>, DiscordError> {
        let mut guilds = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let mut request = self
                .get("/users/@me/guilds")
                .query(&[("limit", GUILD_PAGE_SIZE)]);
            if let Some(after) = &after {
                request = request.query(&[("after", after)]);
            }

            let page: Vec<Guild> = self.handle_response(request.send().await?).await?;
            let last_page = page.len() < GUILD_PAGE_SIZE;
            after = page.last().map(|guild| guild.id.clone());
            guilds.extend(page);

            if last_page || after.is_none() {
                break;
            }
        }

        debug!("Bot is in {} guilds", guilds.len());
        Ok(guilds)
    }

    /// Get the websocket URL to connect the gateway to.
    #[instrument(skip(self))]
    pub async fn gateway_url(&self) -> Result<String, DiscordError> {
        let response = self.get("/gateway/bot").send().await?;
        self.handle_response::<GatewayBot>(response)
            .await
            .map(|g| g.url)
    }

    /// Replace all global commands with `commands`.
    #[instrument(skip(self, commands), fields(count = commands.len()))]
    pub async fn bulk_overwrite_global_commands(
        &self,
        commands: &[CommandDeclaration],
    ) -> Result<Vec<ApplicationCommand>, DiscordError> {
        let path = format!("/applications/{}/commands", self.application_id);
        let response = self.put(&path).json(commands).send().await?;
        self.handle_response(response).await
    }

    /// Replace all commands registered for one guild with `commands`.
    #[instrument(skip(self, commands), fields(count = commands.len()))]
    pub async fn bulk_overwrite_guild_commands(
        &self,
        guild_id: &str,
        commands: &[CommandDeclaration],
    ) -> Result<Vec<ApplicationCommand>, DiscordError> {
        let path = format!(
            "/applications/{}/guilds/{}/commands",
            self.application_id, guild_id
        );
        let response = self.put(&path).json(commands).send().await?;
        self.handle_response(response).await
    }

    /// Send the initial response to an interaction.
    #[instrument(skip(self, token, body))]
    pub async fn create_interaction_response(
        &self,
        interaction_id: &str,
        token: &str,
        body: &InteractionResponse,
    ) -> Result<(), DiscordError> {
        let path = format!("/interactions/{}/{}/callback", interaction_id, token);
        let response = self.post(&path).json(body).send().await?;
        self.expect_success(response).await
    }

    /// Send a follow-up message for an interaction that was already
    /// responded to or deferred.
    #[instrument(skip(self, token, body))]
    pub async fn create_followup_message(
        &self,
        token: &str,
        body: &MessagePayload,
    ) -> Result<Message, DiscordError> {
        let path = format!("/webhooks/{}/{}", self.application_id, token);
        let response = self.post(&path).json(body).send().await?;
        self.handle_response(response).await
    }

    /// Post a message to a channel.
    #[instrument(skip(self, body))]
    pub async fn create_message(
        &self,
        channel_id: &str,
        body: &MessagePayload,
    ) -> Result<Message, DiscordError> {
        let path = format!("/channels/{}/messages", channel_id);
        let response = self.post(&path).json(body).send().await?;
        self.handle_response(response).await
    }

    /// Show the typing indicator in a channel (lasts about 10 seconds).
    #[instrument(skip(self))]
    pub async fn trigger_typing(&self, channel_id: &str) -> Result<(), DiscordError> {
        let path = format!("/channels/{}/typing", channel_id);
        let response = self.post(&path).send().await?;
        self.expect_success(response).await
    }

    /// Most recent messages of a channel, newest first.
    #[instrument(skip(self))]
    pub async fn get_channel_messages(
        &self,
        channel_id: &str,
        limit: u8,
    ) -> Result<Vec<Message>, DiscordError> {
        let path = format!("/channels/{}/messages", channel_id);
        let response = self
            .get(&path)
            .query(&[("limit", limit.clamp(1, 100))])
            .send()
            .await?;
        let messages: Vec<Message> = self.handle_response(response).await?;
        debug!("Fetched {} messages", messages.len());
        Ok(messages)
    }

    /// Get a guild including approximate member counts.
    #[instrument(skip(self))]
    pub async fn get_guild(&self, guild_id: &str) -> Result<Guild, DiscordError> {
        let path = format!("/guilds/{}", guild_id);
        let response = self
            .get(&path)
            .query(&[("with_counts", "true")])
            .send()
            .await?;
        self.handle_response(response).await
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.authorized(self.client.get(format!("{}{}", self.base_url, path)))
    }

    fn post(&self, path: &str) -> RequestBuilder {
        self.authorized(self.client.post(format!("{}{}", self.base_url, path)))
    }

    fn put(&self, path: &str) -> RequestBuilder {
        self.authorized(self.client.put(format!("{}{}", self.base_url, path)))
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(
            "Authorization",
            format!("Bot {}", self.token.expose_secret()),
        )
    }

    /// Handle HTTP response, converting errors appropriately.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, DiscordError> {
        if response.status().is_success() {
            let body = response.text().await?;
            debug!(
                "Response body: {}",
                body.chars().take(200).collect::<String>()
            );
            serde_json::from_str(&body).map_err(DiscordError::from)
        } else {
            Err(self.extract_error(response).await)
        }
    }

    async fn expect_success(&self, response: reqwest::Response) -> Result<(), DiscordError> {
        if response.status().is_success() {
            Ok(())
        } else {
            Err(self.extract_error(response).await)
        }
    }

    /// Extract error information from failed response.
    async fn extract_error(&self, response: reqwest::Response) -> DiscordError {
        let status = response.status();

        match status {
            StatusCode::TOO_MANY_REQUESTS => {
                warn!("Rate limit exceeded");
                DiscordError::RateLimit
            }
            StatusCode::UNAUTHORIZED => {
                warn!("Authentication failed");
                DiscordError::Unauthorized
            }
            _ => {
                let message = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".into());
                warn!("Discord API error {}: {}", status, message);
                DiscordError::Api {
                    status: status.as_u16(),
                    message,
                }
            }
        }
    }
}
