//! Slash command dispatch.

use super::EventHandler;
use crate::commands::InteractionContext;
use crate::context::BotContext;
use crate::error::AppResult;
use async_trait::async_trait;
use discord_client::{EventKind, GatewayEvent, Interaction, MessagePayload};
use tracing::{debug, error};

/// Shown to the user when a command handler fails.
pub const COMMAND_ERROR_REPLY: &str = "There was an error while executing this command!";

/// What happened to an interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Not a slash command.
    Ignored,
    Handled,
    /// The handler returned an error; the user was told.
    Failed,
    /// No command with that name is registered.
    Unmatched,
}

/// Routes slash commands to their registered handler.
pub struct InteractionRouter;

impl InteractionRouter {
    pub async fn route(&self, interaction: &Interaction, ctx: &BotContext) -> RouteOutcome {
        if !interaction.is_chat_input_command() {
            return RouteOutcome::Ignored;
        }

        let name = interaction.command_name().unwrap_or_default();
        let Some(command) = ctx.commands.get(name) else {
            error!("No command matching {} was found.", name);
            return RouteOutcome::Unmatched;
        };

        let mut command_ctx = InteractionContext::new(interaction, ctx.platform.as_ref());

        match command.handler.execute(&mut command_ctx).await {
            Ok(()) => {
                debug!("Handled /{}", name);
                RouteOutcome::Handled
            }
            Err(e) => {
                error!("Error executing /{}: {}", name, e);

                // Follows up when the handler already replied or deferred.
                let notice = MessagePayload::text(COMMAND_ERROR_REPLY).ephemeral();
                if let Err(e) = command_ctx.respond_with(notice).await {
                    error!("Failed to report error for /{}: {}", name, e);
                }
                RouteOutcome::Failed
            }
        }
    }
}

#[async_trait]
impl EventHandler for InteractionRouter {
    fn name(&self) -> &'static str {
        "interaction_create"
    }

    fn event(&self) -> EventKind {
        EventKind::InteractionCreate
    }

    async fn execute(&self, event: &GatewayEvent, ctx: &BotContext) -> AppResult<()> {
        if let GatewayEvent::InteractionCreate(interaction) = event {
            self.route(interaction, ctx).await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{CommandCategory, CommandHandler, CommandRegistry};
    use crate::error::AppError;
    use crate::platform::{MockPlatform, Platform};
    use crate::testing::{bot_user, capture_logs, command_interaction};
    use discord_client::{CommandDeclaration, DiscordError, COMMAND_CHAT_INPUT};
    use std::sync::Arc;

    /// Fails after optionally replying or deferring.
    enum Broken {
        Immediately,
        AfterDefer,
        AfterReply,
    }

    #[async_trait]
    impl CommandHandler for Broken {
        fn declaration(&self) -> CommandDeclaration {
            let name = match self {
                Broken::Immediately => "broken",
                Broken::AfterDefer => "slow-broken",
                Broken::AfterReply => "chatty-broken",
            };
            CommandDeclaration::new(name, "Always fails")
        }

        async fn execute(&self, ctx: &mut InteractionContext<'_>) -> AppResult<()> {
            match self {
                Broken::Immediately => {}
                Broken::AfterDefer => ctx.defer(false).await?,
                Broken::AfterReply => ctx.reply("working on it").await?,
            }
            Err(AppError::Command("handler exploded".into()))
        }
    }

    fn context(platform: MockPlatform) -> BotContext {
        let registry = CommandRegistry::load(vec![
            crate::commands::utility::category(),
            CommandCategory::new("test")
                .with(Broken::Immediately)
                .with(Broken::AfterDefer)
                .with(Broken::AfterReply),
        ]);
        let platform: Arc<dyn Platform> = Arc::new(platform);
        BotContext::new(platform, Arc::new(registry), bot_user())
    }

    fn is_error_notice(payload: &MessagePayload) -> bool {
        payload.content.as_deref() == Some(COMMAND_ERROR_REPLY) && payload.is_ephemeral()
    }

    #[tokio::test]
    async fn test_unmatched_command_sends_nothing() {
        let mut platform = MockPlatform::new();
        platform.expect_respond().never();
        platform.expect_follow_up().never();
        platform.expect_send_message().never();
        let ctx = context(platform);

        let (logs, _guard) = capture_logs();
        let outcome = InteractionRouter
            .route(&command_interaction("nope", Some("guild-1")), &ctx)
            .await;

        assert_eq!(outcome, RouteOutcome::Unmatched);
        assert_eq!(logs.count("ERROR"), 1);
        assert!(logs.contents().contains("No command matching nope was found."));
    }

    #[tokio::test]
    async fn test_failure_before_reply_sends_ephemeral_response() {
        let mut platform = MockPlatform::new();
        platform
            .expect_respond()
            .withf(|id, token, response| {
                id == "interaction-1"
                    && token == "token-1"
                    && !response.is_deferred()
                    && response.data.as_ref().is_some_and(is_error_notice)
            })
            .times(1)
            .returning(|_, _, _| Ok(()));
        platform.expect_follow_up().never();
        let ctx = context(platform);

        let outcome = InteractionRouter
            .route(&command_interaction("broken", Some("guild-1")), &ctx)
            .await;

        assert_eq!(outcome, RouteOutcome::Failed);
    }

    #[tokio::test]
    async fn test_failure_after_defer_sends_ephemeral_follow_up() {
        let mut platform = MockPlatform::new();
        platform
            .expect_respond()
            .withf(|_, _, response| response.is_deferred())
            .times(1)
            .returning(|_, _, _| Ok(()));
        platform
            .expect_follow_up()
            .withf(|token, payload| token == "token-1" && is_error_notice(payload))
            .times(1)
            .returning(|_, _| Ok(()));
        let ctx = context(platform);

        let outcome = InteractionRouter
            .route(&command_interaction("slow-broken", Some("guild-1")), &ctx)
            .await;

        assert_eq!(outcome, RouteOutcome::Failed);
    }

    #[tokio::test]
    async fn test_failure_after_reply_sends_ephemeral_follow_up() {
        let mut platform = MockPlatform::new();
        platform
            .expect_respond()
            .times(1)
            .returning(|_, _, _| Ok(()));
        platform
            .expect_follow_up()
            .withf(|_, payload| is_error_notice(payload))
            .times(1)
            .returning(|_, _| Ok(()));
        let ctx = context(platform);

        let outcome = InteractionRouter
            .route(&command_interaction("chatty-broken", None), &ctx)
            .await;

        assert_eq!(outcome, RouteOutcome::Failed);
    }

    #[tokio::test]
    async fn test_error_notice_failure_is_swallowed() {
        let mut platform = MockPlatform::new();
        platform
            .expect_respond()
            .times(1)
            .returning(|_, _, _| Err(DiscordError::Unauthorized));
        let ctx = context(platform);

        let (logs, _guard) = capture_logs();
        let outcome = InteractionRouter
            .route(&command_interaction("broken", Some("guild-1")), &ctx)
            .await;

        assert_eq!(outcome, RouteOutcome::Failed);
        assert_eq!(logs.count("ERROR"), 2);
    }

    #[tokio::test]
    async fn test_non_command_interactions_are_ignored() {
        let mut platform = MockPlatform::new();
        platform.expect_respond().never();
        let ctx = context(platform);

        let mut component = command_interaction("ping", None);
        component.kind = 3;
        assert_eq!(
            InteractionRouter.route(&component, &ctx).await,
            RouteOutcome::Ignored
        );

        let mut user_command = command_interaction("ping", None);
        if let Some(data) = user_command.data.as_mut() {
            data.kind = COMMAND_CHAT_INPUT + 1;
        }
        assert_eq!(
            InteractionRouter.route(&user_command, &ctx).await,
            RouteOutcome::Ignored
        );
    }

    #[tokio::test]
    async fn test_registered_command_is_handled() {
        let mut platform = MockPlatform::new();
        platform
            .expect_respond()
            .withf(|_, _, response| {
                response.data.as_ref().and_then(|d| d.content.as_deref()) == Some("Pong!")
            })
            .times(1)
            .returning(|_, _, _| Ok(()));
        let ctx = context(platform);

        let event = GatewayEvent::InteractionCreate(Box::new(command_interaction("ping", None)));
        InteractionRouter.execute(&event, &ctx).await.unwrap();
    }
}
