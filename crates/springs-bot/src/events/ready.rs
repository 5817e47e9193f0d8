use super::EventHandler;
use crate::context::BotContext;
use crate::error::AppResult;
use async_trait::async_trait;
use discord_client::{EventKind, GatewayEvent};
use tracing::info;

/// Logs the account the gateway session belongs to.
pub struct ReadyLogger;

#[async_trait]
impl EventHandler for ReadyLogger {
    fn name(&self) -> &'static str {
        "ready"
    }

    fn event(&self) -> EventKind {
        EventKind::Ready
    }

    fn once(&self) -> bool {
        true
    }

    async fn execute(&self, event: &GatewayEvent, _ctx: &BotContext) -> AppResult<()> {
        if let GatewayEvent::Ready(ready) = event {
            info!("Ready! Logged in as {}", ready.user.tag());
        }
        Ok(())
    }
}
