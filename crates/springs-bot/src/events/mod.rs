//! Gateway event handlers.

mod interaction_create;
mod mention_relay;
mod message_create;
mod ready;

pub use interaction_create::{InteractionRouter, RouteOutcome, COMMAND_ERROR_REPLY};
pub use mention_relay::{build_context, speaker_label, MentionRelay, FAILURE_REPLY};
pub use message_create::{CannedReply, CANNED_REPLIES, TRIGGER_PHRASE};
pub use ready::ReadyLogger;

use crate::context::BotContext;
use crate::error::AppResult;
use async_trait::async_trait;
use discord_client::{EventKind, GatewayEvent};
use futures::future::join_all;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error};

/// Handler subscribed to one gateway event kind.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &'static str;

    fn event(&self) -> EventKind;

    /// Fire at most once, then retire.
    fn once(&self) -> bool {
        false
    }

    async fn execute(&self, event: &GatewayEvent, ctx: &BotContext) -> AppResult<()>;
}

struct Subscription {
    handler: Arc<dyn EventHandler>,
    retired: AtomicBool,
}

/// Fans each gateway event out to the handlers subscribed to its kind.
pub struct EventDispatcher {
    subscriptions: Vec<Subscription>,
}

impl EventDispatcher {
    pub fn new(handlers: Vec<Arc<dyn EventHandler>>) -> Self {
        let subscriptions = handlers
            .into_iter()
            .map(|handler| Subscription {
                handler,
                retired: AtomicBool::new(false),
            })
            .collect();

        Self { subscriptions }
    }

    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Run every matching handler concurrently. Handler errors are logged.
    /// Returns how many handlers ran.
    pub async fn dispatch(&self, event: &GatewayEvent, ctx: &BotContext) -> usize {
        let kind = event.kind();

        let runs: Vec<_> = self
            .subscriptions
            .iter()
            .filter(|sub| sub.handler.event() == kind)
            .filter(|sub| !(sub.handler.once() && sub.retired.swap(true, Ordering::SeqCst)))
            .map(|sub| async move {
                let name = sub.handler.name();
                debug!("Dispatching {} to {}", kind, name);
                if let Err(e) = sub.handler.execute(event, ctx).await {
                    error!("Event handler {} failed: {}", name, e);
                }
            })
            .collect();

        let count = runs.len();
        join_all(runs).await;
        count
    }
}

/// The built-in handlers. The mention relay is included only when an LLM is
/// configured.
pub fn builtin_handlers(relay_enabled: bool) -> Vec<Arc<dyn EventHandler>> {
    let mut handlers: Vec<Arc<dyn EventHandler>> = vec![
        Arc::new(ReadyLogger),
        Arc::new(InteractionRouter),
        Arc::new(CannedReply),
    ];

    if relay_enabled {
        handlers.push(Arc::new(MentionRelay));
    }

    handlers
}
