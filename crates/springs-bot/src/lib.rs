//! Nine Springs Discord bot.
//!
//! Slash commands, a canned keyword reply and an LLM mention relay, shared by
//! the `springs-bot` and `deploy-commands` binaries.

pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod events;
pub mod platform;
pub mod reply;

#[cfg(test)]
pub(crate) mod testing;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global tracing subscriber. `RUST_LOG` wins over `level`.
pub fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
