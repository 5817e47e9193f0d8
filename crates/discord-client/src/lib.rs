//! Discord REST and gateway client.

mod client;
mod error;
mod gateway;
mod types;

pub use client::{DiscordClient, DEFAULT_API_BASE};
pub use error::DiscordError;
pub use gateway::Gateway;
pub use types::*;
