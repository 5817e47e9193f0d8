//! OpenAI-compatible chat completion client.

mod client;
mod error;
mod types;

pub use client::LlmClient;
pub use error::LlmError;
pub use types::*;
