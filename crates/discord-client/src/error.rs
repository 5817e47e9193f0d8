//! Discord client errors.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiscordError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Rate limited")]
    RateLimit,

    #[error("Invalid bot token")]
    Unauthorized,

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Gateway error: {0}")]
    Gateway(String),
}
