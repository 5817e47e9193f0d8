//! Application error types.

use thiserror::Error;

/// Main application error type.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Discord error: {0}")]
    Discord(#[from] discord_client::DiscordError),

    #[error("LLM error: {0}")]
    Llm(#[from] llm_client::LlmError),

    #[error("Command error: {0}")]
    Command(String),
}

/// Result type alias for application errors.
pub type AppResult<T> = Result<T, AppError>;

/// A command declaration that Discord would reject.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("invalid command name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("command {name}: description must be 1-100 characters")]
    InvalidDescription { name: String },

    #[error("command {name}: more than 25 options")]
    TooManyOptions { name: String },

    #[error("command {name}: option {option:?} {reason}")]
    InvalidOption {
        name: String,
        option: String,
        reason: &'static str,
    },
}
