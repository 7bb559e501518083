//! Error types for the intake dialogue

use thiserror::Error;

/// Result type alias for intake operations
pub type IntakeResult<T> = Result<T, IntakeError>;

/// Errors that can occur while running an intake conversation
#[derive(Error, Debug)]
pub enum IntakeError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Validation endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Malformed validation response: {0}")]
    MalformedResponse(String),

    #[error("TTS error: {0}")]
    Synthesis(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Channel send error: {0}")]
    ChannelSend(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for IntakeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            IntakeError::MalformedResponse(err.to_string())
        } else {
            IntakeError::Transport(err.to_string())
        }
    }
}

impl From<config::ConfigError> for IntakeError {
    fn from(err: config::ConfigError) -> Self {
        IntakeError::Config(err.to_string())
    }
}
