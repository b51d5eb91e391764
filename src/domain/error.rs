//! # Errors
//!
//! Error taxonomy shared by the transport, the producers and the engine.
//! Malformed metadata and command text never become errors; they are simply ignored.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BotError {
    /// The bot cannot work out who it is. Aborts startup.
    #[error("configuration error: {0}")]
    FatalConfig(String),

    /// A single read, post or listing call against the chat platform failed.
    #[error("transport error: {0}")]
    Transport(String),

    /// A single fetch against a content producer failed.
    #[error("producer `{producer}` failed: {message}")]
    Producer { producer: String, message: String },

    /// A producer could not be constructed from its configuration block.
    #[error("producer `{producer}` could not be initialized: {message}")]
    ProducerInit { producer: String, message: String },
}

impl BotError {
    pub fn producer(producer: &str, message: impl ToString) -> Self {
        Self::Producer {
            producer: producer.to_string(),
            message: message.to_string(),
        }
    }

    pub fn producer_init(producer: &str, message: impl ToString) -> Self {
        Self::ProducerInit {
            producer: producer.to_string(),
            message: message.to_string(),
        }
    }
}

impl From<reqwest::Error> for BotError {
    fn from(err: reqwest::Error) -> Self {
        BotError::Transport(err.to_string())
    }
}

pub type BotResult<T> = Result<T, BotError>;
