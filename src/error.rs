use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("A message needs text or an attachment")]
    EmptyMessage,

    #[error("Unknown contact: {0}")]
    UnknownContact(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ChatError>;
