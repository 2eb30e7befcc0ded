use thiserror::Error;

#[derive(Error, Debug)]
pub enum LinkError {
    #[error("Serial port is already open")]
    AlreadyOpen,

    #[error("Serial port is not open")]
    NotOpen,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Failed to reconnect to {port}: {reason}")]
    ReconnectFailed { port: String, reason: String },

    #[error("Command '{key}' is not defined for model {model}")]
    UnknownCommand { model: String, key: String },

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type LinkResult<T> = std::result::Result<T, LinkError>;
