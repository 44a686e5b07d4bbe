//! Error types for Linode API clients.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: invalid or missing API token")]
    Unauthorized,

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;
