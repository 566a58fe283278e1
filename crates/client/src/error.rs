use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("WebSocket error: {0}")]
    Ws(#[from] tokio_tungstenite::tungstenite::Error),

    /// The server answered with an error body.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("{0}")]
    Validation(String),

    #[error("Not found")]
    NotFound,

    #[error("Not authenticated")]
    Unauthorized,

    #[error("Gateway closed unexpectedly")]
    GatewayClosed,
}

pub type Result<T> = std::result::Result<T, ClientError>;
