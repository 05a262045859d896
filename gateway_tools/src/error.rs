use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("Could not initialize client: {0}")]
    Initialization(String),
    #[error("The gateway did not answer in time: {0}")]
    Timeout(String),
    #[error("Could not reach the gateway: {0}")]
    Transport(String),
    #[error("Query failed. Error {status}. {message}")]
    QueryError { status: u16, message: String },
    #[error("Could not deserialize JSON: {0}")]
    JsonError(String),
}

impl GatewayError {
    /// Transient errors are worth retrying later without any change on our side: timeouts, connection failures,
    /// rate limiting and gateway-side failures. Everything else (bad requests, unknown ids, malformed bodies) will
    /// fail the same way again.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Transport(_) => true,
            Self::QueryError { status, .. } => *status == 429 || *status >= 500,
            Self::Initialization(_) | Self::JsonError(_) => false,
        }
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(e.to_string())
        } else if e.is_decode() {
            Self::JsonError(e.to_string())
        } else {
            Self::Transport(e.to_string())
        }
    }
}
