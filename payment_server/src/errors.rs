use payout_engine::{tracker::SubscriptionError, StatusStoreError};
use pgw_common::validation::ValidationConfigError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(#[from] ValidationConfigError),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
}

impl From<StatusStoreError> for ServerError {
    fn from(e: StatusStoreError) -> Self {
        Self::BackendError(e.to_string())
    }
}

impl From<SubscriptionError> for ServerError {
    fn from(e: SubscriptionError) -> Self {
        Self::BackendError(e.to_string())
    }
}
