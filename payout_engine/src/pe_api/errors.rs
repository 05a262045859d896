use gateway_tools::GatewayError;
use pgw_common::validation::ValidationErrors;
use thiserror::Error;

use crate::traits::TransactionLogError;

#[derive(Debug, Clone, Error)]
pub enum PayoutFlowError {
    #[error("The payout request is invalid. {0}")]
    InvalidRequest(#[from] ValidationErrors),
    #[error("The gateway rejected the payout. {0}")]
    Gateway(#[from] GatewayError),
    #[error("The payout was created but could not be logged. {0}")]
    LogError(#[from] TransactionLogError),
}
