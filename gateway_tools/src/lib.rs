mod api;
mod config;
mod error;

mod data_objects;
pub mod validation;

pub use api::{GatewayApi, IDEMPOTENCE_KEY_HEADER};
pub use config::{GatewayConfig, DEFAULT_GATEWAY_TIMEOUT, DEFAULT_GATEWAY_URL};
pub use data_objects::{
    Amount,
    BankCardData,
    Confirmation,
    NewPayment,
    NewPayout,
    Payment,
    PaymentMethodData,
    Payout,
    PayoutDestination,
    VatData,
};
pub use error::GatewayError;
pub use validation::request_validator;
