pub mod helpers;
mod secret;
mod status;
pub mod validation;

pub use secret::Secret;
pub use status::{StatusConversionError, TransactionStatus};
