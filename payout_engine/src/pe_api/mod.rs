pub mod errors;
pub mod payout_flow_api;
