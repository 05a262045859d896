use std::time::Duration;

use log::*;
use pgw_common::{helpers::duration_from_env, Secret};

pub const DEFAULT_GATEWAY_URL: &str = "https://api.yookassa.ru/v3";
pub const DEFAULT_GATEWAY_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Base URL of the gateway's REST API, without a trailing slash.
    pub api_url: String,
    pub shop_id: String,
    pub secret_key: Secret<String>,
    /// Upper bound for a single request, connect time included.
    pub timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_GATEWAY_URL.to_string(),
            shop_id: String::default(),
            secret_key: Secret::default(),
            timeout: DEFAULT_GATEWAY_TIMEOUT,
        }
    }
}

impl GatewayConfig {
    pub fn new(api_url: &str, shop_id: &str, secret_key: &str) -> Self {
        Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            shop_id: shop_id.to_string(),
            secret_key: Secret::new(secret_key.to_string()),
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn new_from_env_or_default() -> Self {
        let api_url = std::env::var("PGW_GATEWAY_URL").unwrap_or_else(|_| {
            info!("PGW_GATEWAY_URL not set, using {DEFAULT_GATEWAY_URL}");
            DEFAULT_GATEWAY_URL.to_string()
        });
        let shop_id = std::env::var("PGW_GATEWAY_SHOP_ID").unwrap_or_else(|_| {
            error!("🪛️ PGW_GATEWAY_SHOP_ID is not set. Requests to the gateway will be rejected.");
            String::default()
        });
        let secret_key = Secret::new(std::env::var("PGW_GATEWAY_SECRET_KEY").unwrap_or_else(|_| {
            error!("🪛️ PGW_GATEWAY_SECRET_KEY is not set. Requests to the gateway will be rejected.");
            String::default()
        }));
        let timeout = duration_from_env("PGW_GATEWAY_TIMEOUT", DEFAULT_GATEWAY_TIMEOUT);
        Self { api_url: api_url.trim_end_matches('/').to_string(), shop_id, secret_key, timeout }
    }
}
