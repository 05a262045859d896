use std::{env, time::Duration};

use gateway_tools::GatewayConfig;
use log::*;
use payout_engine::tracker::TrackerConfig;
use pgw_common::{helpers::duration_from_env, validation::DEFAULT_CURRENCIES};

const DEFAULT_PGW_DATABASE_URL: &str = "sqlite://data/payout_store.db";
const DEFAULT_MAX_CONNECTIONS: u32 = 25;
const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(60);
const DEFAULT_INGEST_QUEUE_SIZE: usize = 128;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub database_url: String,
    pub max_connections: u32,
    /// ISO 4217 codes accepted in payout and payment amounts.
    pub currencies: Vec<String>,
    pub gateway: GatewayConfig,
    /// Polling and tracking window of the payout tracker. `tracker.ttl` is also the lifetime of status records.
    pub tracker: TrackerConfig,
    /// How often expired status records are swept out of the store.
    pub sweep_interval: Duration,
    /// Capacity of the inbound and outbound payment message channels.
    pub ingest_queue_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_PGW_DATABASE_URL.to_string(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            currencies: DEFAULT_CURRENCIES.iter().map(|s| s.to_string()).collect(),
            gateway: GatewayConfig::default(),
            tracker: TrackerConfig::default(),
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            ingest_queue_size: DEFAULT_INGEST_QUEUE_SIZE,
        }
    }
}

impl ServerConfig {
    pub fn from_env_or_default() -> Self {
        let database_url = env::var("PGW_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ PGW_DATABASE_URL is not set. Using the default, {DEFAULT_PGW_DATABASE_URL}, instead.");
            DEFAULT_PGW_DATABASE_URL.to_string()
        });
        let max_connections = parse_env("PGW_MAX_DB_CONNECTIONS", DEFAULT_MAX_CONNECTIONS);
        let ingest_queue_size = parse_env("PGW_INGEST_QUEUE_SIZE", DEFAULT_INGEST_QUEUE_SIZE);
        let currencies = env::var("PGW_CURRENCIES")
            .ok()
            .map(|s| parse_currencies(&s))
            .filter(|list| {
                if list.is_empty() {
                    error!("🪛️ PGW_CURRENCIES does not contain any currency codes. Using the defaults instead.");
                }
                !list.is_empty()
            })
            .unwrap_or_else(|| DEFAULT_CURRENCIES.iter().map(|s| s.to_string()).collect());
        let gateway = GatewayConfig::new_from_env_or_default();
        let tracker = TrackerConfig::from_env_or_default();
        let sweep_interval = duration_from_env("PGW_SWEEP_INTERVAL", DEFAULT_SWEEP_INTERVAL);
        Self { database_url, max_connections, currencies, gateway, tracker, sweep_interval, ingest_queue_size }
    }
}

fn parse_env<T>(name: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(s) => s.trim().parse::<T>().unwrap_or_else(|e| {
            error!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        }),
        Err(_) => default,
    }
}

fn parse_currencies(value: &str) -> Vec<String> {
    value.split(',').map(|s| s.trim().to_ascii_uppercase()).filter(|s| !s.is_empty()).collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn currency_lists() {
        assert_eq!(parse_currencies("rub, USD,,eur "), vec!["RUB", "USD", "EUR"]);
        assert!(parse_currencies(" , ").is_empty());
    }

    #[test]
    fn defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.currencies, vec!["RUB"]);
        assert!(config.tracker.schedule().total() <= config.tracker.ttl);
        assert_eq!(config.sweep_interval, Duration::from_secs(60));
    }
}
