use std::time::Duration;

use pgw_common::helpers::duration_from_env;

use crate::{traits::DEFAULT_RECORD_TTL, tracker::backoff::BackoffSchedule};

pub const DEFAULT_POLL_UNIT: Duration = Duration::from_secs(1);
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_READ_RETRIES: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerConfig {
    /// The window a payout is tracked for. Must match the status store's record TTL.
    pub ttl: Duration,
    /// The time unit of the backoff schedule.
    pub unit: Duration,
    /// Upper bound on a single status fetch from the gateway.
    pub fetch_timeout: Duration,
    /// How often a status read is retried after it raced with another writer.
    pub max_read_retries: u32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_RECORD_TTL,
            unit: DEFAULT_POLL_UNIT,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            max_read_retries: DEFAULT_MAX_READ_RETRIES,
        }
    }
}

impl TrackerConfig {
    pub fn from_env_or_default() -> Self {
        Self {
            ttl: duration_from_env("PGW_TRACKING_TTL", DEFAULT_RECORD_TTL),
            unit: duration_from_env("PGW_POLL_UNIT", DEFAULT_POLL_UNIT),
            fetch_timeout: duration_from_env("PGW_FETCH_TIMEOUT", DEFAULT_FETCH_TIMEOUT),
            max_read_retries: DEFAULT_MAX_READ_RETRIES,
        }
    }

    pub fn schedule(&self) -> BackoffSchedule {
        BackoffSchedule::fibonacci(self.ttl, self.unit)
    }
}
