use std::time::Duration;

use log::*;

/// Reads a duration from the environment variable `name`.
///
/// Plain integers are seconds. The suffixes `ms`, `s`, `m` and `h` are also accepted, e.g. `250ms` or `24h`.
/// Missing or malformed values fall back to `default`; malformed values are logged.
pub fn duration_from_env(name: &str, default: Duration) -> Duration {
    match std::env::var(name) {
        Ok(s) => parse_duration(&s).unwrap_or_else(|| {
            error!("🪛️ {s} is not a valid duration for {name}. Using the default, {default:?}, instead.");
            default
        }),
        Err(_) => default,
    }
}

pub fn parse_duration(value: &str) -> Option<Duration> {
    let value = value.trim();
    let split = value.find(|c: char| !c.is_ascii_digit()).unwrap_or(value.len());
    let (digits, unit) = value.split_at(split);
    let n = digits.parse::<u64>().ok()?;
    match unit.trim() {
        "" | "s" => Some(Duration::from_secs(n)),
        "ms" => Some(Duration::from_millis(n)),
        "m" => n.checked_mul(60).map(Duration::from_secs),
        "h" => n.checked_mul(3600).map(Duration::from_secs),
        _ => None,
    }
}
