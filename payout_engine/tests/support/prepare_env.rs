use std::time::Duration;

use log::*;
use payout_engine::{tracker::TrackerConfig, SqliteDatabase};
use tempfile::TempDir;

pub fn init_logging() {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
}

/// Opens (and migrates) the payout store at `dir`. Calling it twice on the same directory simulates a restart.
pub async fn open_store(dir: &TempDir) -> SqliteDatabase {
    init_logging();
    let url = format!("sqlite://{}", dir.path().join("payout_store.db").display());
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
    db.run_migrations().await.expect("Error running DB migrations");
    debug!("🚀️ Payout store ready at {url}");
    db
}

/// A tracker config with a short poll unit, suitable for tests that run with the clock paused.
pub fn fast_tracker() -> TrackerConfig {
    TrackerConfig {
        ttl: Duration::from_secs(60),
        unit: Duration::from_millis(10),
        fetch_timeout: Duration::from_millis(50),
        ..Default::default()
    }
}
