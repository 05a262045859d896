use log::*;
use tempfile::TempDir;

use crate::SqliteDatabase;

/// A migrated SQLite database in a temporary directory. The directory is removed when this is dropped.
pub struct TestDatabase {
    pub db: SqliteDatabase,
    _dir: TempDir,
}

pub async fn prepare_test_env() -> TestDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    let dir = tempfile::tempdir().expect("Error creating temporary directory");
    let url = format!("sqlite://{}", dir.path().join("payout_store.db").display());
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
    db.run_migrations().await.expect("Error running DB migrations");
    info!("🚀️ Test database ready at {url}");
    TestDatabase { db, _dir: dir }
}
