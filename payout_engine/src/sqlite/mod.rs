//! SQLite backend for the payout engine.
mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
