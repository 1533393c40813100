//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `cryptoguard_core` linkage.
//! - Summarize a persisted state file without modifying it.
//!
//! Usage: `cryptoguard_cli [STATE_DB_PATH]`

use cryptoguard_core::db::open_db;
use cryptoguard_core::{NotificationStore, SessionStore, SqliteKvRepository};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("cryptoguard_core ping={}", cryptoguard_core::ping());
    println!("cryptoguard_core version={}", cryptoguard_core::core_version());

    let Some(path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };

    let conn = match open_db(&path) {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("failed to open state db `{path}`: {err}");
            return ExitCode::FAILURE;
        }
    };
    let repo = SqliteKvRepository::new(conn);

    let session = SessionStore::new(&repo);
    println!("session authenticated={}", session.is_authenticated());
    println!("session favourites={}", session.favourites().len());

    let mut notifications = NotificationStore::new(&repo);
    let total = notifications.load().len();
    println!(
        "notifications total={} unread={}",
        total,
        notifications.unread_count()
    );

    ExitCode::SUCCESS
}
