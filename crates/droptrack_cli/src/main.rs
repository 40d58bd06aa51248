//! CLI smoke entry point.
//!
//! # Responsibility
//! - Boot the core crate the way a deployment would: `.env`, logging,
//!   config, database bootstrap.
//! - Print a deterministic summary for quick local sanity checks.

use droptrack_core::{
    Config, DropoffRepository, SqliteDropoffRepository, SqliteUserRepository, UserRepository,
};
use log::info;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    // Load local .env if present (no-op in prod/systemd envs).
    let _ = dotenvy::dotenv();

    let cfg = Config::from_env()?;

    let log_dir = absolute(&cfg.log_dir)?;
    droptrack_core::init_logging(&cfg.log_level, &log_dir)?;
    info!(
        "event=cli_boot module=cli status=ok db_path={} zone={}",
        cfg.database_path,
        cfg.display_zone.name()
    );

    let conn = droptrack_core::db::open_db(&cfg.database_path)?;
    let user_count = SqliteUserRepository::new(&conn).list_users()?.len();
    let dropoff_count = SqliteDropoffRepository::new(&conn)
        .list_all_with_owner()?
        .len();

    println!("droptrack_core version={}", droptrack_core::core_version());
    println!("display_zone={}", cfg.display_zone.name());
    println!("users={user_count} dropoffs={dropoff_count}");
    Ok(())
}

fn absolute(path: &str) -> Result<String, Box<dyn Error>> {
    let p = std::path::Path::new(path);
    let abs = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };
    Ok(abs.to_string_lossy().into_owned())
}
