//! Offline maintenance action: copy the on-disk database file to a
//! timestamped backup name. Not part of the running service; invoke manually
//! with `cargo run --bin backup`.

use std::path::Path;
use std::{env, fs};

use chrono::Utc;
use dotenvy::dotenv;

fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let src = env::var("DATABASE_FILE").unwrap_or_else(|_| "orders.db".to_string());
    if !Path::new(&src).exists() {
        log::info!("No database file at '{}' yet, nothing to back up", src);
        return Ok(());
    }

    let dest = format!("backup_{}.db", Utc::now().format("%Y%m%d%H%M%S"));
    fs::copy(&src, &dest)?;
    log::info!("Backup written to '{}'", dest);

    Ok(())
}
