//! Connectivity check: open the pool, run the liveness query, close.

use anyhow::{Context, Result};
use pgconn_core::{Database, DbConfig};

pub async fn run_check(config: &DbConfig) -> Result<()> {
    let db = Database::new(config)?;
    let outcome = db.test_connection().await;
    db.close().await;

    let server_time = outcome.context("Database connection check failed")?;
    println!(
        "connected to {} (server time {})",
        config.redacted_dsn(),
        server_time.to_rfc3339()
    );
    Ok(())
}
