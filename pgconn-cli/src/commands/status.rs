//! Pool and server status as JSON.

use anyhow::{Context, Result};
use pgconn_core::{Database, DbConfig, PoolStatus};
use serde::Serialize;

#[derive(Serialize)]
struct StatusReport {
    dsn: String,
    tls_mode: String,
    server_time: String,
    pool: PoolStatus,
}

pub async fn run_status(config: &DbConfig) -> Result<()> {
    let db = Database::new(config)?;
    let outcome = db.test_connection().await;
    let pool = db.status();
    db.close().await;

    let server_time = outcome.context("Database connection check failed")?;
    let report = StatusReport {
        dsn: config.redacted_dsn(),
        tls_mode: config.tls_mode.to_string(),
        server_time: server_time.to_rfc3339(),
        pool,
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
