//! pgconn CLI - PostgreSQL connection pool diagnostics
//!
//! Thin command-line front end over `pgconn-core`:
//! - `check`: verify the database is reachable
//! - `query`: run a parameterized statement and print rows as JSON
//! - `status`: print pool configuration and occupancy as JSON

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod config;
mod tracing_setup;

#[derive(Parser, Debug)]
#[command(
    name = "pgconn",
    author,
    version,
    about = "Pooled PostgreSQL access: connectivity checks and ad-hoc queries",
    long_about = "Connects to PostgreSQL using DATABASE_URL (plus optional DATABASE_* tuning \
                  variables or a TOML config file) and runs diagnostics or queries through a \
                  bounded connection pool."
)]
struct Cli {
    /// Enable debug logging on stderr
    #[arg(long, global = true)]
    debug: bool,

    /// Path to a TOML config file with a [database] table
    #[arg(long, global = true, env = "PGCONN_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Verify connectivity by running a liveness query
    Check,
    /// Run a SQL statement and print the resulting rows as JSON
    Query(commands::query::QueryArgs),
    /// Show resolved pool settings and pool occupancy
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_setup::init(&tracing_setup::TracingConfig { debug: cli.debug }).ok();

    config::load_dotenv();
    let db_config = config::resolve_db_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Check => commands::run_check(&db_config).await?,
        Commands::Query(args) => commands::run_query(&db_config, args).await?,
        Commands::Status => commands::run_status(&db_config).await?,
    }
    Ok(())
}
