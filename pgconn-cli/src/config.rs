use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use pgconn_core::DbConfig;
use tracing::{debug, info};

/// Load environment variables from .env files
///
/// Priority order (highest to lowest):
/// 1. Environment variables already set
/// 2. Current directory .env
/// 3. ~/.pgconn/.env
pub fn load_dotenv() {
    let mut loaded_from = Vec::new();

    if let Ok(path) = dotenvy::dotenv() {
        loaded_from.push(format!("current directory ({})", path.display()));
    }

    if let Some(env_file) = config_dir().map(|dir| dir.join(".env")) {
        if env_file.exists() {
            // dotenvy doesn't overwrite existing vars, so this is safe
            match dotenvy::from_path(&env_file) {
                Ok(_) => loaded_from.push(format!("~/.pgconn/.env ({})", env_file.display())),
                Err(e) => debug!("Failed to load {}: {}", env_file.display(), e),
            }
        }
    }

    if loaded_from.is_empty() {
        debug!("No .env files found (current dir or ~/.pgconn)");
    } else {
        info!("Loaded environment from: {}", loaded_from.join(", "));
    }
}

/// Get the pgconn config directory path (~/.pgconn)
pub fn config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".pgconn"))
}

/// Resolve the pool configuration.
///
/// An explicit `--config` path must exist; otherwise ~/.pgconn/config.toml is
/// used when present. Environment variables override file values.
pub fn resolve_db_config(explicit: Option<&Path>) -> Result<DbConfig> {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => config_dir()
            .map(|dir| dir.join("config.toml"))
            .filter(|path| path.exists()),
    };

    if let Some(path) = &path {
        debug!("Using config file {}", path.display());
    }

    DbConfig::load(path.as_deref()).context("Failed to resolve database configuration")
}
