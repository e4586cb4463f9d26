//! # pgconn-core
//!
//! Shared PostgreSQL connection pool with query and transaction helpers.
//!
//! The application builds one [`Database`] at startup from a [`DbConfig`]
//! and passes clones of it to whatever needs the database. Pooling, TLS and
//! the wire protocol are handled by sqlx; this crate adds the configuration
//! policy, row decoding into JSON maps, uniform error classification and
//! logging, and transaction handles that cannot leak their connection.
//!
//! ## Example
//!
//! ```rust,ignore
//! use pgconn_core::{Database, DbConfig};
//!
//! let db = Database::connect(&DbConfig::from_env()?).await?;
//! let user = db
//!     .query_one("SELECT id, email FROM users WHERE id = $1", &[7.into()])
//!     .await?;
//!
//! let mut tx = db.begin_transaction().await?;
//! tx.execute("UPDATE users SET active = false WHERE id = $1", &[7.into()]).await?;
//! tx.commit().await?;
//!
//! db.close().await;
//! ```

pub mod config;
pub mod error;
pub mod params;
pub mod pool;
pub mod record;
pub mod txn;
mod wire;

pub use config::{DbConfig, TlsMode};
pub use error::{ConnectionFailure, DbError, Result};
pub use params::{HasParamType, Param, ParamType};
pub use pool::{Database, PoolStatus};
pub use record::Record;
pub use txn::{PooledConnection, Transaction};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{Database, DbConfig, DbError, Param, Record, TlsMode, Transaction};
}
