//! Checked-out connection and transaction handles.
//!
//! Both handles own their connection. Dropping a handle returns the
//! connection to the pool; there is no separate release call to forget.

use std::fmt;
use std::time::Instant;

use sqlx::pool::PoolConnection;
use sqlx::{PgConnection, Postgres};
use tracing::{debug, warn};

use crate::error::{DbError, Result};
use crate::params::Param;
use crate::pool::{execute_statement, fetch_records};
use crate::record::Record;

/// A connection checked out of the pool for exclusive use.
pub struct PooledConnection {
    conn: PoolConnection<Postgres>,
}

impl fmt::Debug for PooledConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledConnection").finish_non_exhaustive()
    }
}

impl PooledConnection {
    pub(crate) fn new(conn: PoolConnection<Postgres>) -> Self {
        Self { conn }
    }

    pub async fn query(&mut self, sql: &str, params: &[Param]) -> Result<Vec<Record>> {
        fetch_records(&mut *self.conn, "connection.query", sql, params).await
    }

    pub async fn query_one(&mut self, sql: &str, params: &[Param]) -> Result<Option<Record>> {
        Ok(self.query(sql, params).await?.into_iter().next())
    }

    pub async fn execute(&mut self, sql: &str, params: &[Param]) -> Result<u64> {
        execute_statement(&mut *self.conn, "connection.execute", sql, params).await
    }

    /// Raw driver connection for sqlx queries the helpers don't cover.
    pub fn as_connection(&mut self) -> &mut PgConnection {
        &mut self.conn
    }
}

/// An open transaction on a dedicated connection.
///
/// `commit` and `rollback` consume the handle. A transaction dropped without
/// either is rolled back by the driver and its connection released.
pub struct Transaction {
    inner: Option<sqlx::Transaction<'static, Postgres>>,
    started: Instant,
}

impl Transaction {
    pub(crate) fn new(tx: sqlx::Transaction<'static, Postgres>) -> Self {
        Self {
            inner: Some(tx),
            started: Instant::now(),
        }
    }

    fn conn(&mut self, operation: &'static str) -> Result<&mut PgConnection> {
        match self.inner.as_mut() {
            Some(tx) => Ok(&mut **tx),
            None => Err(DbError::Finished { operation }.logged()),
        }
    }

    pub async fn query(&mut self, sql: &str, params: &[Param]) -> Result<Vec<Record>> {
        const OP: &str = "transaction.query";
        let conn = self.conn(OP)?;
        fetch_records(conn, OP, sql, params).await
    }

    pub async fn query_one(&mut self, sql: &str, params: &[Param]) -> Result<Option<Record>> {
        Ok(self.query(sql, params).await?.into_iter().next())
    }

    pub async fn execute(&mut self, sql: &str, params: &[Param]) -> Result<u64> {
        const OP: &str = "transaction.execute";
        let conn = self.conn(OP)?;
        execute_statement(conn, OP, sql, params).await
    }

    /// Raw driver connection inside the transaction.
    pub fn as_connection(&mut self) -> Result<&mut PgConnection> {
        self.conn("transaction.as_connection")
    }

    /// Issue `COMMIT`. The connection is released whether or not it succeeds.
    pub async fn commit(mut self) -> Result<()> {
        const OP: &str = "commit_transaction";
        let Some(tx) = self.inner.take() else {
            return Err(DbError::Finished { operation: OP }.logged());
        };

        tx.commit()
            .await
            .map_err(|e| DbError::from_sqlx(OP, e).logged())?;
        debug!(
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "transaction committed"
        );
        Ok(())
    }

    /// Issue `ROLLBACK`. The connection is released whether or not it succeeds.
    pub async fn rollback(mut self) -> Result<()> {
        const OP: &str = "rollback_transaction";
        let Some(tx) = self.inner.take() else {
            return Err(DbError::Finished { operation: OP }.logged());
        };

        tx.rollback()
            .await
            .map_err(|e| DbError::from_sqlx(OP, e).logged())?;
        debug!(
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "transaction rolled back"
        );
        Ok(())
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("finished", &self.inner.is_none())
            .field("elapsed_ms", &(self.started.elapsed().as_millis() as u64))
            .finish()
    }
}

impl Drop for Transaction {
    fn drop(&mut self) {
        if self.inner.is_some() {
            warn!(
                elapsed_ms = self.started.elapsed().as_millis() as u64,
                "transaction dropped without commit or rollback; rolling back"
            );
        }
    }
}
