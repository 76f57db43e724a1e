//! Storage layer.
//!
//! This module contains:
//! - `OrderStore` trait: atomic multi-relation order persistence
//! - `InvalidSink` trait: append-only quarantine for undecodable payloads
//! - Implementations: SQLite, PostgreSQL, Mock

use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use crate::config::{StorageConfig, StorageType};

pub mod helpers;
mod invalid_sink;
pub mod mock;
mod order_store;
pub mod schema;
pub mod sql;

pub use invalid_sink::{InvalidRecord, InvalidSink};
pub use mock::{MockInvalidSink, MockOrderStore};
pub use order_store::{OrderStore, WriteOutcome};

#[cfg(feature = "postgres")]
pub use sql::postgres::{PostgresInvalidSink, PostgresOrderStore};
#[cfg(feature = "sqlite")]
pub use sql::sqlite::{SqliteInvalidSink, SqliteOrderStore};

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Order not found: {order_uid}")]
    NotFound { order_uid: String },

    #[error("Storage operation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Stored record '{key}' is corrupt: {reason}")]
    Corrupt { key: String, reason: String },

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl StorageError {
    /// Whether retrying the same operation may succeed.
    ///
    /// Timeouts, lost connections, pool exhaustion and lock contention are
    /// transient. Constraint violations, missing rows and corrupt data are not.
    pub fn is_transient(&self) -> bool {
        match self {
            StorageError::Timeout(_) | StorageError::Unavailable(_) => true,
            StorageError::Database(err) => is_transient_sqlx(err),
            StorageError::NotFound { .. } | StorageError::Corrupt { .. } => false,
        }
    }

    /// Whether this is a missing-order error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StorageError::NotFound { .. })
    }
}

fn is_transient_sqlx(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Io(_)
        | sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::WorkerCrashed => true,
        sqlx::Error::Database(db_err) => db_err
            .code()
            .map(|code| is_transient_db_code(&code))
            .unwrap_or(false),
        _ => false,
    }
}

/// SQLite BUSY/LOCKED, PostgreSQL serialization failure, deadlock,
/// connection exceptions (class 08) and operator intervention (class 57).
fn is_transient_db_code(code: &str) -> bool {
    matches!(code, "5" | "6" | "40001" | "40P01") || code.starts_with("08") || code.starts_with("57")
}

/// Initialize storage based on configuration.
///
/// Returns tuple of (OrderStore, InvalidSink) implementations sharing one
/// connection pool. Relations are created if missing.
pub async fn init_storage(
    config: &StorageConfig,
) -> std::result::Result<(Arc<dyn OrderStore>, Arc<dyn InvalidSink>), Box<dyn std::error::Error>>
{
    match config.storage_type {
        #[cfg(feature = "sqlite")]
        StorageType::Sqlite => {
            info!(path = %config.sqlite.path, "Storage: sqlite");

            let pool = sql::sqlite::connect(&config.sqlite.path).await?;

            let order_store = Arc::new(SqliteOrderStore::new(pool.clone()));
            order_store.init().await?;

            let invalid_sink = Arc::new(SqliteInvalidSink::new(pool));

            Ok((order_store, invalid_sink))
        }
        #[cfg(feature = "postgres")]
        StorageType::Postgres => {
            info!("Storage: postgres");

            let pool = sql::postgres::connect(&config.postgres.uri, config.postgres.max_connections)
                .await?;

            let order_store = Arc::new(PostgresOrderStore::new(pool.clone()));
            order_store.init().await?;

            let invalid_sink = Arc::new(PostgresInvalidSink::new(pool));

            Ok((order_store, invalid_sink))
        }
        #[allow(unreachable_patterns)]
        ref other => {
            tracing::error!(storage_type = ?other, "Storage backend not enabled in this build");
            Err(format!("Storage backend {:?} not enabled in this build", other).into())
        }
    }
}
