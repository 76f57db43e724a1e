//! Unified SQL storage implementations.
//!
//! This module provides shared implementations for SQL-based storage backends
//! (PostgreSQL, SQLite). The implementations are parameterized by database type
//! using the `SqlDatabase` trait; statements are built once in `statements`.

mod invalid_sink;
mod order_store;
mod query;
pub mod statements;

pub use invalid_sink::SqlInvalidSink;
pub use order_store::SqlOrderStore;
pub use query::SqlDatabase;

#[cfg(feature = "postgres")]
pub mod postgres {
    //! PostgreSQL database backend.

    use std::time::Duration;

    use sea_query::PostgresQueryBuilder;
    use sea_query_binder::{SqlxBinder, SqlxValues};
    use sqlx::postgres::PgPoolOptions;
    use sqlx::PgPool;

    use crate::storage::schema::POSTGRES_SCHEMA;

    /// PostgreSQL database marker type.
    pub struct Postgres;

    impl super::SqlDatabase for Postgres {
        type Pool = PgPool;

        const SCHEMA: &'static [&'static str] = POSTGRES_SCHEMA;

        fn build_select(stmt: sea_query::SelectStatement) -> (String, SqlxValues) {
            stmt.build_sqlx(PostgresQueryBuilder)
        }

        fn build_insert(stmt: sea_query::InsertStatement) -> (String, SqlxValues) {
            stmt.build_sqlx(PostgresQueryBuilder)
        }
    }

    /// PostgreSQL order store.
    pub type PostgresOrderStore = super::SqlOrderStore<Postgres>;

    /// PostgreSQL invalid record sink.
    pub type PostgresInvalidSink = super::SqlInvalidSink<Postgres>;

    /// Open a connection pool.
    pub async fn connect(uri: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
        PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(uri)
            .await
    }
}

#[cfg(feature = "sqlite")]
pub mod sqlite {
    //! SQLite database backend.

    use std::str::FromStr;
    use std::time::Duration;

    use sea_query::SqliteQueryBuilder;
    use sea_query_binder::{SqlxBinder, SqlxValues};
    use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
    use sqlx::SqlitePool;

    use crate::storage::schema::SQLITE_SCHEMA;

    /// Path value selecting a private in-memory database.
    pub const MEMORY_PATH: &str = ":memory:";

    /// SQLite database marker type.
    pub struct Sqlite;

    impl super::SqlDatabase for Sqlite {
        type Pool = SqlitePool;

        const SCHEMA: &'static [&'static str] = SQLITE_SCHEMA;

        fn build_select(stmt: sea_query::SelectStatement) -> (String, SqlxValues) {
            stmt.build_sqlx(SqliteQueryBuilder)
        }

        fn build_insert(stmt: sea_query::InsertStatement) -> (String, SqlxValues) {
            stmt.build_sqlx(SqliteQueryBuilder)
        }
    }

    /// SQLite order store.
    pub type SqliteOrderStore = super::SqlOrderStore<Sqlite>;

    /// SQLite invalid record sink.
    pub type SqliteInvalidSink = super::SqlInvalidSink<Sqlite>;

    /// Open a connection pool on a database file, creating it if missing.
    ///
    /// [`MEMORY_PATH`] opens an in-memory database held by a single pinned
    /// connection; every other connection would see its own empty database.
    pub async fn connect(path: &str) -> Result<SqlitePool, sqlx::Error> {
        if path == MEMORY_PATH {
            let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
            return SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await;
        }

        if let Some(parent) = std::path::Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(5));

        SqlitePoolOptions::new().connect_with(options).await
    }
}
