//! SQL database abstraction trait.

use sea_query_binder::SqlxValues;

/// Trait for SQL database backends.
///
/// This trait abstracts over different SQL databases (PostgreSQL, SQLite)
/// by providing the pool type, the DDL and query building methods.
/// Statements render to SQL with placeholders plus the values to bind.
pub trait SqlDatabase: Send + Sync + 'static {
    /// The connection pool type for this database.
    type Pool: Clone + Send + Sync;

    /// DDL statements creating every relation, executed in order.
    const SCHEMA: &'static [&'static str];

    /// Build a parameterized query from a sea-query SELECT statement.
    fn build_select(stmt: sea_query::SelectStatement) -> (String, SqlxValues);

    /// Build a parameterized query from a sea-query INSERT statement.
    fn build_insert(stmt: sea_query::InsertStatement) -> (String, SqlxValues);
}
