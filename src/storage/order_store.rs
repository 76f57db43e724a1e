//! OrderStore trait definition.

use async_trait::async_trait;

use super::Result;
use crate::order::Order;

/// Outcome of a successful [`OrderStore::write`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// All relations for the order were committed.
    Created,
    /// The identifier was already stored; nothing was written.
    Duplicate,
}

/// Interface for order aggregate persistence.
///
/// An order spans five relations (header, payment, delivery, the
/// header-delivery link and items). Implementations must write them as a
/// single unit: a reader sees either every relation for an identifier or
/// none of them.
///
/// Implementations:
/// - `SqliteOrderStore`: SQLite storage
/// - `PostgresOrderStore`: PostgreSQL storage
/// - `MockOrderStore`: In-memory mock for testing
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Persist an order atomically.
    ///
    /// Writing an identifier that already exists is a successful no-op
    /// reported as [`WriteOutcome::Duplicate`], which makes retries and
    /// redelivered messages safe.
    async fn write(&self, order: &Order) -> Result<WriteOutcome>;

    /// Reconstruct the full aggregate for an identifier.
    ///
    /// Fails with `StorageError::NotFound` when no header exists. Missing
    /// payment, delivery or items come back as empty sections.
    async fn read(&self, order_uid: &str) -> Result<Order>;

    /// List every stored identifier, ascending.
    async fn list_identifiers(&self) -> Result<Vec<String>>;
}
