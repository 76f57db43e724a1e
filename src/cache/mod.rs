//! In-process order cache.
//!
//! Maps order identifiers to their serialized aggregate. The cache is
//! written by the consumer (after a durable write succeeds) and during
//! startup hydration, and read by the query service. Entries never expire.

mod hydrate;

use std::sync::Arc;

use dashmap::DashMap;

use crate::order::CachedOrder;

pub use hydrate::{hydrate, HydratedCache, HydrationError, HydrationReport};

/// Shared identifier to serialized-aggregate map.
///
/// Clones share the same underlying map. `get` and `set` are atomic per
/// key: a reader sees either the previous value or the new one.
#[derive(Clone, Default)]
pub struct OrderCache {
    entries: Arc<DashMap<String, CachedOrder>>,
}

impl OrderCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up an identifier. Never touches storage.
    pub fn get(&self, order_uid: &str) -> Option<CachedOrder> {
        self.entries.get(order_uid).map(|entry| entry.value().clone())
    }

    /// Insert or replace the entry for an identifier (last write wins).
    pub fn set(&self, order_uid: impl Into<String>, order: CachedOrder) {
        self.entries.insert(order_uid.into(), order);
    }

    pub fn contains(&self, order_uid: &str) -> bool {
        self.entries.contains_key(order_uid)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for OrderCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderCache")
            .field("entries", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests;
