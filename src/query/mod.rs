//! Order lookups.
//!
//! The query service answers point lookups from the hydrated cache only.
//! A miss is a normal "no such order" answer; storage is never consulted.

use tracing::debug;

use crate::cache::{HydratedCache, OrderCache};
use crate::order::CachedOrder;

/// Point lookups against the order cache.
#[derive(Debug, Clone)]
pub struct QueryService {
    cache: OrderCache,
}

impl QueryService {
    /// Serve lookups from a cache that has finished hydration.
    pub fn new(hydrated: &HydratedCache) -> Self {
        Self {
            cache: hydrated.cache().clone(),
        }
    }

    /// Serialized aggregate for an identifier, or `None` if unknown.
    pub fn lookup(&self, order_uid: &str) -> Option<CachedOrder> {
        let found = self.cache.get(order_uid);
        debug!(order_uid, hit = found.is_some(), "Order lookup");
        found
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::cache::hydrate;
    use crate::config::ConsumerConfig;
    use crate::consumer::OrderConsumer;
    use crate::storage::{MockInvalidSink, MockOrderStore, OrderStore};
    use crate::test_utils::{make_order, make_payload};

    #[tokio::test]
    async fn test_lookup_missing_is_none() {
        let store = MockOrderStore::new();
        let query = QueryService::new(&hydrate(&store).await.unwrap());

        assert!(query.lookup("missing-id").is_none());
        assert!(query.lookup("missing-id").is_none());
    }

    #[tokio::test]
    async fn test_lookup_hydrated_order() {
        let store = MockOrderStore::new();
        store.write(&make_order("abc123")).await.unwrap();

        let query = QueryService::new(&hydrate(&store).await.unwrap());

        let found = query.lookup("abc123").unwrap();
        assert_eq!(found.to_order().unwrap(), make_order("abc123"));
    }

    #[tokio::test]
    async fn test_lookup_never_reads_store() {
        let store = MockOrderStore::new();
        let query = QueryService::new(&hydrate(&store).await.unwrap());

        // Stored after hydration, outside the consumer: invisible to lookups.
        store.write(&make_order("abc123")).await.unwrap();
        assert!(query.lookup("abc123").is_none());
    }

    #[tokio::test]
    async fn test_lookup_sees_consumer_writes() {
        let store = Arc::new(MockOrderStore::new());
        let hydrated = hydrate(store.as_ref()).await.unwrap();
        let query = QueryService::new(&hydrated);
        let consumer = OrderConsumer::new(
            store.clone(),
            Arc::new(MockInvalidSink::new()),
            hydrated.cache().clone(),
            ConsumerConfig::default(),
        );

        consumer.handle(&make_payload("abc123")).await.unwrap();

        let expected = store.read("abc123").await.unwrap().to_cached().unwrap();
        assert_eq!(query.lookup("abc123"), Some(expected));
    }
}
