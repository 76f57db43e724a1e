use std::sync::Arc;

use super::*;
use crate::storage::{MockOrderStore, OrderStore};
use crate::test_utils::make_order;

fn cached(uid: &str) -> CachedOrder {
    make_order(uid).to_cached().unwrap()
}

#[test]
fn test_get_missing_returns_none() {
    let cache = OrderCache::new();
    assert!(cache.get("missing").is_none());
    assert!(cache.is_empty());
}

#[test]
fn test_set_then_get() {
    let cache = OrderCache::new();
    cache.set("abc123", cached("abc123"));

    assert_eq!(cache.get("abc123"), Some(cached("abc123")));
    assert!(cache.contains("abc123"));
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_set_replaces_existing() {
    let cache = OrderCache::new();
    cache.set("abc123", cached("abc123"));
    cache.set("abc123", cached("other"));

    assert_eq!(cache.get("abc123"), Some(cached("other")));
    assert_eq!(cache.len(), 1);
}

#[test]
fn test_clones_share_entries() {
    let cache = OrderCache::new();
    let reader = cache.clone();
    cache.set("abc123", cached("abc123"));

    assert!(reader.contains("abc123"));
}

#[tokio::test]
async fn test_concurrent_readers_see_whole_values() {
    let cache = OrderCache::new();
    let first = cached("first");
    let second = cached("second");
    cache.set("key", first.clone());

    let writer = {
        let cache = cache.clone();
        let (first, second) = (first.clone(), second.clone());
        tokio::spawn(async move {
            for i in 0..500 {
                let value = if i % 2 == 0 { &second } else { &first };
                cache.set("key", value.clone());
                tokio::task::yield_now().await;
            }
        })
    };

    for _ in 0..500 {
        let seen = cache.get("key").unwrap();
        assert!(seen == first || seen == second);
        tokio::task::yield_now().await;
    }

    writer.await.unwrap();
}

#[tokio::test]
async fn test_hydrate_loads_every_stored_order() {
    let store = MockOrderStore::new();
    for uid in ["a", "b", "c"] {
        store.write(&make_order(uid)).await.unwrap();
    }

    let hydrated = hydrate(&store).await.unwrap();

    assert_eq!(
        hydrated.report(),
        HydrationReport {
            loaded: 3,
            skipped: 0
        }
    );
    for uid in ["a", "b", "c"] {
        let expected = store.read(uid).await.unwrap().to_cached().unwrap();
        assert_eq!(hydrated.cache().get(uid), Some(expected));
    }
}

#[tokio::test]
async fn test_hydrate_empty_store() {
    let store = MockOrderStore::new();
    let hydrated = hydrate(&store).await.unwrap();

    assert_eq!(hydrated.report(), HydrationReport::default());
    assert!(hydrated.cache().is_empty());
}

#[tokio::test]
async fn test_hydrate_skips_failing_identifier() {
    let store = MockOrderStore::new();
    for uid in ["a", "b", "c"] {
        store.write(&make_order(uid)).await.unwrap();
    }
    store.fail_reads_for("b").await;

    let hydrated = hydrate(&store).await.unwrap();

    assert_eq!(hydrated.report().loaded, 2);
    assert_eq!(hydrated.report().skipped, 1);
    assert!(hydrated.cache().contains("a"));
    assert!(!hydrated.cache().contains("b"));
    assert!(hydrated.cache().contains("c"));
}

#[tokio::test]
async fn test_hydrate_fails_when_listing_fails() {
    let store = MockOrderStore::new();
    store.set_fail_on_list(true).await;

    let result = hydrate(&store).await;
    assert!(matches!(result, Err(HydrationError::List(_))));
}

#[tokio::test]
async fn test_hydrate_through_trait_object() {
    let store: Arc<dyn OrderStore> = Arc::new(MockOrderStore::new());
    store.write(&make_order("abc123")).await.unwrap();

    let hydrated = hydrate(store.as_ref()).await.unwrap();
    assert_eq!(hydrated.report().loaded, 1);
}
