//! End-to-end pipeline tests: channel stream, consumer, SQLite, hydration
//! and lookups.
//!
//! Run with: cargo test --test pipeline --features sqlite,channel

use orderstream::cache::hydrate;
use orderstream::config::Config;
use orderstream::consumer::{ConsumerStats, OrderConsumer};
use orderstream::query::QueryService;
use orderstream::storage::init_storage;
use orderstream::stream::channel::channel;
use orderstream::test_utils::{make_order, make_payload};

fn file_config(dir: &tempfile::TempDir) -> Config {
    let mut config = Config::for_test();
    config.storage.sqlite.path = dir
        .path()
        .join("orders.db")
        .to_str()
        .expect("temp path is UTF-8")
        .to_string();
    config
}

fn mismatched_payload(order_uid: &str) -> Vec<u8> {
    let mut order = make_order(order_uid);
    order.payment.transaction = "someone-else".to_string();
    serde_json::to_vec(&order).unwrap()
}

#[tokio::test]
async fn test_pipeline_ingests_and_serves() {
    let dir = tempfile::tempdir().unwrap();
    let config = file_config(&dir);

    let (store, sink) = init_storage(&config.storage).await.unwrap();
    let hydrated = hydrate(store.as_ref()).await.unwrap();
    assert_eq!(hydrated.report().loaded, 0);
    let query = QueryService::new(&hydrated);

    let (publisher, stream) = channel(16);
    for payload in [
        make_payload("order-1"),
        make_payload("order-2"),
        b"definitely not an order".to_vec(),
        make_payload("order-1"),
        mismatched_payload("order-bad"),
        make_payload("order-3"),
    ] {
        publisher.publish(payload).await.unwrap();
    }
    drop(publisher);

    let consumer = OrderConsumer::new(
        store.clone(),
        sink.clone(),
        hydrated.cache().clone(),
        config.consumer.clone(),
    );
    let stats = consumer.run(&stream).await.unwrap();

    assert_eq!(
        stats,
        ConsumerStats {
            received: 6,
            persisted: 3,
            duplicates: 1,
            quarantined: 2,
            failed: 0,
        }
    );

    for uid in ["order-1", "order-2", "order-3"] {
        let cached = query.lookup(uid).expect("persisted order is served");
        assert_eq!(cached.to_order().unwrap(), make_order(uid));
        assert_eq!(cached, store.read(uid).await.unwrap().to_cached().unwrap());
    }
    assert!(query.lookup("order-bad").is_none());
    assert!(store.read("order-bad").await.unwrap_err().is_not_found());

    let invalid = sink.recent(10).await.unwrap();
    assert_eq!(invalid.len(), 2);
    assert!(invalid
        .iter()
        .any(|r| r.payload == b"definitely not an order".to_vec()));
    assert!(invalid.iter().any(|r| r.payload == mismatched_payload("order-bad")));
}

#[tokio::test]
async fn test_restart_rehydrates_from_storage() {
    let dir = tempfile::tempdir().unwrap();
    let config = file_config(&dir);

    let first_run = {
        let (store, sink) = init_storage(&config.storage).await.unwrap();
        let hydrated = hydrate(store.as_ref()).await.unwrap();

        let (publisher, stream) = channel(8);
        publisher.publish(make_payload("kept-1")).await.unwrap();
        publisher.publish(make_payload("kept-2")).await.unwrap();
        drop(publisher);

        OrderConsumer::new(store, sink, hydrated.cache().clone(), config.consumer.clone())
            .run(&stream)
            .await
            .unwrap();

        let query = QueryService::new(&hydrated);
        (query.lookup("kept-1").unwrap(), query.lookup("kept-2").unwrap())
    };

    let (store, sink) = init_storage(&config.storage).await.unwrap();
    let hydrated = hydrate(store.as_ref()).await.unwrap();
    assert_eq!(hydrated.report().loaded, 2);
    assert_eq!(hydrated.report().skipped, 0);

    let query = QueryService::new(&hydrated);
    assert_eq!(query.lookup("kept-1").unwrap(), first_run.0);
    assert_eq!(query.lookup("kept-2").unwrap(), first_run.1);

    // Redelivery after restart changes nothing.
    let (publisher, stream) = channel(8);
    publisher.publish(make_payload("kept-1")).await.unwrap();
    drop(publisher);

    let stats = OrderConsumer::new(store, sink, hydrated.cache().clone(), config.consumer)
        .run(&stream)
        .await
        .unwrap();
    assert_eq!(stats.duplicates, 1);
    assert_eq!(query.lookup("kept-1").unwrap(), first_run.0);
}
