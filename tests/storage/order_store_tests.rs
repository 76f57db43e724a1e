//! OrderStore interface tests.
//!
//! These tests verify the contract of the OrderStore trait.
//! Each test uses its own identifiers so the suite can share one store.

use orderstream::order::Order;
use orderstream::storage::{OrderStore, WriteOutcome};
use orderstream::test_utils::{make_item, make_order};

/// Test writing an order and reading back the same aggregate.
pub async fn test_write_then_read<S: OrderStore>(store: &S) {
    let order = make_order("rt-order");

    let outcome = store.write(&order).await.expect("write should succeed");
    assert_eq!(outcome, WriteOutcome::Created);

    let stored = store.read("rt-order").await.expect("read should succeed");
    assert_eq!(stored, order);
}

/// Test that writing an existing identifier is a reported no-op.
pub async fn test_duplicate_write_is_noop<S: OrderStore>(store: &S) {
    let original = make_order("dup-order");
    assert_eq!(store.write(&original).await.unwrap(), WriteOutcome::Created);

    let mut changed = make_order("dup-order");
    changed.customer_id = "someone-else".to_string();
    changed.items.push(make_item(1, &changed.track_number, "Extra"));

    let outcome = store.write(&changed).await.expect("duplicate should not error");
    assert_eq!(outcome, WriteOutcome::Duplicate);

    let stored = store.read("dup-order").await.unwrap();
    assert_eq!(stored, original, "first write must win");
}

/// Test that reading an unknown identifier is NotFound.
pub async fn test_read_missing<S: OrderStore>(store: &S) {
    let err = store.read("never-written").await.unwrap_err();
    assert!(err.is_not_found(), "expected NotFound, got {err}");
}

/// Test an order with no line items.
pub async fn test_order_without_items<S: OrderStore>(store: &S) {
    let mut order = make_order("no-items");
    order.items.clear();

    assert_eq!(store.write(&order).await.unwrap(), WriteOutcome::Created);

    let stored = store.read("no-items").await.unwrap();
    assert!(stored.items.is_empty());
    assert_eq!(stored, order);
}

/// Test that items come back in the order they were written.
pub async fn test_items_keep_order<S: OrderStore>(store: &S) {
    let mut order = make_order("many-items");
    order.items = (0..12)
        .rev()
        .map(|i| make_item(100 + i, &order.track_number, &format!("item-{i}")))
        .collect();

    store.write(&order).await.unwrap();

    let stored = store.read("many-items").await.unwrap();
    let names: Vec<_> = stored.items.iter().map(|i| i.name.as_str()).collect();
    let expected: Vec<_> = order.items.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, expected);
}

/// Test that items belong to their order, not to a shared track number.
pub async fn test_items_not_shared_by_track_number<S: OrderStore>(store: &S) {
    let mut first = make_order("shared-track-a");
    let mut second = make_order("shared-track-b");
    first.track_number = "SHAREDTRACK".to_string();
    second.track_number = "SHAREDTRACK".to_string();
    first.items = vec![make_item(501, "SHAREDTRACK", "First")];
    second.items = vec![
        make_item(502, "SHAREDTRACK", "Second"),
        make_item(503, "SHAREDTRACK", "Third"),
    ];

    store.write(&first).await.unwrap();
    store.write(&second).await.unwrap();

    assert_eq!(store.read("shared-track-a").await.unwrap().items, first.items);
    assert_eq!(store.read("shared-track-b").await.unwrap().items, second.items);
}

/// Test that text with quotes and non-ASCII characters survives storage.
pub async fn test_text_round_trips<S: OrderStore>(store: &S) {
    let mut order = make_order("text-order");
    order.delivery.name = "O'Brien \"Junior\"".to_string();
    order.delivery.address = "ул. Ленина, 5 \\ кв. 7".to_string();
    order.items[0].name = "Crème brûlée; DROP TABLE items; --".to_string();

    store.write(&order).await.unwrap();

    assert_eq!(store.read("text-order").await.unwrap(), order);
}

/// Test that control characters other than NUL survive storage.
pub async fn test_control_characters_round_trip<S: OrderStore>(store: &S) {
    let mut order = make_order("ctrl-order");
    order.delivery.address = "line one\nline two\r\n\ttabbed".to_string();
    order.delivery.region = "\u{1}\u{1f}\u{7f}bell\u{7}".to_string();
    order.internal_signature = "'; -- \\' $1 ? :name".to_string();
    order.items[1].brand = "Émoji 🚚 \u{2028}".to_string();

    assert_eq!(store.write(&order).await.unwrap(), WriteOutcome::Created);

    let stored = store.read("ctrl-order").await.unwrap();
    assert_eq!(stored, order);
    assert_eq!(stored.to_cached().unwrap(), order.to_cached().unwrap());
}

/// Test that integer fields keep their full range.
pub async fn test_integer_extremes_round_trip<S: OrderStore>(store: &S) {
    let mut order = make_order("int-order");
    order.sm_id = i64::MAX;
    order.payment.amount = i64::MIN;
    order.payment.payment_dt = 0;
    order.items[0].chrt_id = i64::MAX;
    order.items[0].status = -1;

    store.write(&order).await.unwrap();

    assert_eq!(store.read("int-order").await.unwrap(), order);
}

/// Test listing identifiers in ascending order.
pub async fn test_list_identifiers<S: OrderStore>(store: &S) {
    for uid in ["list-c", "list-a", "list-b"] {
        store.write(&make_order(uid)).await.unwrap();
    }

    let ids = store.list_identifiers().await.expect("list should succeed");

    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted, "identifiers must be ascending");

    let listed: Vec<_> = ids.iter().filter(|id| id.starts_with("list-")).collect();
    assert_eq!(listed, ["list-a", "list-b", "list-c"]);
}

/// Test that every listed identifier reads back.
pub async fn test_listed_identifiers_are_readable<S: OrderStore>(store: &S) {
    store.write(&make_order("listed-readable")).await.unwrap();

    for uid in store.list_identifiers().await.unwrap() {
        let order: Order = store.read(&uid).await.expect("listed id should be readable");
        assert_eq!(order.order_uid, uid);
    }
}

/// Run all OrderStore tests against a store implementation.
#[macro_export]
macro_rules! run_order_store_tests {
    ($store:expr) => {
        use $crate::storage::order_store_tests::*;

        test_read_missing($store).await;
        println!("  test_read_missing: PASSED");

        test_write_then_read($store).await;
        println!("  test_write_then_read: PASSED");

        test_duplicate_write_is_noop($store).await;
        println!("  test_duplicate_write_is_noop: PASSED");

        test_order_without_items($store).await;
        println!("  test_order_without_items: PASSED");

        test_items_keep_order($store).await;
        println!("  test_items_keep_order: PASSED");

        test_items_not_shared_by_track_number($store).await;
        println!("  test_items_not_shared_by_track_number: PASSED");

        test_text_round_trips($store).await;
        println!("  test_text_round_trips: PASSED");

        test_control_characters_round_trip($store).await;
        println!("  test_control_characters_round_trip: PASSED");

        test_integer_extremes_round_trip($store).await;
        println!("  test_integer_extremes_round_trip: PASSED");

        test_list_identifiers($store).await;
        println!("  test_list_identifiers: PASSED");

        test_listed_identifiers_are_readable($store).await;
        println!("  test_listed_identifiers_are_readable: PASSED");
    };
}
