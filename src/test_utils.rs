//! Test fixtures.
//!
//! Builders for well-formed orders and payloads, shared by unit tests and
//! the integration test binaries.

use chrono::{TimeZone, Utc};

use crate::order::{Delivery, Item, Order, Payment};

/// Build a complete order with two items for the given identifier.
pub fn make_order(order_uid: &str) -> Order {
    let track_number = format!("WBILM{}", order_uid.to_uppercase());

    Order {
        order_uid: order_uid.to_string(),
        track_number: track_number.clone(),
        entry: "WBIL".to_string(),
        delivery: Delivery {
            name: "Test Testov".to_string(),
            phone: "+9720000000".to_string(),
            zip: "2639809".to_string(),
            city: "Kiryat Mozkin".to_string(),
            address: "Ploshad Mira 15".to_string(),
            region: "Kraiot".to_string(),
            email: "test@gmail.com".to_string(),
        },
        payment: Payment {
            transaction: order_uid.to_string(),
            request_id: String::new(),
            currency: "USD".to_string(),
            provider: "wbpay".to_string(),
            amount: 1817,
            payment_dt: 1_637_907_727,
            bank: "alpha".to_string(),
            delivery_cost: 1500,
            goods_total: 317,
            custom_fee: 0,
        },
        items: vec![
            make_item(9_934_930, &track_number, "Mascaras"),
            make_item(9_934_931, &track_number, "Lipstick"),
        ],
        locale: "en".to_string(),
        internal_signature: String::new(),
        customer_id: "test".to_string(),
        delivery_service: "meest".to_string(),
        shardkey: "9".to_string(),
        sm_id: 99,
        date_created: Utc.with_ymd_and_hms(2021, 11, 26, 6, 22, 19).unwrap(),
        oof_shard: "1".to_string(),
    }
}

/// Build a single line item.
pub fn make_item(chrt_id: i64, track_number: &str, name: &str) -> Item {
    Item {
        chrt_id,
        track_number: track_number.to_string(),
        price: 453,
        rid: format!("ab4219087a764ae0b{}", chrt_id),
        name: name.to_string(),
        sale: 30,
        size: "0".to_string(),
        total_price: 317,
        nm_id: 2_389_212,
        brand: "Vivienne Sabo".to_string(),
        status: 202,
    }
}

/// JSON payload for [`make_order`].
pub fn make_payload(order_uid: &str) -> Vec<u8> {
    serde_json::to_vec(&make_order(order_uid)).unwrap()
}
