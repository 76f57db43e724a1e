//! Database schema definitions using sea-query.
//!
//! These define the table and column identifiers for type-safe query building,
//! plus the DDL for each backend. Relation names are shared by every backend.

use sea_query::Iden;

/// Order header table.
#[derive(Iden)]
pub enum OrderInfo {
    Table,
    OrderUid,
    TrackNumber,
    Entry,
    Locale,
    InternalSignature,
    CustomerId,
    DeliveryService,
    Shardkey,
    SmId,
    DateCreated,
    OofShard,
}

/// Delivery table, keyed by a surrogate id.
#[derive(Iden)]
pub enum Deliveries {
    Table,
    Id,
    Name,
    Phone,
    Zip,
    City,
    Address,
    Region,
    Email,
}

/// Payment table, keyed by transaction id (= order identifier).
#[derive(Iden)]
pub enum Payments {
    Table,
    Transaction,
    RequestId,
    Currency,
    Provider,
    Amount,
    PaymentDt,
    Bank,
    DeliveryCost,
    GoodsTotal,
    CustomFee,
}

/// Line item table. Rows belong to their order through `order_uid`.
#[derive(Iden)]
pub enum Items {
    Table,
    Id,
    OrderUid,
    ChrtId,
    TrackNumber,
    Price,
    Rid,
    Name,
    Sale,
    Size,
    TotalPrice,
    NmId,
    Brand,
    Status,
}

/// Header to delivery link table.
#[derive(Iden)]
pub enum OrderDelivery {
    Table,
    OrderUid,
    DeliveryId,
}

/// Quarantined payloads.
#[derive(Iden)]
pub enum InvalidData {
    Table,
    Id,
    Data,
    Reason,
    ReceivedAt,
}

/// SQLite DDL, one statement per entry.
pub const SQLITE_SCHEMA: &[&str] = &[
    r#"
CREATE TABLE IF NOT EXISTS order_info (
    order_uid TEXT PRIMARY KEY,
    track_number TEXT NOT NULL,
    entry TEXT NOT NULL,
    locale TEXT NOT NULL,
    internal_signature TEXT NOT NULL,
    customer_id TEXT NOT NULL,
    delivery_service TEXT NOT NULL,
    shardkey TEXT NOT NULL,
    sm_id INTEGER NOT NULL,
    date_created TEXT NOT NULL,
    oof_shard TEXT NOT NULL
)"#,
    r#"
CREATE TABLE IF NOT EXISTS deliveries (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    phone TEXT NOT NULL,
    zip TEXT NOT NULL,
    city TEXT NOT NULL,
    address TEXT NOT NULL,
    region TEXT NOT NULL,
    email TEXT NOT NULL
)"#,
    r#"
CREATE TABLE IF NOT EXISTS payments (
    "transaction" TEXT PRIMARY KEY REFERENCES order_info(order_uid),
    request_id TEXT NOT NULL,
    currency TEXT NOT NULL,
    provider TEXT NOT NULL,
    amount INTEGER NOT NULL,
    payment_dt INTEGER NOT NULL,
    bank TEXT NOT NULL,
    delivery_cost INTEGER NOT NULL,
    goods_total INTEGER NOT NULL,
    custom_fee INTEGER NOT NULL
)"#,
    r#"
CREATE TABLE IF NOT EXISTS items (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    order_uid TEXT NOT NULL REFERENCES order_info(order_uid),
    chrt_id INTEGER NOT NULL,
    track_number TEXT NOT NULL,
    price INTEGER NOT NULL,
    rid TEXT NOT NULL,
    name TEXT NOT NULL,
    sale INTEGER NOT NULL,
    size TEXT NOT NULL,
    total_price INTEGER NOT NULL,
    nm_id INTEGER NOT NULL,
    brand TEXT NOT NULL,
    status INTEGER NOT NULL
)"#,
    "CREATE INDEX IF NOT EXISTS idx_items_order_uid ON items(order_uid)",
    r#"
CREATE TABLE IF NOT EXISTS order_delivery (
    order_uid TEXT PRIMARY KEY REFERENCES order_info(order_uid),
    delivery_id INTEGER NOT NULL REFERENCES deliveries(id)
)"#,
    r#"
CREATE TABLE IF NOT EXISTS invalid_data (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    data BLOB NOT NULL,
    reason TEXT NOT NULL,
    received_at TEXT NOT NULL
)"#,
];

/// PostgreSQL DDL, one statement per entry.
pub const POSTGRES_SCHEMA: &[&str] = &[
    r#"
CREATE TABLE IF NOT EXISTS order_info (
    order_uid TEXT PRIMARY KEY,
    track_number TEXT NOT NULL,
    entry TEXT NOT NULL,
    locale TEXT NOT NULL,
    internal_signature TEXT NOT NULL,
    customer_id TEXT NOT NULL,
    delivery_service TEXT NOT NULL,
    shardkey TEXT NOT NULL,
    sm_id BIGINT NOT NULL,
    date_created TEXT NOT NULL,
    oof_shard TEXT NOT NULL
)"#,
    r#"
CREATE TABLE IF NOT EXISTS deliveries (
    id BIGSERIAL PRIMARY KEY,
    name TEXT NOT NULL,
    phone TEXT NOT NULL,
    zip TEXT NOT NULL,
    city TEXT NOT NULL,
    address TEXT NOT NULL,
    region TEXT NOT NULL,
    email TEXT NOT NULL
)"#,
    r#"
CREATE TABLE IF NOT EXISTS payments (
    "transaction" TEXT PRIMARY KEY REFERENCES order_info(order_uid),
    request_id TEXT NOT NULL,
    currency TEXT NOT NULL,
    provider TEXT NOT NULL,
    amount BIGINT NOT NULL,
    payment_dt BIGINT NOT NULL,
    bank TEXT NOT NULL,
    delivery_cost BIGINT NOT NULL,
    goods_total BIGINT NOT NULL,
    custom_fee BIGINT NOT NULL
)"#,
    r#"
CREATE TABLE IF NOT EXISTS items (
    id BIGSERIAL PRIMARY KEY,
    order_uid TEXT NOT NULL REFERENCES order_info(order_uid),
    chrt_id BIGINT NOT NULL,
    track_number TEXT NOT NULL,
    price BIGINT NOT NULL,
    rid TEXT NOT NULL,
    name TEXT NOT NULL,
    sale BIGINT NOT NULL,
    size TEXT NOT NULL,
    total_price BIGINT NOT NULL,
    nm_id BIGINT NOT NULL,
    brand TEXT NOT NULL,
    status BIGINT NOT NULL
)"#,
    "CREATE INDEX IF NOT EXISTS idx_items_order_uid ON items(order_uid)",
    r#"
CREATE TABLE IF NOT EXISTS order_delivery (
    order_uid TEXT PRIMARY KEY REFERENCES order_info(order_uid),
    delivery_id BIGINT NOT NULL REFERENCES deliveries(id)
)"#,
    r#"
CREATE TABLE IF NOT EXISTS invalid_data (
    id BIGSERIAL PRIMARY KEY,
    data BYTEA NOT NULL,
    reason TEXT NOT NULL,
    received_at TEXT NOT NULL
)"#,
];
