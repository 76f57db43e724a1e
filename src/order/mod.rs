//! Order aggregate types.
//!
//! An [`Order`] is the full composed record of one order: header fields,
//! delivery, payment and line items. Field names match the inbound JSON
//! format, and serializing an `Order` yields the canonical representation
//! held by the cache ([`CachedOrder`]).

mod decode;

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use decode::{decode, DecodeError};

/// Full order aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Globally unique order identifier.
    pub order_uid: String,
    pub track_number: String,
    /// Entry channel.
    pub entry: String,
    pub delivery: Delivery,
    pub payment: Payment,
    pub items: Vec<Item>,
    pub locale: String,
    pub internal_signature: String,
    pub customer_id: String,
    pub delivery_service: String,
    pub shardkey: String,
    /// Submission id.
    pub sm_id: i64,
    pub date_created: DateTime<Utc>,
    /// Shard-override flag, kept in its textual wire form.
    pub oof_shard: String,
}

/// Delivery recipient and address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    pub name: String,
    pub phone: String,
    pub zip: String,
    pub city: String,
    pub address: String,
    pub region: String,
    pub email: String,
}

/// Payment details. `transaction` always equals the owning order's identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub transaction: String,
    pub request_id: String,
    pub currency: String,
    pub provider: String,
    pub amount: i64,
    /// Unix timestamp (seconds) of the payment.
    pub payment_dt: i64,
    pub bank: String,
    pub delivery_cost: i64,
    pub goods_total: i64,
    pub custom_fee: i64,
}

/// Single order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    /// Catalog id.
    pub chrt_id: i64,
    pub track_number: String,
    pub price: i64,
    /// Row id.
    pub rid: String,
    pub name: String,
    /// Discount.
    pub sale: i64,
    pub size: String,
    pub total_price: i64,
    pub nm_id: i64,
    pub brand: String,
    pub status: i64,
}

impl Order {
    /// Serialize into the canonical cached representation.
    pub fn to_cached(&self) -> Result<CachedOrder, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        Ok(CachedOrder(Arc::from(json)))
    }
}

/// Serialized order aggregate as held by the cache and returned by lookups.
///
/// Cloning is cheap: the JSON text is shared.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CachedOrder(Arc<str>);

impl CachedOrder {
    /// JSON text of the aggregate.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Decode back into an [`Order`].
    pub fn to_order(&self) -> Result<Order, serde_json::Error> {
        serde_json::from_str(&self.0)
    }
}

impl fmt::Display for CachedOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CachedOrder {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
