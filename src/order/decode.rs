//! Inbound payload decoding and shape validation.

use super::Order;

/// Reasons a payload is rejected and routed to the invalid sink.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("Malformed order payload: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Order identifier is empty")]
    MissingIdentifier,

    #[error("Payment transaction '{transaction}' does not match order '{order_uid}'")]
    TransactionMismatch {
        order_uid: String,
        transaction: String,
    },

    #[error("Field '{0}' contains a NUL character")]
    NulCharacter(&'static str),
}

/// Decode a raw inbound payload into a validated [`Order`].
///
/// Every field of the aggregate is required; unknown fields are ignored.
pub fn decode(raw: &[u8]) -> Result<Order, DecodeError> {
    let order: Order = serde_json::from_slice(raw)?;

    if order.order_uid.trim().is_empty() {
        return Err(DecodeError::MissingIdentifier);
    }

    if order.payment.transaction != order.order_uid {
        return Err(DecodeError::TransactionMismatch {
            order_uid: order.order_uid,
            transaction: order.payment.transaction,
        });
    }

    if let Some(field) = field_with_nul(&order) {
        return Err(DecodeError::NulCharacter(field));
    }

    Ok(order)
}

/// First text field holding `\0`. SQL text columns cannot store it.
fn field_with_nul(order: &Order) -> Option<&'static str> {
    let delivery = &order.delivery;
    let payment = &order.payment;

    let mut fields = vec![
        ("order_uid", order.order_uid.as_str()),
        ("track_number", order.track_number.as_str()),
        ("entry", order.entry.as_str()),
        ("locale", order.locale.as_str()),
        ("internal_signature", order.internal_signature.as_str()),
        ("customer_id", order.customer_id.as_str()),
        ("delivery_service", order.delivery_service.as_str()),
        ("shardkey", order.shardkey.as_str()),
        ("oof_shard", order.oof_shard.as_str()),
        ("delivery.name", delivery.name.as_str()),
        ("delivery.phone", delivery.phone.as_str()),
        ("delivery.zip", delivery.zip.as_str()),
        ("delivery.city", delivery.city.as_str()),
        ("delivery.address", delivery.address.as_str()),
        ("delivery.region", delivery.region.as_str()),
        ("delivery.email", delivery.email.as_str()),
        ("payment.request_id", payment.request_id.as_str()),
        ("payment.currency", payment.currency.as_str()),
        ("payment.provider", payment.provider.as_str()),
        ("payment.bank", payment.bank.as_str()),
    ];
    for item in &order.items {
        fields.extend([
            ("items.track_number", item.track_number.as_str()),
            ("items.rid", item.rid.as_str()),
            ("items.name", item.name.as_str()),
            ("items.size", item.size.as_str()),
            ("items.brand", item.brand.as_str()),
        ]);
    }

    fields
        .into_iter()
        .find(|(_, value)| value.contains('\0'))
        .map(|(name, _)| name)
}
