//! Backend-neutral statements for the order relations.
//!
//! Each function returns a sea-query statement; backends render it with
//! their own query builder.

use sea_query::{Expr, InsertStatement, OnConflict, Order as SortOrder, Query, SelectStatement};

use crate::order::{Delivery, Item, Order};
use crate::storage::helpers::format_timestamp;
use crate::storage::schema::{Deliveries, InvalidData, Items, OrderDelivery, OrderInfo, Payments};
use crate::storage::InvalidRecord;

/// Header insert. Conflicting identifiers insert nothing, so a zero row
/// count marks a duplicate.
pub fn insert_header(order: &Order) -> InsertStatement {
    Query::insert()
        .into_table(OrderInfo::Table)
        .columns([
            OrderInfo::OrderUid,
            OrderInfo::TrackNumber,
            OrderInfo::Entry,
            OrderInfo::Locale,
            OrderInfo::InternalSignature,
            OrderInfo::CustomerId,
            OrderInfo::DeliveryService,
            OrderInfo::Shardkey,
            OrderInfo::SmId,
            OrderInfo::DateCreated,
            OrderInfo::OofShard,
        ])
        .values_panic([
            order.order_uid.as_str().into(),
            order.track_number.as_str().into(),
            order.entry.as_str().into(),
            order.locale.as_str().into(),
            order.internal_signature.as_str().into(),
            order.customer_id.as_str().into(),
            order.delivery_service.as_str().into(),
            order.shardkey.as_str().into(),
            order.sm_id.into(),
            format_timestamp(&order.date_created).into(),
            order.oof_shard.as_str().into(),
        ])
        .on_conflict(OnConflict::column(OrderInfo::OrderUid).do_nothing().to_owned())
        .to_owned()
}

/// Payment insert, keyed by the owning order identifier.
pub fn insert_payment(order: &Order) -> InsertStatement {
    let payment = &order.payment;

    Query::insert()
        .into_table(Payments::Table)
        .columns([
            Payments::Transaction,
            Payments::RequestId,
            Payments::Currency,
            Payments::Provider,
            Payments::Amount,
            Payments::PaymentDt,
            Payments::Bank,
            Payments::DeliveryCost,
            Payments::GoodsTotal,
            Payments::CustomFee,
        ])
        .values_panic([
            order.order_uid.as_str().into(),
            payment.request_id.as_str().into(),
            payment.currency.as_str().into(),
            payment.provider.as_str().into(),
            payment.amount.into(),
            payment.payment_dt.into(),
            payment.bank.as_str().into(),
            payment.delivery_cost.into(),
            payment.goods_total.into(),
            payment.custom_fee.into(),
        ])
        .to_owned()
}

/// Delivery insert returning the generated surrogate id.
pub fn insert_delivery(delivery: &Delivery) -> InsertStatement {
    Query::insert()
        .into_table(Deliveries::Table)
        .columns([
            Deliveries::Name,
            Deliveries::Phone,
            Deliveries::Zip,
            Deliveries::City,
            Deliveries::Address,
            Deliveries::Region,
            Deliveries::Email,
        ])
        .values_panic([
            delivery.name.as_str().into(),
            delivery.phone.as_str().into(),
            delivery.zip.as_str().into(),
            delivery.city.as_str().into(),
            delivery.address.as_str().into(),
            delivery.region.as_str().into(),
            delivery.email.as_str().into(),
        ])
        .returning_col(Deliveries::Id)
        .to_owned()
}

/// Header to delivery link insert.
pub fn insert_link(order_uid: &str, delivery_id: i64) -> InsertStatement {
    Query::insert()
        .into_table(OrderDelivery::Table)
        .columns([OrderDelivery::OrderUid, OrderDelivery::DeliveryId])
        .values_panic([order_uid.into(), delivery_id.into()])
        .to_owned()
}

/// Multi-row item insert tagged with the owning identifier.
///
/// Returns `None` for an order without items.
pub fn insert_items(order_uid: &str, items: &[Item]) -> Option<InsertStatement> {
    if items.is_empty() {
        return None;
    }

    let mut stmt = Query::insert()
        .into_table(Items::Table)
        .columns([
            Items::OrderUid,
            Items::ChrtId,
            Items::TrackNumber,
            Items::Price,
            Items::Rid,
            Items::Name,
            Items::Sale,
            Items::Size,
            Items::TotalPrice,
            Items::NmId,
            Items::Brand,
            Items::Status,
        ])
        .to_owned();

    for item in items {
        stmt.values_panic([
            order_uid.into(),
            item.chrt_id.into(),
            item.track_number.as_str().into(),
            item.price.into(),
            item.rid.as_str().into(),
            item.name.as_str().into(),
            item.sale.into(),
            item.size.as_str().into(),
            item.total_price.into(),
            item.nm_id.into(),
            item.brand.as_str().into(),
            item.status.into(),
        ]);
    }

    Some(stmt)
}

pub fn select_header(order_uid: &str) -> SelectStatement {
    Query::select()
        .columns([
            OrderInfo::OrderUid,
            OrderInfo::TrackNumber,
            OrderInfo::Entry,
            OrderInfo::Locale,
            OrderInfo::InternalSignature,
            OrderInfo::CustomerId,
            OrderInfo::DeliveryService,
            OrderInfo::Shardkey,
            OrderInfo::SmId,
            OrderInfo::DateCreated,
            OrderInfo::OofShard,
        ])
        .from(OrderInfo::Table)
        .and_where(Expr::col(OrderInfo::OrderUid).eq(order_uid))
        .to_owned()
}

pub fn select_payment(order_uid: &str) -> SelectStatement {
    Query::select()
        .columns([
            Payments::Transaction,
            Payments::RequestId,
            Payments::Currency,
            Payments::Provider,
            Payments::Amount,
            Payments::PaymentDt,
            Payments::Bank,
            Payments::DeliveryCost,
            Payments::GoodsTotal,
            Payments::CustomFee,
        ])
        .from(Payments::Table)
        .and_where(Expr::col(Payments::Transaction).eq(order_uid))
        .to_owned()
}

/// Delivery reached through the link relation.
pub fn select_delivery(order_uid: &str) -> SelectStatement {
    Query::select()
        .columns([
            (Deliveries::Table, Deliveries::Name),
            (Deliveries::Table, Deliveries::Phone),
            (Deliveries::Table, Deliveries::Zip),
            (Deliveries::Table, Deliveries::City),
            (Deliveries::Table, Deliveries::Address),
            (Deliveries::Table, Deliveries::Region),
            (Deliveries::Table, Deliveries::Email),
        ])
        .from(OrderDelivery::Table)
        .inner_join(
            Deliveries::Table,
            Expr::col((Deliveries::Table, Deliveries::Id))
                .equals((OrderDelivery::Table, OrderDelivery::DeliveryId)),
        )
        .and_where(Expr::col((OrderDelivery::Table, OrderDelivery::OrderUid)).eq(order_uid))
        .to_owned()
}

/// Items owned by the order, in insertion order.
pub fn select_items(order_uid: &str) -> SelectStatement {
    Query::select()
        .columns([
            Items::ChrtId,
            Items::TrackNumber,
            Items::Price,
            Items::Rid,
            Items::Name,
            Items::Sale,
            Items::Size,
            Items::TotalPrice,
            Items::NmId,
            Items::Brand,
            Items::Status,
        ])
        .from(Items::Table)
        .and_where(Expr::col(Items::OrderUid).eq(order_uid))
        .order_by(Items::Id, SortOrder::Asc)
        .to_owned()
}

pub fn select_identifiers() -> SelectStatement {
    Query::select()
        .column(OrderInfo::OrderUid)
        .from(OrderInfo::Table)
        .order_by(OrderInfo::OrderUid, SortOrder::Asc)
        .to_owned()
}

pub fn insert_invalid(record: &InvalidRecord) -> InsertStatement {
    Query::insert()
        .into_table(InvalidData::Table)
        .columns([InvalidData::Data, InvalidData::Reason, InvalidData::ReceivedAt])
        .values_panic([
            record.payload.clone().into(),
            record.reason.as_str().into(),
            format_timestamp(&record.received_at).into(),
        ])
        .to_owned()
}

pub fn select_recent_invalid(limit: u32) -> SelectStatement {
    Query::select()
        .columns([
            InvalidData::Id,
            InvalidData::Data,
            InvalidData::Reason,
            InvalidData::ReceivedAt,
        ])
        .from(InvalidData::Table)
        .order_by(InvalidData::Id, SortOrder::Desc)
        .limit(u64::from(limit))
        .to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::make_order;
    use sea_query::SqliteQueryBuilder;

    #[test]
    fn test_header_insert_ignores_conflicts() {
        let sql = insert_header(&make_order("abc123")).to_string(SqliteQueryBuilder);
        assert!(sql.starts_with("INSERT INTO \"order_info\""));
        assert!(sql.contains("ON CONFLICT (\"order_uid\") DO NOTHING"));
    }

    #[test]
    fn test_delivery_insert_returns_id() {
        let sql = insert_delivery(&make_order("abc123").delivery).to_string(SqliteQueryBuilder);
        assert!(sql.ends_with("RETURNING \"id\""));
    }

    #[test]
    fn test_items_insert_one_row_per_item() {
        let order = make_order("abc123");
        let sql = insert_items("abc123", &order.items)
            .unwrap()
            .to_string(SqliteQueryBuilder);
        assert_eq!(sql.matches("'abc123'").count(), order.items.len());
    }

    #[test]
    fn test_no_items_no_statement() {
        assert!(insert_items("abc123", &[]).is_none());
    }

    #[test]
    fn test_items_selected_by_owner_not_track_number() {
        let sql = select_items("abc123").to_string(SqliteQueryBuilder);
        assert!(sql.contains("WHERE \"order_uid\" = 'abc123'"));
        assert!(sql.contains("ORDER BY \"id\" ASC"));
    }

    #[test]
    fn test_delivery_joined_through_link() {
        let sql = select_delivery("abc123").to_string(SqliteQueryBuilder);
        assert!(sql.contains("INNER JOIN \"deliveries\""));
        assert!(sql.contains("\"order_delivery\".\"order_uid\" = 'abc123'"));
    }
}
