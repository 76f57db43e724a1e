//! Unified SQL OrderStore implementation.
//!
//! Uses a macro to generate implementations for each SQL backend,
//! eliminating code duplication while maintaining type safety.

use std::marker::PhantomData;

use super::SqlDatabase;

/// SQL-based implementation of OrderStore.
///
/// This generic implementation works with any SQL database that implements
/// the `SqlDatabase` trait (PostgreSQL, SQLite).
pub struct SqlOrderStore<DB: SqlDatabase> {
    pool: DB::Pool,
    _marker: PhantomData<DB>,
}

impl<DB: SqlDatabase> SqlOrderStore<DB> {
    /// Create a new SQL order store with the given pool.
    pub fn new(pool: DB::Pool) -> Self {
        Self {
            pool,
            _marker: PhantomData,
        }
    }

    /// Get the underlying pool.
    pub fn pool(&self) -> &DB::Pool {
        &self.pool
    }
}

/// Macro to implement OrderStore for a specific SQL backend.
///
/// `$row_type` is the backend's row type, used by the row mappers.
macro_rules! impl_order_store {
    ($db_type:ty, $row_type:ty, $feature:literal) => {
        #[cfg(feature = $feature)]
        impl SqlOrderStore<$db_type> {
            /// Create every relation if missing. Idempotent.
            pub async fn init(&self) -> crate::storage::Result<()> {
                for ddl in <$db_type as SqlDatabase>::SCHEMA {
                    sqlx::query(ddl).execute(&self.pool).await?;
                }
                Ok(())
            }

            fn header_from_row(row: &$row_type) -> crate::storage::Result<crate::order::Order> {
                use sqlx::Row;

                let order_uid: String = row.try_get("order_uid")?;
                let date_created: String = row.try_get("date_created")?;
                let date_created =
                    crate::storage::helpers::parse_timestamp(&order_uid, &date_created)?;

                Ok(crate::order::Order {
                    track_number: row.try_get("track_number")?,
                    entry: row.try_get("entry")?,
                    delivery: crate::order::Delivery::default(),
                    payment: crate::order::Payment::default(),
                    items: Vec::new(),
                    locale: row.try_get("locale")?,
                    internal_signature: row.try_get("internal_signature")?,
                    customer_id: row.try_get("customer_id")?,
                    delivery_service: row.try_get("delivery_service")?,
                    shardkey: row.try_get("shardkey")?,
                    sm_id: row.try_get("sm_id")?,
                    date_created,
                    oof_shard: row.try_get("oof_shard")?,
                    order_uid,
                })
            }

            fn payment_from_row(row: &$row_type) -> crate::storage::Result<crate::order::Payment> {
                use sqlx::Row;

                Ok(crate::order::Payment {
                    transaction: row.try_get("transaction")?,
                    request_id: row.try_get("request_id")?,
                    currency: row.try_get("currency")?,
                    provider: row.try_get("provider")?,
                    amount: row.try_get("amount")?,
                    payment_dt: row.try_get("payment_dt")?,
                    bank: row.try_get("bank")?,
                    delivery_cost: row.try_get("delivery_cost")?,
                    goods_total: row.try_get("goods_total")?,
                    custom_fee: row.try_get("custom_fee")?,
                })
            }

            fn delivery_from_row(row: &$row_type) -> crate::storage::Result<crate::order::Delivery> {
                use sqlx::Row;

                Ok(crate::order::Delivery {
                    name: row.try_get("name")?,
                    phone: row.try_get("phone")?,
                    zip: row.try_get("zip")?,
                    city: row.try_get("city")?,
                    address: row.try_get("address")?,
                    region: row.try_get("region")?,
                    email: row.try_get("email")?,
                })
            }

            fn item_from_row(row: &$row_type) -> crate::storage::Result<crate::order::Item> {
                use sqlx::Row;

                Ok(crate::order::Item {
                    chrt_id: row.try_get("chrt_id")?,
                    track_number: row.try_get("track_number")?,
                    price: row.try_get("price")?,
                    rid: row.try_get("rid")?,
                    name: row.try_get("name")?,
                    sale: row.try_get("sale")?,
                    size: row.try_get("size")?,
                    total_price: row.try_get("total_price")?,
                    nm_id: row.try_get("nm_id")?,
                    brand: row.try_get("brand")?,
                    status: row.try_get("status")?,
                })
            }
        }

        #[cfg(feature = $feature)]
        #[async_trait::async_trait]
        impl crate::storage::OrderStore for SqlOrderStore<$db_type> {
            #[tracing::instrument(name = "store.write", skip_all, fields(order_uid = %order.order_uid))]
            async fn write(
                &self,
                order: &crate::order::Order,
            ) -> crate::storage::Result<crate::storage::WriteOutcome> {
                use sqlx::Row;

                use crate::storage::sql::statements;
                use crate::storage::WriteOutcome;

                // Dropping the transaction on any early return rolls it back.
                let mut tx = self.pool.begin().await?;

                // The header goes first so the write lock is taken up front.
                let (sql, values) = <$db_type>::build_insert(statements::insert_header(order));
                let inserted = sqlx::query_with(&sql, values)
                    .execute(&mut *tx)
                    .await?
                    .rows_affected();
                if inserted == 0 {
                    tx.rollback().await?;
                    tracing::debug!("Order already stored, skipping write");
                    return Ok(WriteOutcome::Duplicate);
                }

                let (sql, values) = <$db_type>::build_insert(statements::insert_payment(order));
                sqlx::query_with(&sql, values).execute(&mut *tx).await?;

                let (sql, values) =
                    <$db_type>::build_insert(statements::insert_delivery(&order.delivery));
                let delivery_id: i64 = sqlx::query_with(&sql, values)
                    .fetch_one(&mut *tx)
                    .await?
                    .try_get("id")?;

                let (sql, values) =
                    <$db_type>::build_insert(statements::insert_link(&order.order_uid, delivery_id));
                sqlx::query_with(&sql, values).execute(&mut *tx).await?;

                // Rendered up front: sea-query statements are not Send.
                let items = statements::insert_items(&order.order_uid, &order.items)
                    .map(<$db_type>::build_insert);
                if let Some((sql, values)) = items {
                    sqlx::query_with(&sql, values).execute(&mut *tx).await?;
                }

                tx.commit().await?;

                tracing::debug!(items = order.items.len(), "Order committed");
                Ok(WriteOutcome::Created)
            }

            #[tracing::instrument(name = "store.read", skip(self))]
            async fn read(&self, order_uid: &str) -> crate::storage::Result<crate::order::Order> {
                use crate::storage::sql::statements;
                use crate::storage::StorageError;

                let (sql, values) = <$db_type>::build_select(statements::select_header(order_uid));
                let header = sqlx::query_with(&sql, values)
                    .fetch_optional(&self.pool)
                    .await?
                    .ok_or_else(|| StorageError::NotFound {
                        order_uid: order_uid.to_string(),
                    })?;
                let mut order = Self::header_from_row(&header)?;

                let (sql, values) = <$db_type>::build_select(statements::select_payment(order_uid));
                match sqlx::query_with(&sql, values).fetch_optional(&self.pool).await? {
                    Some(row) => order.payment = Self::payment_from_row(&row)?,
                    None => tracing::warn!("Order has no payment row"),
                }

                let (sql, values) = <$db_type>::build_select(statements::select_delivery(order_uid));
                match sqlx::query_with(&sql, values).fetch_optional(&self.pool).await? {
                    Some(row) => order.delivery = Self::delivery_from_row(&row)?,
                    None => tracing::warn!("Order has no linked delivery"),
                }

                let (sql, values) = <$db_type>::build_select(statements::select_items(order_uid));
                let rows = sqlx::query_with(&sql, values).fetch_all(&self.pool).await?;
                order.items = rows
                    .iter()
                    .map(Self::item_from_row)
                    .collect::<crate::storage::Result<Vec<_>>>()?;

                Ok(order)
            }

            async fn list_identifiers(&self) -> crate::storage::Result<Vec<String>> {
                use sqlx::Row;

                use crate::storage::sql::statements;

                let (sql, values) = <$db_type>::build_select(statements::select_identifiers());
                let rows = sqlx::query_with(&sql, values).fetch_all(&self.pool).await?;

                let mut identifiers = Vec::with_capacity(rows.len());
                for row in rows {
                    identifiers.push(row.try_get("order_uid")?);
                }

                Ok(identifiers)
            }
        }
    };
}

// Generate implementations for each SQL backend
impl_order_store!(super::postgres::Postgres, sqlx::postgres::PgRow, "postgres");
impl_order_store!(super::sqlite::Sqlite, sqlx::sqlite::SqliteRow, "sqlite");
