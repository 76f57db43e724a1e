//! Unified SQL InvalidSink implementation.

use std::marker::PhantomData;

use super::SqlDatabase;

/// SQL-based implementation of InvalidSink.
pub struct SqlInvalidSink<DB: SqlDatabase> {
    pool: DB::Pool,
    _marker: PhantomData<DB>,
}

impl<DB: SqlDatabase> SqlInvalidSink<DB> {
    /// Create a new SQL invalid sink with the given pool.
    pub fn new(pool: DB::Pool) -> Self {
        Self {
            pool,
            _marker: PhantomData,
        }
    }
}

/// Macro to implement InvalidSink for a specific SQL backend.
macro_rules! impl_invalid_sink {
    ($db_type:ty, $feature:literal) => {
        #[cfg(feature = $feature)]
        #[async_trait::async_trait]
        impl crate::storage::InvalidSink for SqlInvalidSink<$db_type> {
            #[tracing::instrument(name = "sink.append", skip_all, fields(bytes = record.payload.len()))]
            async fn append(
                &self,
                record: &crate::storage::InvalidRecord,
            ) -> crate::storage::Result<()> {
                use crate::storage::sql::statements;

                let (sql, values) = <$db_type>::build_insert(statements::insert_invalid(record));
                sqlx::query_with(&sql, values).execute(&self.pool).await?;

                Ok(())
            }

            async fn recent(
                &self,
                limit: u32,
            ) -> crate::storage::Result<Vec<crate::storage::InvalidRecord>> {
                use sqlx::Row;

                use crate::storage::helpers::parse_timestamp;
                use crate::storage::sql::statements;

                let (sql, values) = <$db_type>::build_select(statements::select_recent_invalid(limit));
                let rows = sqlx::query_with(&sql, values).fetch_all(&self.pool).await?;

                let mut records = Vec::with_capacity(rows.len());
                for row in rows {
                    let id: i64 = row.try_get("id")?;
                    let received_at: String = row.try_get("received_at")?;
                    records.push(crate::storage::InvalidRecord {
                        payload: row.try_get("data")?,
                        reason: row.try_get("reason")?,
                        received_at: parse_timestamp(&format!("invalid_data#{}", id), &received_at)?,
                    });
                }

                Ok(records)
            }
        }
    };
}

impl_invalid_sink!(super::postgres::Postgres, "postgres");
impl_invalid_sink!(super::sqlite::Sqlite, "sqlite");
