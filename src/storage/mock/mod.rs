//! Mock storage implementations for testing.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{InvalidRecord, InvalidSink, OrderStore, Result, StorageError, WriteOutcome};
use crate::order::Order;

/// Mock order store that keeps aggregates in memory.
///
/// Failure injection:
/// - `set_fail_on_write`: every write fails with a transient error
/// - `fail_next_writes`: the next `n` writes fail with a transient error
/// - `set_reject_writes`: every write fails with a permanent error
/// - `fail_reads_for`: reads of one identifier fail
/// - `set_write_delay`: writes sleep before committing
#[derive(Default)]
pub struct MockOrderStore {
    orders: RwLock<HashMap<String, Order>>,
    fail_on_write: RwLock<bool>,
    failing_writes: RwLock<u32>,
    reject_writes: RwLock<bool>,
    failing_reads: RwLock<HashSet<String>>,
    fail_on_list: RwLock<bool>,
    write_delay: RwLock<Option<Duration>>,
    write_attempts: AtomicUsize,
}

impl MockOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_on_write(&self, fail: bool) {
        *self.fail_on_write.write().await = fail;
    }

    pub async fn fail_next_writes(&self, count: u32) {
        *self.failing_writes.write().await = count;
    }

    pub async fn set_reject_writes(&self, reject: bool) {
        *self.reject_writes.write().await = reject;
    }

    pub async fn fail_reads_for(&self, order_uid: &str) {
        self.failing_reads
            .write()
            .await
            .insert(order_uid.to_string());
    }

    pub async fn set_fail_on_list(&self, fail: bool) {
        *self.fail_on_list.write().await = fail;
    }

    pub async fn set_write_delay(&self, delay: Duration) {
        *self.write_delay.write().await = Some(delay);
    }

    /// Number of `write` calls, including failed ones.
    pub fn write_attempts(&self) -> usize {
        self.write_attempts.load(Ordering::SeqCst)
    }

    pub async fn stored_count(&self) -> usize {
        self.orders.read().await.len()
    }

    pub async fn get_stored(&self, order_uid: &str) -> Option<Order> {
        self.orders.read().await.get(order_uid).cloned()
    }
}

#[async_trait]
impl OrderStore for MockOrderStore {
    async fn write(&self, order: &Order) -> Result<WriteOutcome> {
        self.write_attempts.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = *self.write_delay.read().await {
            tokio::time::sleep(delay).await;
        }

        if *self.reject_writes.read().await {
            return Err(StorageError::Corrupt {
                key: order.order_uid.clone(),
                reason: "write rejected".to_string(),
            });
        }

        if *self.fail_on_write.read().await {
            return Err(StorageError::Unavailable("injected write failure".to_string()));
        }

        {
            let mut remaining = self.failing_writes.write().await;
            if *remaining > 0 {
                *remaining -= 1;
                return Err(StorageError::Unavailable("injected write failure".to_string()));
            }
        }

        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.order_uid) {
            return Ok(WriteOutcome::Duplicate);
        }
        orders.insert(order.order_uid.clone(), order.clone());

        Ok(WriteOutcome::Created)
    }

    async fn read(&self, order_uid: &str) -> Result<Order> {
        if self.failing_reads.read().await.contains(order_uid) {
            return Err(StorageError::Unavailable("injected read failure".to_string()));
        }

        self.orders
            .read()
            .await
            .get(order_uid)
            .cloned()
            .ok_or_else(|| StorageError::NotFound {
                order_uid: order_uid.to_string(),
            })
    }

    async fn list_identifiers(&self) -> Result<Vec<String>> {
        if *self.fail_on_list.read().await {
            return Err(StorageError::Unavailable("injected list failure".to_string()));
        }

        let mut identifiers: Vec<_> = self.orders.read().await.keys().cloned().collect();
        identifiers.sort();
        Ok(identifiers)
    }
}

/// Mock invalid sink that keeps records in memory.
#[derive(Default)]
pub struct MockInvalidSink {
    records: RwLock<Vec<InvalidRecord>>,
    fail_on_append: RwLock<bool>,
}

impl MockInvalidSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_fail_on_append(&self, fail: bool) {
        *self.fail_on_append.write().await = fail;
    }

    /// Every appended record, oldest first.
    pub async fn records(&self) -> Vec<InvalidRecord> {
        self.records.read().await.clone()
    }
}

#[async_trait]
impl InvalidSink for MockInvalidSink {
    async fn append(&self, record: &InvalidRecord) -> Result<()> {
        if *self.fail_on_append.read().await {
            return Err(StorageError::Unavailable("injected append failure".to_string()));
        }
        self.records.write().await.push(record.clone());
        Ok(())
    }

    async fn recent(&self, limit: u32) -> Result<Vec<InvalidRecord>> {
        let records = self.records.read().await;
        Ok(records.iter().rev().take(limit as usize).cloned().collect())
    }
}
