//! InvalidSink trait definition.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::Result;

/// A payload that failed decoding, kept verbatim for audit and replay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidRecord {
    /// Raw inbound bytes, undecoded.
    pub payload: Vec<u8>,
    /// Why decoding failed.
    pub reason: String,
    pub received_at: DateTime<Utc>,
}

impl InvalidRecord {
    /// Create a record stamped with the current time.
    pub fn new(payload: impl Into<Vec<u8>>, reason: impl Into<String>) -> Self {
        Self {
            payload: payload.into(),
            reason: reason.into(),
            received_at: Utc::now(),
        }
    }
}

/// Append-only store for undecodable payloads.
///
/// Implementations:
/// - `SqliteInvalidSink`: SQLite storage
/// - `PostgresInvalidSink`: PostgreSQL storage
/// - `MockInvalidSink`: In-memory mock for testing
#[async_trait]
pub trait InvalidSink: Send + Sync {
    /// Durably store a record.
    ///
    /// Errors must reach the caller: a dropped record is silent data loss.
    async fn append(&self, record: &InvalidRecord) -> Result<()>;

    /// Most recent records, newest first.
    async fn recent(&self, limit: u32) -> Result<Vec<InvalidRecord>>;
}
