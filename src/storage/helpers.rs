//! Shared storage helper functions.
//!
//! Timestamp encoding used by every SQL backend. Timestamps are stored as
//! RFC 3339 text in UTC with a `Z` suffix, the same form the order codec
//! emits, so a stored aggregate serializes back byte-for-byte.

use chrono::{DateTime, SecondsFormat, Utc};

use super::{Result, StorageError};

/// Encode a timestamp for storage.
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Decode a stored timestamp belonging to the record named by `key`.
pub fn parse_timestamp(key: &str, raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StorageError::Corrupt {
            key: key.to_string(),
            reason: format!("invalid timestamp '{}': {}", raw, e),
        })
}
