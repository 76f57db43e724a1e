//! InvalidSink interface tests.
//!
//! Run against a fresh sink: the first test expects no records.

use chrono::{Duration, TimeZone, Utc};
use orderstream::storage::{InvalidRecord, InvalidSink};

/// Test that a fresh sink has no records.
pub async fn test_recent_empty<S: InvalidSink>(sink: &S) {
    let records = sink.recent(10).await.expect("recent should succeed");
    assert!(records.is_empty());
}

/// Test that an appended record reads back unchanged.
pub async fn test_append_then_recent<S: InvalidSink>(sink: &S) {
    let record = InvalidRecord {
        payload: b"{not json".to_vec(),
        reason: "expected value at line 1 column 2".to_string(),
        received_at: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
    };

    sink.append(&record).await.expect("append should succeed");

    let records = sink.recent(1).await.unwrap();
    assert_eq!(records, vec![record]);
}

/// Test that non-UTF-8 payloads are kept byte for byte.
pub async fn test_binary_payload_preserved<S: InvalidSink>(sink: &S) {
    let payload = vec![0x00, 0xff, 0xfe, b'\'', b'\\', 0x80, 0x0a];
    sink.append(&InvalidRecord::new(payload.clone(), "invalid utf-8"))
        .await
        .unwrap();

    let records = sink.recent(1).await.unwrap();
    assert_eq!(records[0].payload, payload);
    assert_eq!(records[0].reason, "invalid utf-8");
}

/// Test newest-first ordering and the limit.
pub async fn test_recent_newest_first<S: InvalidSink>(sink: &S) {
    let base = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
    for i in 0..5 {
        let record = InvalidRecord {
            payload: format!("bad-{i}").into_bytes(),
            reason: "garbage".to_string(),
            received_at: base + Duration::seconds(i),
        };
        sink.append(&record).await.unwrap();
    }

    let records = sink.recent(3).await.unwrap();
    let payloads: Vec<_> = records.iter().map(|r| r.payload.clone()).collect();
    assert_eq!(
        payloads,
        vec![b"bad-4".to_vec(), b"bad-3".to_vec(), b"bad-2".to_vec()]
    );
}

/// Run all InvalidSink tests against a sink implementation.
#[macro_export]
macro_rules! run_invalid_sink_tests {
    ($sink:expr) => {
        use $crate::storage::invalid_sink_tests::*;

        test_recent_empty($sink).await;
        println!("  test_recent_empty: PASSED");

        test_append_then_recent($sink).await;
        println!("  test_append_then_recent: PASSED");

        test_binary_payload_preserved($sink).await;
        println!("  test_binary_payload_preserved: PASSED");

        test_recent_newest_first($sink).await;
        println!("  test_recent_newest_first: PASSED");
    };
}
