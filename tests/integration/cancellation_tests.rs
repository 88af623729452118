//! Calls abandoned mid-flight still end their spans.

use std::time::Duration;

use dbtel::telemetry::SpanStatus;

use crate::common::Harness;

#[tokio::test(start_paused = true)]
async fn test_timed_out_execute_records_cancelled_span() {
    let h = Harness::new();
    let mut conn = h.dial("db:3306", "shop").await.expect("dial should succeed");

    h.db.set_execute_delay(Some(Duration::from_secs(30)));
    let outcome =
        tokio::time::timeout(Duration::from_secs(1), conn.execute("SELECT SLEEP(30)", &[])).await;
    assert!(outcome.is_err(), "execute should time out");

    let spans = h.recorder.spans();
    assert_eq!(spans.len(), 2);
    let exec = &spans[1];
    assert_eq!(exec.name(), "SELECT shop");
    assert!(exec.is_error());
    assert_eq!(exec.str_attribute("error.type"), Some("cancelled"));
    assert!(matches!(exec.status(), SpanStatus::Error(msg) if msg.contains("dropped")));

    let snapshot = h.instrumentation.metrics().snapshot();
    assert_eq!(snapshot.operations["SELECT"].failure, 1);
    assert_eq!(snapshot.operations["SELECT"].in_flight, 0);
}

#[tokio::test(start_paused = true)]
async fn test_connection_usable_after_cancelled_execute() {
    let h = Harness::new();
    let mut conn = h.dial("db:3306", "shop").await.expect("dial should succeed");

    h.db.set_execute_delay(Some(Duration::from_secs(30)));
    let _ = tokio::time::timeout(Duration::from_millis(10), conn.execute("SELECT 1", &[])).await;

    h.db.set_execute_delay(None);
    conn.execute("SELECT 2", &[]).await.expect("execute should succeed");

    let spans = h.recorder.spans();
    assert_eq!(spans.len(), 3);
    assert!(spans[1].is_error());
    assert!(spans[2].is_ok());
    assert!(spans[2].context().is_child_of(spans[0].context()));
}

#[tokio::test]
async fn test_dropped_future_before_poll_ends_nothing() {
    let h = Harness::new();
    let mut conn = h.dial("db:3306", "shop").await.expect("dial should succeed");

    // The entry hook runs on first poll, so an unpolled future leaves no trace.
    drop(conn.execute("SELECT 1", &[]));

    assert_eq!(h.recorder.len(), 1);
    assert_eq!(h.db.execute_count(), 0);
}
