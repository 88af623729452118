//! End-to-end behavior of the instrumented client.

use dbtel::{
    ExecResult,
    config::InstrumentationConfig,
    semconv::attribute_keys::{
        DB_AFFECTED_ROWS, DB_NAMESPACE, DB_OPERATION, DB_STATEMENT, DB_SYSTEM, SERVER_ADDRESS,
        SERVER_PORT,
    },
    testing::MemoryDatabase,
};

use crate::common::Harness;

/// Disabled: no spans, no metrics. Enabled: one dial and one execute span.
#[tokio::test]
async fn test_enable_toggle_end_to_end() {
    let h = Harness::new();

    h.enabler.set_enabled(false);
    let mut conn = h.dial("A:3306", "db_a").await.expect("dial should succeed");
    conn.execute("SELECT * FROM t WHERE id = ?", &[7.into()])
        .await
        .expect("execute should succeed");
    drop(conn);

    assert!(h.recorder.is_empty(), "disabled instrumentation must not export spans");
    assert!(h.instrumentation.metrics().snapshot().operations.is_empty());
    assert_eq!(h.db.execute_count(), 1, "the call itself still runs");

    h.enabler.set_enabled(true);
    let mut conn = h.dial("A:3306", "db_a").await.expect("dial should succeed");
    conn.execute("SELECT * FROM t WHERE id = ?", &[7.into()])
        .await
        .expect("execute should succeed");

    let spans = h.recorder.spans();
    assert_eq!(spans.len(), 2);

    let dial = &spans[0];
    assert_eq!(dial.name(), "db_a");
    assert_eq!(dial.str_attribute(SERVER_ADDRESS), Some("A:3306"));
    assert_eq!(dial.attribute(SERVER_PORT).and_then(|v| v.as_int()), Some(3306));
    assert_eq!(dial.str_attribute(DB_SYSTEM), Some("mysql"));

    let exec = &spans[1];
    assert_eq!(exec.name(), "SELECT db_a");
    assert_eq!(exec.str_attribute(DB_STATEMENT), Some("SELECT * FROM t WHERE id = 7"));
    assert_eq!(exec.str_attribute(DB_OPERATION), Some("SELECT"));
    assert_eq!(exec.str_attribute(DB_NAMESPACE), Some("db_a"));
    assert!(exec.context().is_child_of(dial.context()));

    let snapshot = h.instrumentation.metrics().snapshot();
    assert_eq!(snapshot.operations["dial"].total, 1);
    assert_eq!(snapshot.operations["SELECT"].success, 1);
    assert_eq!(snapshot.operations["SELECT"].in_flight, 0);
}

#[tokio::test]
async fn test_statement_recording_disabled() {
    let h = Harness::with_config(InstrumentationConfig::default().with_record_statement(false));
    let mut conn = h.dial("db:3306", "shop").await.expect("dial should succeed");
    conn.execute("UPDATE users SET password = ? WHERE id = ?", &["hunter2".into(), 1.into()])
        .await
        .expect("execute should succeed");

    let spans = h.recorder.spans();
    assert!(spans.iter().all(|s| s.attribute(DB_STATEMENT).is_none()));
    assert_eq!(spans[1].str_attribute(DB_OPERATION), Some("UPDATE"));
}

#[tokio::test]
async fn test_inner_error_passes_through_unchanged() {
    let h = Harness::new();
    let mut conn = h.dial("db:3306", "shop").await.expect("dial should succeed");

    h.db.fail_next_execute(dbtel::Error::query("Table 'shop.nope' doesn't exist"));
    let err = conn.execute("SELECT * FROM nope", &[]).await.expect_err("execute should fail");
    assert_eq!(err.kind(), dbtel::ErrorKind::Query);
    assert_eq!(err.message(), "Table 'shop.nope' doesn't exist");

    let exec = &h.recorder.spans()[1];
    assert!(exec.is_error());
    assert_eq!(exec.str_attribute("error.type"), Some("query"));
    assert_eq!(h.instrumentation.metrics().snapshot().operations["SELECT"].failure, 1);
}

#[tokio::test]
async fn test_failed_dial_is_recorded() {
    let h = Harness::new();
    h.db.fail_next_dial(dbtel::Error::connection("connection refused"));

    let err = h.dial("db:3306", "shop").await.expect_err("dial should fail");
    assert!(err.to_string().contains("connection refused"));

    let spans = h.recorder.spans();
    assert_eq!(spans.len(), 1);
    assert!(spans[0].is_error());
    assert_eq!(spans[0].str_attribute("error.type"), Some("connection"));
    assert!(h.instrumentation.hooks().connections().is_empty());
}

#[tokio::test]
async fn test_affected_rows_and_unknown_operation() {
    let db = MemoryDatabase::new().with_result("DELETE", ExecResult::affected(3));
    let h = Harness::with_database(InstrumentationConfig::default(), db);

    let mut conn = h.dial("db:3306", "shop").await.expect("dial should succeed");
    conn.execute("DELETE FROM carts WHERE stale", &[]).await.expect("execute should succeed");
    conn.execute("   ", &[]).await.expect("execute should succeed");

    let spans = h.recorder.spans();
    assert_eq!(spans[1].attribute(DB_AFFECTED_ROWS).and_then(|v| v.as_int()), Some(3));
    assert_eq!(spans[2].name(), "shop");
    assert_eq!(spans[2].str_attribute(DB_OPERATION), Some(""));

    let snapshot = h.instrumentation.metrics().snapshot();
    assert_eq!(snapshot.operations["unknown"].total, 1);
    assert_eq!(snapshot.total(), 3);
}
