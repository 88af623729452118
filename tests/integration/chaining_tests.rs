//! Dial-to-execute chaining through the connection registry.

use dbtel::{
    semconv::attribute_keys::{DB_NAMESPACE, SERVER_ADDRESS},
    telemetry::TraceContext,
};

use crate::common::{Harness, params};

#[tokio::test]
async fn test_executes_are_children_of_their_dial() {
    let h = Harness::new();
    let mut conn = h.dial("db.internal:3306", "shop").await.expect("dial should succeed");

    conn.execute("BEGIN", &[]).await.expect("execute should succeed");
    conn.execute("INSERT INTO orders VALUES (?, ?)", &[1.into(), "book".into()])
        .await
        .expect("execute should succeed");
    conn.execute("COMMIT", &[]).await.expect("execute should succeed");

    let spans = h.recorder.spans();
    let dial = &spans[0];
    for exec in &spans[1..] {
        assert!(exec.context().is_child_of(dial.context()), "{} is not a child", exec.name());
        assert_eq!(exec.str_attribute(SERVER_ADDRESS), Some("db.internal:3306"));
    }
    assert_eq!(
        spans.iter().map(|s| s.name()).collect::<Vec<_>>(),
        vec!["shop", "BEGIN shop", "INSERT shop", "COMMIT shop"]
    );
}

#[tokio::test]
async fn test_dial_inherits_caller_context() {
    let h = Harness::new();
    let request_ctx =
        TraceContext::from_traceparent("00-4bf92f3577b34da6a3ce929d0e0e4736-00f067aa0ba902b7-01")
            .expect("valid traceparent");

    let mut conn = h
        .dialer
        .dial_with_parent(Some(&request_ctx), &params("db:3306", "shop"))
        .await
        .expect("dial should succeed");
    conn.execute("SELECT 1", &[]).await.expect("execute should succeed");

    let spans = h.recorder.spans();
    assert!(spans[0].context().is_child_of(&request_ctx));
    assert_eq!(spans[1].context().trace_id(), request_ctx.trace_id());
    assert!(spans[1].context().is_child_of(spans[0].context()));
}

#[tokio::test]
async fn test_use_changes_namespace_of_later_executes() {
    let h = Harness::new();
    let mut conn = h.dial("db:3306", "shop").await.expect("dial should succeed");

    conn.execute("USE billing", &[]).await.expect("execute should succeed");
    conn.execute("SELECT * FROM invoices", &[]).await.expect("execute should succeed");

    let spans = h.recorder.spans();
    assert_eq!(spans[1].str_attribute(DB_NAMESPACE), Some("shop"));
    assert_eq!(spans[2].str_attribute(DB_NAMESPACE), Some("billing"));
    assert_eq!(spans[2].name(), "SELECT billing");
}

#[tokio::test]
async fn test_closing_connection_forgets_context() {
    let h = Harness::new();
    let conn = h.dial("db:3306", "shop").await.expect("dial should succeed");
    let id = conn.id();
    let connections = h.instrumentation.hooks().connections();

    assert!(connections.get(id).is_some());
    conn.close();
    assert!(connections.get(id).is_none());
    assert!(connections.is_empty());
}

#[tokio::test]
async fn test_each_dial_starts_its_own_trace() {
    let h = Harness::new();
    let mut first = h.dial("db:3306", "shop").await.expect("dial should succeed");
    let mut second = h.dial("db:3306", "shop").await.expect("dial should succeed");

    first.execute("SELECT 1", &[]).await.expect("execute should succeed");
    second.execute("SELECT 2", &[]).await.expect("execute should succeed");

    let spans = h.recorder.spans();
    let (dial_a, dial_b) = (&spans[0], &spans[1]);
    assert_ne!(dial_a.context().trace_id(), dial_b.context().trace_id());
    assert!(spans[2].context().is_child_of(dial_a.context()));
    assert!(spans[3].context().is_child_of(dial_b.context()));
}
