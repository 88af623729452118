//! Concurrent connections never observe each other's context.

use dbtel::semconv::attribute_keys::{DB_NAMESPACE, SERVER_ADDRESS};
use futures::future::join_all;

use crate::common::{Harness, params};

/// Two connections to different servers, interleaved on two worker threads.
#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_two_connections_on_separate_threads_stay_isolated() {
    let h = Harness::new();

    let tasks = [("A:3306", "db_a"), ("B:3306", "db_b")].map(|(address, database)| {
        let dialer = h.dialer.clone();
        tokio::spawn(async move {
            let mut conn =
                dialer.dial(&params(address, database)).await.expect("dial should succeed");
            for i in 0..50_i64 {
                conn.execute("SELECT * FROM t WHERE id = ?", &[i.into()])
                    .await
                    .expect("execute should succeed");
                tokio::task::yield_now().await;
            }
        })
    });
    for task in tasks {
        task.await.expect("task should not panic");
    }

    let spans = h.recorder.spans();
    assert_eq!(spans.len(), 102);

    for (address, database) in [("A:3306", "db_a"), ("B:3306", "db_b")] {
        let dial = spans
            .iter()
            .find(|s| s.name() == database)
            .expect("dial span should be recorded");
        let executes: Vec<_> =
            spans.iter().filter(|s| s.context().is_child_of(dial.context())).collect();

        assert_eq!(executes.len(), 50);
        for exec in executes {
            assert_eq!(exec.str_attribute(SERVER_ADDRESS), Some(address));
            assert_eq!(exec.str_attribute(DB_NAMESPACE), Some(database));
        }
    }
}

/// Many connections driven concurrently on one task.
#[tokio::test]
async fn test_many_connections_join_all() {
    let h = Harness::new();

    let calls = (0..16).map(|i| {
        let address = format!("host{i}:3306");
        let database = format!("db{i}");
        let h = &h;
        async move {
            let mut conn = h.dial(&address, &database).await.expect("dial should succeed");
            conn.execute("UPDATE t SET n = n + 1", &[]).await.expect("execute should succeed");
            conn.id()
        }
    });
    let ids = join_all(calls).await;
    assert_eq!(ids.len(), 16);

    for i in 0..16 {
        let address = format!("host{i}:3306");
        let spans = h.spans_where(SERVER_ADDRESS, &address);
        assert_eq!(spans.len(), 2, "{address} should have one dial and one execute");
        assert!(spans[1].context().is_child_of(spans[0].context()));
        assert_eq!(spans[1].str_attribute(DB_NAMESPACE), Some(format!("db{i}").as_str()));
    }

    // Every connection was dropped at the end of its future.
    assert!(h.instrumentation.hooks().connections().is_empty());
    assert_eq!(h.instrumentation.metrics().snapshot().operations["UPDATE"].total, 16);
}
