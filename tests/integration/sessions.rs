//! Session lifecycle: id assignment, reuse, exhaustion, delivery order.

use crate::*;

#[tokio::test]
async fn ids_assigned_in_connection_order() -> Result<()> {
    let server = start_server(16, 32, Duration::from_secs(30)).await?;

    let a0 = TestAgent::connect(server.addr).await?;
    let a1 = TestAgent::connect(server.addr).await?;
    let a2 = TestAgent::connect(server.addr).await?;

    assert_eq!(a0.id, 0);
    assert_eq!(a1.id, 1);
    assert_eq!(a2.id, 2);
    Ok(())
}

#[tokio::test]
async fn id_reused_after_disconnect() -> Result<()> {
    let server = start_server(16, 32, Duration::from_secs(30)).await?;

    let _a0 = TestAgent::connect(server.addr).await?;
    let _a1 = TestAgent::connect(server.addr).await?;
    let a2 = TestAgent::connect(server.addr).await?;
    assert_eq!(a2.id, 2);

    drop(a2);
    settle().await;

    let a2_again = TestAgent::connect(server.addr).await?;
    assert_eq!(a2_again.id, 2);
    Ok(())
}

#[tokio::test]
async fn exhausted_id_space_refuses_new_connections_only() -> Result<()> {
    let server = start_server(2, 32, Duration::from_secs(30)).await?;

    let mut a0 = TestAgent::connect(server.addr).await?;
    let _a1 = TestAgent::connect(server.addr).await?;

    // The third connection is dropped before any greeting.
    assert!(TestAgent::connect(server.addr).await.is_err());

    // Existing sessions keep working.
    a0.send(Message::GetRoute {
        dst: "00:00:00:00:00:09".to_string(),
    })
    .await?;
    a0.recv_matching(|m| matches!(m, Message::AskHost { .. }))
        .await?;
    Ok(())
}

#[tokio::test]
async fn outbound_delivery_is_fifo() -> Result<()> {
    let server = start_server(16, 32, Duration::from_secs(30)).await?;

    let mut a0 = TestAgent::connect(server.addr).await?;
    let mut a1 = TestAgent::connect(server.addr).await?;

    for i in 1..=3u64 {
        a0.send(Message::AddCrossDomainLink {
            src: ep(10 + i, 1),
            dst: ep(100 + i, 1),
        })
        .await?;
    }

    // Each report broadcasts one query; order must match the reports.
    for i in 1..=3u64 {
        let msg = a1.recv().await?;
        assert_eq!(msg, Message::AskDpid { dpid: 100 + i });
    }
    Ok(())
}

#[tokio::test]
async fn full_queue_blocks_without_dropping_or_reordering() -> Result<()> {
    // Queue capacity 1: the broadcaster must wait for the slow agent.
    let server = start_server(16, 1, Duration::from_secs(30)).await?;

    let mut slow = TestAgent::connect(server.addr).await?;
    let mut reporter = TestAgent::connect(server.addr).await?;

    for i in 1..=5u64 {
        reporter
            .send(Message::AddCrossDomainLink {
                src: ep(10 + i, 1),
                dst: ep(200 + i, 1),
            })
            .await?;
    }

    // With capacity 1 the controller cannot run ahead of the readers:
    // each query is only enqueued once the previous one was drained.
    // Everything arrives, in order, nothing dropped.
    for i in 1..=5u64 {
        assert_eq!(slow.recv().await?, Message::AskDpid { dpid: 200 + i });
        assert_eq!(reporter.recv().await?, Message::AskDpid { dpid: 200 + i });
    }
    Ok(())
}

#[tokio::test]
async fn undecodable_line_does_not_kill_the_session() -> Result<()> {
    let server = start_server(16, 32, Duration::from_secs(30)).await?;

    let mut a0 = TestAgent::connect(server.addr).await?;
    a0.send_raw("{\"cmd\":\"no_such_command\"}").await?;
    a0.send_raw("not json at all").await?;

    a0.send(Message::GetRoute {
        dst: "00:00:00:00:00:09".to_string(),
    })
    .await?;
    a0.recv_matching(|m| matches!(m, Message::AskHost { .. }))
        .await?;
    Ok(())
}
