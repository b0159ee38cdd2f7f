//! Inter-domain route resolution end to end.

use crate::*;

const HOST: &str = "00:00:00:00:00:02";

#[tokio::test]
async fn chain_of_three_domains_resolves_first_hop_egress() -> Result<()> {
    let server = start_server(16, 32, Duration::from_secs(30)).await?;

    let mut a0 = TestAgent::connect(server.addr).await?;
    let mut a1 = TestAgent::connect(server.addr).await?;
    let mut a2 = TestAgent::connect(server.addr).await?;

    // a0—a1 and a1—a2 cables, both sides resolved.
    resolve_link(&mut a0, &mut a1, ep(10, 1), ep(20, 1)).await?;
    resolve_link(&mut a1, &mut a2, ep(21, 2), ep(30, 1)).await?;
    settle().await;

    a0.send(Message::GetRoute {
        dst: HOST.to_string(),
    })
    .await?;
    a2.recv_matching(|m| matches!(m, Message::AskHost { .. }))
        .await?;
    a2.send(Message::ResponseHost {
        host: HOST.to_string(),
    })
    .await?;

    // The reply carries a0's own side of the a0→a1 hop.
    let result = a0
        .recv_matching(|m| matches!(m, Message::RouteResult { .. }))
        .await?;
    assert_eq!(
        result,
        Message::RouteResult {
            dpid: 10,
            port: 1,
            host: HOST.to_string(),
        }
    );
    Ok(())
}

#[tokio::test]
async fn no_path_means_no_result_then_an_expiry_notice() -> Result<()> {
    // Short deadline so the expiry sweep is observable.
    let server = start_server(16, 32, Duration::from_secs(1)).await?;

    let mut a0 = TestAgent::connect(server.addr).await?;
    let mut a1 = TestAgent::connect(server.addr).await?;
    let mut a2 = TestAgent::connect(server.addr).await?;

    // Only the a0—a1 cable exists; a2 is topologically unreachable.
    a0.send(Message::AddCrossDomainLink {
        src: ep(4, 3),
        dst: ep(1, 1),
    })
    .await?;
    a1.recv_matching(|m| matches!(m, Message::AskDpid { dpid: 1 }))
        .await?;
    a1.send(Message::ResponseDpid { dpid: 1 }).await?;
    settle().await;

    let links = server.coordinator.links().await;
    assert_eq!(links[0].dst.owner, Some(1));

    a0.send(Message::GetRoute {
        dst: HOST.to_string(),
    })
    .await?;
    a2.recv_matching(|m| matches!(m, Message::AskHost { .. }))
        .await?;
    a2.send(Message::ResponseHost {
        host: HOST.to_string(),
    })
    .await?;

    // The ask_host broadcast reaches a0 too; beyond that, nothing until
    // the deadline passes.
    a0.recv_matching(|m| matches!(m, Message::AskHost { .. }))
        .await?;
    a0.expect_silence(Duration::from_millis(400)).await?;

    let notice = a0
        .recv_matching(|m| matches!(m, Message::RouteError { .. }))
        .await?;
    match notice {
        Message::RouteError { host, .. } => assert_eq!(host, HOST),
        _ => unreachable!(),
    }
    Ok(())
}

#[tokio::test]
async fn one_claim_answers_every_concurrent_requester() -> Result<()> {
    let server = start_server(16, 32, Duration::from_secs(30)).await?;

    let mut a0 = TestAgent::connect(server.addr).await?;
    let mut a1 = TestAgent::connect(server.addr).await?;
    let mut a2 = TestAgent::connect(server.addr).await?;

    // Star topology: both requesters are one hop from the host's domain.
    resolve_link(&mut a0, &mut a2, ep(100, 1), ep(200, 1)).await?;
    resolve_link(&mut a1, &mut a2, ep(101, 1), ep(201, 1)).await?;
    settle().await;

    a0.send(Message::GetRoute {
        dst: HOST.to_string(),
    })
    .await?;
    a1.send(Message::GetRoute {
        dst: HOST.to_string(),
    })
    .await?;
    // Both queries must have landed before the single claim answers them.
    a2.recv_matching(|m| matches!(m, Message::AskHost { .. }))
        .await?;
    a2.recv_matching(|m| matches!(m, Message::AskHost { .. }))
        .await?;
    a2.send(Message::ResponseHost {
        host: HOST.to_string(),
    })
    .await?;

    let r0 = a0
        .recv_matching(|m| matches!(m, Message::RouteResult { .. }))
        .await?;
    assert_eq!(
        r0,
        Message::RouteResult {
            dpid: 100,
            port: 1,
            host: HOST.to_string(),
        }
    );
    let r1 = a1
        .recv_matching(|m| matches!(m, Message::RouteResult { .. }))
        .await?;
    assert_eq!(
        r1,
        Message::RouteResult {
            dpid: 101,
            port: 1,
            host: HOST.to_string(),
        }
    );
    Ok(())
}

#[tokio::test]
async fn claim_from_the_requesting_domain_resolves_nothing() -> Result<()> {
    let server = start_server(16, 32, Duration::from_secs(1)).await?;

    let mut a0 = TestAgent::connect(server.addr).await?;
    let mut a1 = TestAgent::connect(server.addr).await?;
    resolve_link(&mut a0, &mut a1, ep(10, 1), ep(20, 1)).await?;
    settle().await;

    // The "remote" host turns out to live in the requester's own domain:
    // there is no inter-domain hop to hand back.
    a0.send(Message::GetRoute {
        dst: HOST.to_string(),
    })
    .await?;
    a0.recv_matching(|m| matches!(m, Message::AskHost { .. }))
        .await?;
    a0.send(Message::ResponseHost {
        host: HOST.to_string(),
    })
    .await?;

    let notice = a0
        .recv_matching(|m| matches!(m, Message::RouteError { .. }))
        .await?;
    match notice {
        Message::RouteError { host, .. } => assert_eq!(host, HOST),
        _ => unreachable!(),
    }
    Ok(())
}
