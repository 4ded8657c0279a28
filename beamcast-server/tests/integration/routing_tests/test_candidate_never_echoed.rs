use beamcast_core::ServerMessage;

use crate::integration::init_tracing;
use crate::utils::{TestRelay, candidate, offer};

#[tokio::test]
async fn test_candidate_never_echoed() {
    init_tracing();

    let relay = TestRelay::start();
    let host = relay.host("r1", "host").await;
    let viewer = relay.watch("r1", "v").await;

    relay.send(viewer, candidate("r1", "v", "host")).await;
    relay.snapshot("r1").await;

    assert!(
        relay.signaling.received(viewer).await.is_empty(),
        "sender must not get its own candidate back"
    );

    let host_inbox = relay.signaling.received(host).await;
    let relayed: Vec<_> = host_inbox
        .iter()
        .filter(|msg| matches!(msg, ServerMessage::Candidate { .. }))
        .collect();
    assert_eq!(relayed.len(), 1);
    assert_eq!(
        Some(relayed[0].clone()),
        candidate("r1", "v", "host").into_relayed()
    );
}

#[tokio::test]
async fn test_offer_stays_inside_its_channel() {
    init_tracing();

    let relay = TestRelay::start();
    let host = relay.host("r1", "host").await;
    let viewer = relay.watch("r1", "v").await;

    let other_host = relay.host("r9", "other").await;
    let other_viewer = relay.watch("r9", "w").await;

    relay.send(host, offer("r1", "host", "v")).await;
    relay.snapshot("r1").await;

    let viewer_inbox = relay.signaling.received(viewer).await;
    assert!(matches!(
        viewer_inbox.as_slice(),
        [ServerMessage::Offer { .. }]
    ));
    assert!(
        relay
            .signaling
            .received(other_viewer)
            .await
            .is_empty()
    );
    assert_eq!(
        relay.signaling.viewer_joined(other_host).await,
        vec!["w"],
        "other channel only saw its own viewer"
    );
}

#[tokio::test]
async fn test_offer_reaches_unannounced_subscribers() {
    init_tracing();

    let relay = TestRelay::start();
    let host = relay.host("r1", "host").await;

    // Subscribed through join-channel, never announced.
    let lurker = beamcast_core::SessionId::new();
    relay
        .send(lurker, crate::utils::join("r1", false, "lurker"))
        .await;

    relay.send(host, offer("r1", "host", "lurker")).await;
    relay.snapshot("r1").await;

    assert_eq!(relay.signaling.received(lurker).await.len(), 1);
}
