use beamcast_client::{ClientCommand, ClientEvent, EndpointEvent, EndpointState, StreamSource};
use serde_json::json;

use crate::integration::init_tracing;
use crate::utils::{Participant, start_server, wait_for_host};

#[tokio::test]
async fn test_offer_answer_and_candidates_cross_the_relay() {
    init_tracing();

    let (addr, service) = start_server().await;
    let mut host = Participant::connect(addr, "host").await.expect("host");
    let mut viewer = Participant::connect(addr, "viewer").await.expect("viewer");

    host.command(ClientCommand::StartHosting {
        channel_id: "r1".into(),
        source: StreamSource::Display,
    })
    .await;
    wait_for_host(&service, "r1").await;

    viewer
        .command(ClientCommand::Watch {
            channel_id: "r1".into(),
            source: None,
        })
        .await;

    let joined = host
        .expect_event(|e| matches!(e, ClientEvent::ViewerJoined { .. }))
        .await;
    assert!(matches!(joined, ClientEvent::ViewerJoined { user_id, .. } if user_id.as_str() == "viewer"));

    host.expect_call("offer viewer#1").await;
    viewer.expect_call("describe host#1").await;
    viewer.expect_call("answer host#1").await;
    host.expect_call("describe viewer#1").await;

    // The viewer's peer connection trickles a candidate to the host.
    let (generation, tx) = viewer.factory.sender_for("host").expect("viewer endpoint");
    tx.send(EndpointEvent::LocalCandidate {
        remote: "host".into(),
        generation,
        candidate: json!({"candidate": "candidate:1 1 udp 1 10.0.0.2 5000 typ host"}),
    })
    .await
    .unwrap();
    host.expect_call("candidate viewer#1").await;

    tx.send(EndpointEvent::StateChanged {
        remote: "host".into(),
        generation,
        state: EndpointState::Connected,
    })
    .await
    .unwrap();
    viewer
        .expect_event(|e| matches!(e, ClientEvent::PeerConnected { .. }))
        .await;
}

#[tokio::test]
async fn test_host_leaving_ends_the_stream_for_viewers() {
    init_tracing();

    let (addr, service) = start_server().await;
    let host = Participant::connect(addr, "host").await.expect("host");
    let mut viewer = Participant::connect(addr, "viewer").await.expect("viewer");

    host.command(ClientCommand::StartHosting {
        channel_id: "r1".into(),
        source: StreamSource::Display,
    })
    .await;
    wait_for_host(&service, "r1").await;

    viewer
        .command(ClientCommand::Watch {
            channel_id: "r1".into(),
            source: None,
        })
        .await;
    viewer.expect_call("answer host#1").await;

    host.command(ClientCommand::Leave).await;

    let ended = viewer
        .expect_event(|e| matches!(e, ClientEvent::StreamEnded { .. }))
        .await;
    assert!(matches!(ended, ClientEvent::StreamEnded { channel_id } if channel_id.as_str() == "r1"));
    viewer.expect_call("close host#1").await;
}

#[tokio::test]
async fn test_host_connection_loss_ends_the_stream() {
    init_tracing();

    let (addr, service) = start_server().await;
    let host = Participant::connect(addr, "host").await.expect("host");
    let mut viewer = Participant::connect(addr, "viewer").await.expect("viewer");

    host.command(ClientCommand::StartHosting {
        channel_id: "r1".into(),
        source: StreamSource::Display,
    })
    .await;
    wait_for_host(&service, "r1").await;
    viewer
        .command(ClientCommand::Watch {
            channel_id: "r1".into(),
            source: None,
        })
        .await;
    viewer.expect_call("answer host#1").await;

    // Dropping the client drops its relay connection without a goodbye.
    host.task.abort();

    viewer
        .expect_event(|e| matches!(e, ClientEvent::StreamEnded { .. }))
        .await;
}
