use beamcast_core::{ClientMessage, UserId};
use serde_json::Value;

use crate::integration::init_tracing;
use crate::utils::{TestRelay, viewer_join};

#[tokio::test]
async fn test_malformed_message_is_isolated() {
    init_tracing();

    let relay = TestRelay::start();
    let host = relay.host("r1", "host").await;
    let viewer = relay.watch("r1", "v").await;

    relay.send(viewer, viewer_join("", "v")).await;
    relay.send(viewer, viewer_join("r1", "")).await;
    relay
        .send(
            viewer,
            ClientMessage::Offer {
                channel_id: "r1".into(),
                sdp: Value::Null,
                from: "v".into(),
                to: "host".into(),
            },
        )
        .await;

    let snapshot = relay.snapshot("r1").await.expect("channel intact");
    assert_eq!(snapshot.viewers, vec![UserId::from("v")]);
    assert_eq!(relay.signaling.received(host).await.len(), 1);
}
