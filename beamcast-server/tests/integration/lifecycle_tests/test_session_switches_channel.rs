use beamcast_core::{ServerMessage, UserId};

use crate::integration::init_tracing;
use crate::utils::{TestRelay, join, viewer_join};

#[tokio::test]
async fn test_viewer_switching_channels_leaves_the_first() {
    init_tracing();

    let relay = TestRelay::start();
    let host1 = relay.host("r1", "h1").await;
    relay.host("r2", "h2").await;
    let viewer = relay.watch("r1", "v").await;

    relay.send(viewer, join("r2", false, "v")).await;
    relay.send(viewer, viewer_join("r2", "v")).await;

    let first = relay.snapshot("r1").await.expect("r1 still hosted");
    assert!(first.viewers.is_empty());
    let second = relay.snapshot("r2").await.expect("r2 hosted");
    assert_eq!(second.viewers, vec![UserId::from("v")]);

    assert!(
        relay
            .signaling
            .received(host1)
            .await
            .contains(&ServerMessage::ViewerLeft {
                channel_id: "r1".into(),
                user_id: "v".into(),
            })
    );
}

#[tokio::test]
async fn test_host_switching_channels_ends_the_first() {
    init_tracing();

    let relay = TestRelay::start();
    let host = relay.host("r1", "h").await;
    let viewer = relay.watch("r1", "v").await;

    relay.send(host, join("r2", true, "h")).await;

    assert!(relay.snapshot("r1").await.is_none());
    assert!(relay.snapshot("r2").await.is_some());
    assert_eq!(relay.signaling.stream_ended_count(viewer).await, 1);
}
