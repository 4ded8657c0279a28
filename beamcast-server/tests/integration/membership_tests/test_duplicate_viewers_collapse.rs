use beamcast_core::{SessionId, UserId};

use crate::integration::init_tracing;
use crate::utils::{TestRelay, join, viewer_join};

#[tokio::test]
async fn test_duplicate_viewers_collapse() {
    init_tracing();

    let relay = TestRelay::start();
    relay.host("r1", "host").await;

    let names = ["a", "b", "a", "c", "b"];
    let mut sessions = std::collections::HashMap::new();
    for name in names {
        let session = *sessions.entry(name).or_insert_with(SessionId::new);
        relay.send(session, join("r1", false, name)).await;
        relay.send(session, viewer_join("r1", name)).await;
    }

    let snapshot = relay.snapshot("r1").await.expect("channel exists");
    assert_eq!(
        snapshot.viewers,
        vec![UserId::from("a"), UserId::from("b"), UserId::from("c")]
    );
    assert_eq!(snapshot.host_id, Some(UserId::from("host")));
    assert_eq!(snapshot.members, 4, "host plus three viewer sessions");
}

#[tokio::test]
async fn test_repeated_viewer_join_keeps_size() {
    init_tracing();

    let relay = TestRelay::start();
    relay.host("r1", "host").await;
    let viewer = relay.watch("r1", "a").await;

    relay.send(viewer, viewer_join("r1", "a")).await;

    let snapshot = relay.snapshot("r1").await.expect("channel exists");
    assert_eq!(snapshot.viewers.len(), 1);
}
