use crate::integration::init_tracing;
use crate::utils::{TestRelay, end_stream};

#[tokio::test]
async fn test_host_disconnect_ends_stream() {
    init_tracing();

    let relay = TestRelay::start();
    let host = relay.host("r1", "host").await;
    let a = relay.watch("r1", "A").await;
    let b = relay.watch("r1", "B").await;

    relay.disconnect(host).await;

    assert!(relay.snapshot("r1").await.is_none());
    assert_eq!(relay.signaling.stream_ended_count(a).await, 1);
    assert_eq!(relay.signaling.stream_ended_count(b).await, 1);
}

#[tokio::test]
async fn test_disconnect_matches_explicit_end() {
    init_tracing();

    let ended = TestRelay::start();
    let host = ended.host("r1", "host").await;
    ended.watch("r1", "A").await;
    ended.send(host, end_stream("r1")).await;

    let dropped = TestRelay::start();
    let host = dropped.host("r1", "host").await;
    dropped.watch("r1", "A").await;
    dropped.disconnect(host).await;

    assert_eq!(ended.snapshot("r1").await, dropped.snapshot("r1").await);
}

#[tokio::test]
async fn test_viewers_leaving_empty_the_channel_only_with_host_gone() {
    init_tracing();

    let relay = TestRelay::start();
    let host = relay.host("r1", "host").await;
    let a = relay.watch("r1", "A").await;

    relay
        .send(a, crate::utils::leave("r1", "A"))
        .await;
    assert!(relay.snapshot("r1").await.is_some(), "host still present");

    relay.disconnect(host).await;
    assert!(relay.snapshot("r1").await.is_none());
    assert_eq!(
        relay.signaling.stream_ended_count(a).await,
        0,
        "a viewer that left is no longer notified"
    );
}
