use crate::integration::init_tracing;
use crate::utils::{TestRelay, end_stream};

#[tokio::test]
async fn test_end_stream_notifies_viewers() {
    init_tracing();

    let relay = TestRelay::start();
    let host = relay.host("r1", "host").await;
    let a = relay.watch("r1", "A").await;
    let b = relay.watch("r1", "B").await;

    relay.send(host, end_stream("r1")).await;

    assert!(relay.snapshot("r1").await.is_none());
    assert_eq!(relay.signaling.stream_ended_count(a).await, 1);
    assert_eq!(relay.signaling.stream_ended_count(b).await, 1);
    assert_eq!(relay.signaling.stream_ended_count(host).await, 0);

    // A second end is a routing miss, not a second notification.
    relay.send(host, end_stream("r1")).await;
    relay.snapshot("r1").await;
    assert_eq!(relay.signaling.stream_ended_count(a).await, 1);
}
