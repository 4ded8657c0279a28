use crate::integration::init_tracing;
use crate::utils::{TestRelay, viewer_join};

#[tokio::test]
async fn test_host_session_viewer_join_is_refused() {
    init_tracing();

    let relay = TestRelay::start();
    let host = relay.host("r1", "host").await;

    relay.send(host, viewer_join("r1", "alias")).await;

    let snapshot = relay.snapshot("r1").await.expect("channel exists");
    assert!(snapshot.viewers.is_empty());
    assert_eq!(snapshot.host_id, Some("host".into()));
    assert!(relay.signaling.received(host).await.is_empty());
}
