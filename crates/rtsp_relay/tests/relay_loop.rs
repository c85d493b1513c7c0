//! Timer-driven relay loop tests using in-memory sources and publishers

mod common;

use common::{FakeCamera, RecordingPublisher};
use rtsp_relay::{FrameRelayNode, RelayConfig, VideoSourceError};
use std::sync::atomic::Ordering;
use std::time::Duration;

fn config(rate_hz: f64) -> RelayConfig {
    let mut config = RelayConfig::new("camera/image_raw", "rtsp://192.0.2.1/stream");
    config.rate_hz = rate_hz;
    config
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn test_run_publishes_until_shutdown() {
    let camera = FakeCamera::new(32, 24);
    let released = camera.released.clone();
    let publisher = RecordingPublisher::default();

    let node = FrameRelayNode::new(&config(100.0), publisher.clone(), |_| Ok(camera)).unwrap();

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(());
    let handle = tokio::spawn(node.run(shutdown_rx));

    tokio::time::sleep(Duration::from_millis(300)).await;
    shutdown_tx.send(()).unwrap();

    let stats = handle.await.unwrap().unwrap();
    assert!(stats.published > 0, "expected frames to be published");
    assert_eq!(stats.skipped, 0);
    assert_eq!(stats.published as usize, publisher.count());
    assert_eq!(released.load(Ordering::SeqCst), 1);
    assert_eq!(publisher.closed.load(Ordering::SeqCst), 1);

    // Every image has the source dimensions and arrives in read order
    let images = publisher.images.lock().unwrap();
    for (i, image) in images.iter().enumerate() {
        assert_eq!((image.width, image.height), (32, 24));
        assert_eq!(image.header.as_ref().unwrap().sequence, i as u32);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn test_run_with_unavailable_source() {
    let publisher = RecordingPublisher::default();
    let node = FrameRelayNode::<FakeCamera, _>::new(&config(100.0), publisher.clone(), |_| {
        Err(VideoSourceError::Open("could not connect".to_string()))
    })
    .unwrap();

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(());
    let handle = tokio::spawn(node.run(shutdown_rx));

    tokio::time::sleep(Duration::from_millis(200)).await;
    shutdown_tx.send(()).unwrap();

    let stats = handle.await.unwrap().unwrap();
    assert!(stats.ticks > 0);
    assert_eq!(stats.skipped, stats.ticks);
    assert_eq!(stats.published, 0);
    assert_eq!(publisher.count(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn test_shutdown_before_first_tick() {
    let camera = FakeCamera::new(8, 8);
    let released = camera.released.clone();
    let node = FrameRelayNode::new(&config(30.0), RecordingPublisher::default(), |_| {
        Ok(camera)
    })
    .unwrap();

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(());
    shutdown_tx.send(()).unwrap();

    let stats = node.run(shutdown_rx).await.unwrap();
    assert_eq!(stats.ticks, 0);
    assert_eq!(released.load(Ordering::SeqCst), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn test_dropped_sender_stops_loop() {
    let node = FrameRelayNode::new(&config(30.0), RecordingPublisher::default(), |_| {
        Ok(FakeCamera::new(8, 8))
    })
    .unwrap();

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(());
    drop(shutdown_tx);

    let result = tokio::time::timeout(Duration::from_secs(2), node.run(shutdown_rx)).await;
    assert!(result.is_ok(), "loop should stop when the sender is gone");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 1)]
async fn test_slow_reads_do_not_build_a_backlog() {
    // 100 Hz nominal, but every read takes 50 ms
    let camera = FakeCamera::new(8, 8).with_read_delay(Duration::from_millis(50));
    let publisher = RecordingPublisher::default();
    let node = FrameRelayNode::new(&config(100.0), publisher.clone(), |_| Ok(camera)).unwrap();

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(());
    let handle = tokio::spawn(node.run(shutdown_rx));

    tokio::time::sleep(Duration::from_millis(500)).await;
    shutdown_tx.send(()).unwrap();

    let stats = handle.await.unwrap().unwrap();
    // At most one tick per read duration plus slack, far below 50 nominal ticks
    assert!(stats.ticks <= 15, "ticks were queued: {}", stats.ticks);
    assert_eq!(stats.published as usize, publisher.count());
}
