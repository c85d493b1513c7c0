//! Test doubles for the relay node

#![allow(dead_code)]

use rtsp_relay::protos::RawImage;
use rtsp_relay::{Frame, ImagePublisher, VideoSource, VideoSourceError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Endless source of fixed-size frames with an optional per-read delay
pub struct FakeCamera {
    pub width: u32,
    pub height: u32,
    pub read_delay: Duration,
    pub released: Arc<AtomicUsize>,
    sequence: u32,
    open: bool,
}

impl FakeCamera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            read_delay: Duration::ZERO,
            released: Arc::new(AtomicUsize::new(0)),
            sequence: 0,
            open: true,
        }
    }

    pub fn with_read_delay(mut self, delay: Duration) -> Self {
        self.read_delay = delay;
        self
    }
}

impl VideoSource for FakeCamera {
    fn is_open(&self) -> bool {
        self.open
    }

    fn read(&mut self) -> Result<Frame, VideoSourceError> {
        if !self.open {
            return Err(VideoSourceError::NotOpen);
        }
        if !self.read_delay.is_zero() {
            std::thread::sleep(self.read_delay);
        }
        let frame = Frame {
            data: vec![128; (self.width * self.height * 3) as usize],
            width: self.width,
            height: self.height,
            pts: self.sequence as u64 * 33_333_333,
            sequence: self.sequence,
        };
        self.sequence = self.sequence.wrapping_add(1);
        Ok(frame)
    }

    fn release(&mut self) {
        self.open = false;
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Publisher that keeps every image it is given
#[derive(Clone, Default)]
pub struct RecordingPublisher {
    pub images: Arc<Mutex<Vec<RawImage>>>,
    pub closed: Arc<AtomicUsize>,
}

impl RecordingPublisher {
    pub fn count(&self) -> usize {
        self.images.lock().unwrap().len()
    }
}

impl ImagePublisher for RecordingPublisher {
    fn topic(&self) -> &str {
        "camera/image_raw"
    }

    fn publish(&self, image: &RawImage) -> rtsp_relay::Result<()> {
        self.images.lock().unwrap().push(image.clone());
        Ok(())
    }

    fn close(&mut self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Peer-mode session that does not scout for other peers
pub async fn isolated_session() -> zenoh::Session {
    let mut config = zenoh::Config::default();
    config.insert_json5("mode", "\"peer\"").ok();
    config
        .insert_json5("scouting/multicast/enabled", "false")
        .ok();
    zenoh::open(config).await.expect("Failed to open Zenoh session")
}
