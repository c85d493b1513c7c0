use crate::bridge::frame_to_image;
use crate::capture::RtspCapture;
use crate::config::RelayConfig;
use crate::error::Result;
use crate::frame::{VideoSource, VideoSourceError};
use crate::publisher::{ImagePublisher, ZenohImagePublisher};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;

const STATS_LOG_PERIOD: Duration = Duration::from_secs(5);

/// Result of one timer tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A frame was read and handed to the publisher
    Published { width: u32, height: u32 },
    /// The video source is not open; nothing was read
    SourceUnavailable,
    /// The read failed or the frame could not be converted
    ReadFailed,
    /// The transport rejected the image
    PublishFailed,
}

/// Counters kept over the node's lifetime
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelayStats {
    pub ticks: u64,
    pub published: u64,
    pub skipped: u64,
}

/// Reads frames from one video source and republishes them as images.
///
/// Owns both handles: the source is released and the publisher closed
/// exactly once, either by [`FrameRelayNode::shutdown`] or on drop.
pub struct FrameRelayNode<S: VideoSource, P: ImagePublisher> {
    name: String,
    url: String,
    period: Duration,
    source: Option<S>,
    publisher: P,
    closed: bool,
    stats: RelayStats,
    last_stats_log: Instant,
}

impl FrameRelayNode<RtspCapture, ZenohImagePublisher> {
    /// Declare the Zenoh publisher and open the RTSP stream.
    ///
    /// Blocks while the stream is opened (up to the configured open timeout).
    pub fn connect(session: &zenoh::Session, config: &RelayConfig) -> Result<Self> {
        config.validate()?;
        let publisher = ZenohImagePublisher::declare(session, &config.topic)?;
        Self::new(config, publisher, |url| {
            RtspCapture::open(url, &config.capture)
        })
    }
}

impl<S: VideoSource, P: ImagePublisher> FrameRelayNode<S, P> {
    /// Build the node around an already registered publisher.
    ///
    /// A source that fails to open is logged and leaves the node running
    /// without one; every tick then reports [`TickOutcome::SourceUnavailable`].
    pub fn new<F>(config: &RelayConfig, publisher: P, open_source: F) -> Result<Self>
    where
        F: FnOnce(&str) -> std::result::Result<S, VideoSourceError>,
    {
        config.validate()?;

        log::info!(
            "[{}] publishing images to '{}' at {} Hz",
            config.node_name,
            publisher.topic(),
            config.rate_hz
        );

        let source = match open_source(&config.url) {
            Ok(source) => {
                log::info!("[{}] opened video source {}", config.node_name, config.url);
                Some(source)
            }
            Err(e) => {
                log::error!(
                    "[{}] failed to open video source {}: {}",
                    config.node_name,
                    config.url,
                    e
                );
                None
            }
        };

        Ok(Self {
            name: config.node_name.clone(),
            url: config.url.clone(),
            period: config.tick_period(),
            source,
            publisher,
            closed: false,
            stats: RelayStats::default(),
            last_stats_log: Instant::now(),
        })
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn stats(&self) -> RelayStats {
        self.stats
    }

    pub fn is_source_open(&self) -> bool {
        self.source.as_ref().is_some_and(|s| s.is_open())
    }

    /// Pull one frame and publish it. Every failure is logged and skipped.
    pub fn tick(&mut self) -> TickOutcome {
        self.stats.ticks += 1;
        let outcome = self.relay_one();

        match outcome {
            TickOutcome::Published { .. } => self.stats.published += 1,
            _ => self.stats.skipped += 1,
        }

        if self.last_stats_log.elapsed() >= STATS_LOG_PERIOD {
            log::debug!(
                "[{}] {} published, {} skipped",
                self.name,
                self.stats.published,
                self.stats.skipped
            );
            self.last_stats_log = Instant::now();
        }

        outcome
    }

    fn relay_one(&mut self) -> TickOutcome {
        let source = match self.source.as_mut() {
            Some(source) if source.is_open() => source,
            _ => {
                log::warn!("[{}] video source {} is not open", self.name, self.url);
                return TickOutcome::SourceUnavailable;
            }
        };

        let frame = match source.read() {
            Ok(frame) => frame,
            Err(e) => {
                log::warn!("[{}] failed to read frame: {}", self.name, e);
                return TickOutcome::ReadFailed;
            }
        };

        let image = match frame_to_image(frame, &self.name) {
            Ok(image) => image,
            Err(e) => {
                log::warn!("[{}] dropping frame: {}", self.name, e);
                return TickOutcome::ReadFailed;
            }
        };

        if let Err(e) = self.publisher.publish(&image) {
            log::warn!(
                "[{}] failed to publish on '{}': {}",
                self.name,
                self.publisher.topic(),
                e
            );
            return TickOutcome::PublishFailed;
        }

        TickOutcome::Published {
            width: image.width,
            height: image.height,
        }
    }

    /// Tick at the configured rate until `shutdown_rx` fires, then shut down.
    ///
    /// A tick runs to completion before the next one is awaited. Ticks missed
    /// while a read blocks are skipped rather than replayed. Requires the
    /// multi-threaded tokio runtime.
    pub async fn run(mut self, mut shutdown_rx: watch::Receiver<()>) -> Result<RelayStats> {
        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                biased;

                _ = shutdown_rx.changed() => break,

                _ = ticker.tick() => {
                    tokio::task::block_in_place(|| self.tick());
                }
            }
        }

        log::info!("[{}] shutting down...", self.name);
        self.shutdown();
        Ok(self.stats)
    }

    /// Release the video source and close the publisher. Idempotent.
    pub fn shutdown(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if let Some(mut source) = self.source.take() {
            source.release();
            log::info!("[{}] released video source {}", self.name, self.url);
        }
        self.publisher.close();

        log::info!(
            "[{}] {} ticks, {} published, {} skipped",
            self.name,
            self.stats.ticks,
            self.stats.published,
            self.stats.skipped
        );
    }
}

impl<S: VideoSource, P: ImagePublisher> Drop for FrameRelayNode<S, P> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
