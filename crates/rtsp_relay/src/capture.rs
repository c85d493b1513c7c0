use crate::config::CaptureSettings;
use crate::frame::{Frame, VideoSource, VideoSourceError};
use gstreamer::prelude::*;
use std::time::{Duration, Instant};

/// Decoded BGR frames out of an RTSP stream.
///
/// The appsink keeps a single buffer and drops older ones, so a slow reader
/// always gets the freshest frame instead of a backlog.
const RTSP_PIPELINE: &str = "rtspsrc name=src ! \
     decodebin ! \
     videoconvert ! \
     video/x-raw,format=BGR ! \
     appsink name=sink max-buffers=1 drop=true sync=false";

struct Stream {
    pipeline: gstreamer::Pipeline,
    appsink: gstreamer_app::AppSink,
}

/// RTSP video source backed by a GStreamer pipeline
pub struct RtspCapture {
    url: String,
    read_timeout_ms: u64,
    stream: Option<Stream>,
    failure: Option<String>,
    sequence: u32,
}

impl RtspCapture {
    /// Open `url` and wait until the stream has started.
    ///
    /// Fails if the pipeline cannot be built, reports an error, or does not
    /// start within `settings.open_timeout_ms`.
    pub fn open(url: &str, settings: &CaptureSettings) -> Result<Self, VideoSourceError> {
        Self::launch(RTSP_PIPELINE, Some(url), settings)
    }

    fn launch(
        description: &str,
        url: Option<&str>,
        settings: &CaptureSettings,
    ) -> Result<Self, VideoSourceError> {
        if !gstreamer::INITIALIZED.load(std::sync::atomic::Ordering::Relaxed) {
            gstreamer::init()?;
        }

        log::debug!("Creating pipeline: {}", description);

        let pipeline = gstreamer::parse::launch(description)?
            .dynamic_cast::<gstreamer::Pipeline>()
            .map_err(|_| VideoSourceError::DowncastError)?;

        if let Some(url) = url {
            let src = pipeline
                .by_name("src")
                .ok_or(VideoSourceError::ElementNotFound)?;
            src.set_property("location", url);
            src.set_property("latency", settings.latency_ms);
        }

        let appsink = pipeline
            .by_name("sink")
            .ok_or(VideoSourceError::ElementNotFound)?
            .dynamic_cast::<gstreamer_app::AppSink>()
            .map_err(|_| VideoSourceError::DowncastError)?;

        let stream = Stream { pipeline, appsink };

        if let Err(e) = stream.start(settings.open_timeout()) {
            stream.stop();
            return Err(e);
        }

        Ok(Self {
            url: url.unwrap_or(description).to_string(),
            read_timeout_ms: settings.read_timeout_ms,
            stream: Some(stream),
            failure: None,
            sequence: 0,
        })
    }
}

impl Stream {
    fn start(&self, timeout: Duration) -> Result<(), VideoSourceError> {
        self.pipeline.set_state(gstreamer::State::Playing)?;

        let bus = self
            .pipeline
            .bus()
            .ok_or_else(|| VideoSourceError::Open("pipeline has no bus".to_string()))?;

        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(VideoSourceError::Open(format!(
                    "stream did not start within {} ms",
                    timeout.as_millis()
                )));
            }

            let Some(message) = bus.timed_pop_filtered(
                gstreamer::ClockTime::from_nseconds(remaining.as_nanos() as u64),
                &[
                    gstreamer::MessageType::Error,
                    gstreamer::MessageType::Eos,
                    gstreamer::MessageType::StreamStart,
                ],
            ) else {
                continue;
            };

            use gstreamer::MessageView;
            match message.view() {
                MessageView::StreamStart(..) => return Ok(()),
                MessageView::Error(err) => {
                    return Err(VideoSourceError::Open(err.error().to_string()));
                }
                MessageView::Eos(..) => {
                    return Err(VideoSourceError::Open(
                        "end of stream before the first frame".to_string(),
                    ));
                }
                _ => {}
            }
        }
    }

    /// Drain pending bus messages, returning the first error or EOS seen.
    fn poll_failure(&self) -> Option<String> {
        let bus = self.pipeline.bus()?;
        while let Some(message) = bus.timed_pop_filtered(
            gstreamer::ClockTime::ZERO,
            &[gstreamer::MessageType::Error, gstreamer::MessageType::Eos],
        ) {
            use gstreamer::MessageView;
            match message.view() {
                MessageView::Error(err) => {
                    return Some(format!(
                        "{} (from {:?})",
                        err.error(),
                        err.src().map(|s| s.path_string())
                    ));
                }
                MessageView::Eos(..) => return Some("end of stream".to_string()),
                _ => {}
            }
        }
        None
    }

    fn stop(&self) {
        let _ = self.pipeline.send_event(gstreamer::event::Eos::new());
        if let Err(e) = self.pipeline.set_state(gstreamer::State::Null) {
            log::warn!("Failed to stop pipeline: {}", e);
        }
    }
}

impl VideoSource for RtspCapture {
    fn is_open(&self) -> bool {
        self.stream.is_some()
    }

    fn read(&mut self) -> Result<Frame, VideoSourceError> {
        let stream = self.stream.as_ref().ok_or(VideoSourceError::NotOpen)?;

        // The pipeline does not recover from an error or EOS; keep reporting it.
        if let Some(failure) = &self.failure {
            return Err(VideoSourceError::Stream(failure.clone()));
        }

        let Some(sample) = stream
            .appsink
            .try_pull_sample(gstreamer::ClockTime::from_mseconds(self.read_timeout_ms))
        else {
            self.failure = stream.poll_failure();
            return Err(match &self.failure {
                Some(failure) => VideoSourceError::Stream(failure.clone()),
                None if stream.appsink.is_eos() => VideoSourceError::EndOfStream,
                None => VideoSourceError::Timeout(self.read_timeout_ms),
            });
        };

        let frame = sample_to_frame(&sample, self.sequence)?;
        self.sequence = self.sequence.wrapping_add(1);
        Ok(frame)
    }

    fn release(&mut self) {
        if let Some(stream) = self.stream.take() {
            stream.stop();
            log::debug!("Released video source {}", self.url);
        }
    }
}

impl Drop for RtspCapture {
    fn drop(&mut self) {
        self.release();
    }
}

/// Copy a BGR sample into a tightly packed frame, dropping any row padding.
fn sample_to_frame(sample: &gstreamer::Sample, sequence: u32) -> Result<Frame, VideoSourceError> {
    let caps = sample
        .caps()
        .ok_or_else(|| VideoSourceError::Sample("missing caps".to_string()))?;
    let info = gstreamer_video::VideoInfo::from_caps(caps)
        .map_err(|e| VideoSourceError::Sample(e.to_string()))?;

    let buffer = sample
        .buffer()
        .ok_or_else(|| VideoSourceError::Sample("missing buffer".to_string()))?;
    let pts = buffer.pts().map(|t| t.nseconds()).unwrap_or(0);

    let map = buffer
        .map_readable()
        .map_err(|_| VideoSourceError::Sample("buffer is not readable".to_string()))?;

    let width = info.width();
    let height = info.height();
    let stride = info.stride()[0] as usize;
    let data = pack_rows(map.as_slice(), width, height, stride)?;

    Ok(Frame {
        data,
        width,
        height,
        pts,
        sequence,
    })
}

fn pack_rows(src: &[u8], width: u32, height: u32, stride: usize) -> Result<Vec<u8>, VideoSourceError> {
    let row_bytes = width as usize * Frame::CHANNELS as usize;
    let rows = height as usize;

    if stride < row_bytes || src.len() < stride * rows.saturating_sub(1) + row_bytes {
        return Err(VideoSourceError::Sample(format!(
            "buffer of {} bytes too small for {}x{} (stride {})",
            src.len(),
            width,
            height,
            stride
        )));
    }

    if stride == row_bytes {
        return Ok(src[..row_bytes * rows].to_vec());
    }

    let mut data = Vec::with_capacity(row_bytes * rows);
    for row in 0..rows {
        let start = row * stride;
        data.extend_from_slice(&src[start..start + row_bytes]);
    }
    Ok(data)
}
