use thiserror::Error;

/// Errors raised while opening or reading a video source
#[derive(Debug, Error)]
pub enum VideoSourceError {
    #[error("GStreamer error: {0}")]
    GStreamer(#[from] gstreamer::glib::Error),
    #[error("GStreamer state change error: {0}")]
    StateChange(#[from] gstreamer::StateChangeError),
    #[error("Failed to get element by name")]
    ElementNotFound,
    #[error("Failed to downcast element")]
    DowncastError,
    #[error("Failed to open stream: {0}")]
    Open(String),
    #[error("Stream error: {0}")]
    Stream(String),
    #[error("End of stream")]
    EndOfStream,
    #[error("No frame within {0} ms")]
    Timeout(u64),
    #[error("Malformed sample: {0}")]
    Sample(String),
    #[error("Source is not open")]
    NotOpen,
}

/// A decoded frame with tightly packed 3-channel BGR pixels
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    /// Pixel data, `height` rows of `step()` bytes
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// Presentation timestamp in nanoseconds
    pub pts: u64,
    pub sequence: u32,
}

impl Frame {
    pub const CHANNELS: u32 = 3;

    /// Row stride in bytes
    pub fn step(&self) -> u32 {
        self.width * Self::CHANNELS
    }

    pub fn expected_len(&self) -> usize {
        self.step() as usize * self.height as usize
    }
}

/// A video source the relay node reads from.
///
/// `read` may block for a bounded time. `release` must be safe to call more
/// than once; calls after the first do nothing.
pub trait VideoSource {
    fn is_open(&self) -> bool;

    fn read(&mut self) -> Result<Frame, VideoSourceError>;

    fn release(&mut self);
}
