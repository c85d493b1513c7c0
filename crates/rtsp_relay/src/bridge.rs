use crate::frame::Frame;
use crate::protos::{Header, RawImage};
use thiserror::Error;

/// Encoding name carried by every published image
pub const BGR8: &str = "bgr8";

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("Frame {width}x{height} needs {expected} bytes, got {actual}")]
    SizeMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

fn get_pub_time() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// Convert a decoded frame into a `bgr8` image message, consuming it.
pub fn frame_to_image(frame: Frame, frame_id: &str) -> Result<RawImage, BridgeError> {
    let expected = frame.expected_len();
    if frame.data.len() != expected {
        return Err(BridgeError::SizeMismatch {
            width: frame.width,
            height: frame.height,
            expected,
            actual: frame.data.len(),
        });
    }

    Ok(RawImage {
        header: Some(Header {
            acq_time: frame.pts,
            pub_time: get_pub_time(),
            sequence: frame.sequence,
            frame_id: frame_id.to_string(),
        }),
        height: frame.height,
        width: frame.width,
        encoding: BGR8.to_string(),
        is_bigendian: false,
        step: frame.step(),
        data: frame.data,
    })
}
