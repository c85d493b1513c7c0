//! RTSP to Zenoh frame relay.
//!
//! Pulls decoded frames from a single RTSP stream on a fixed cadence and
//! republishes each one as an uncompressed `RawImage` protobuf message on a
//! Zenoh topic. Read failures are logged and skipped; the relay never
//! reconnects on its own.

pub mod bridge;
pub mod capture;
pub mod cli;
pub mod config;
pub mod error;
pub mod frame;
pub mod node;
pub mod publisher;
pub mod session;
pub mod shutdown;

#[cfg(test)]
mod test_log;

pub mod protos {
    include!(concat!(env!("OUT_DIR"), "/rtsp_relay.v1.rs"));
}

pub use config::{CaptureSettings, ConfigError, RelayConfig};
pub use error::{RelayError, Result};
pub use frame::{Frame, VideoSource, VideoSourceError};
pub use node::{FrameRelayNode, RelayStats, TickOutcome};
pub use publisher::{ImagePublisher, ZenohImagePublisher};
