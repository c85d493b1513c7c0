use crate::error::{RelayError, Result};
use crate::protos::RawImage;
use prost::Message;
use zenoh::bytes::Encoding;
use zenoh::key_expr::KeyExpr;
use zenoh::pubsub::Publisher;
use zenoh::qos::{CongestionControl, Priority};
use zenoh::Wait;

/// Output channel for image messages.
pub trait ImagePublisher {
    /// Resolved topic the images go to
    fn topic(&self) -> &str;

    /// Hand one image to the transport. Must not wait for subscribers.
    fn publish(&self, image: &RawImage) -> Result<()>;

    /// Tear down the channel. Calls after the first do nothing.
    fn close(&mut self);
}

/// Map a topic name onto a Zenoh key expression.
///
/// ROS-style names carry a leading slash (`/camera/image_raw`), which Zenoh
/// key expressions do not allow, so surrounding slashes are stripped.
pub fn topic_key_expr(topic: &str) -> Result<KeyExpr<'static>> {
    let trimmed = topic.trim().trim_matches('/');
    if trimmed.is_empty() {
        return Err(RelayError::InvalidTopic {
            topic: topic.to_string(),
            reason: "empty after removing slashes".to_string(),
        });
    }

    KeyExpr::try_from(trimmed.to_string()).map_err(|e| RelayError::InvalidTopic {
        topic: topic.to_string(),
        reason: e.to_string(),
    })
}

/// Publishes protobuf-encoded images on a Zenoh key expression
pub struct ZenohImagePublisher {
    topic: String,
    publisher: Option<Publisher<'static>>,
}

impl ZenohImagePublisher {
    /// Declare the publisher with best-effort, low-latency QoS.
    ///
    /// Congestion drops samples instead of blocking the caller, so a slow
    /// subscriber never stalls the relay.
    pub fn declare(session: &zenoh::Session, topic: &str) -> Result<Self> {
        let key_expr = topic_key_expr(topic)?;
        let topic = key_expr.to_string();

        let publisher = session
            .declare_publisher(key_expr)
            .congestion_control(CongestionControl::Drop)
            .priority(Priority::DataHigh)
            .express(true)
            .wait()
            .map_err(|e| RelayError::Zenoh(format!("Failed to declare publisher: {}", e)))?;

        Ok(Self {
            topic,
            publisher: Some(publisher),
        })
    }
}

impl ImagePublisher for ZenohImagePublisher {
    fn topic(&self) -> &str {
        &self.topic
    }

    fn publish(&self, image: &RawImage) -> Result<()> {
        let publisher = self
            .publisher
            .as_ref()
            .ok_or_else(|| RelayError::Zenoh("publisher is closed".to_string()))?;

        publisher
            .put(image.encode_to_vec())
            .encoding(Encoding::APPLICATION_PROTOBUF)
            .wait()
            .map_err(|e| RelayError::Zenoh(e.to_string()))
    }

    fn close(&mut self) {
        if let Some(publisher) = self.publisher.take() {
            if let Err(e) = publisher.undeclare().wait() {
                log::warn!("Failed to undeclare publisher on '{}': {}", self.topic, e);
            }
        }
    }
}

impl Drop for ZenohImagePublisher {
    fn drop(&mut self) {
        self.close();
    }
}
