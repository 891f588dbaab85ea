//! Frame-to-feature-vector extraction.

use crate::error::Result;
use crate::landmark::detector::HandDetector;
use crate::landmark::vector::LandmarkVector;
use crate::video::Frame;

use crate::defaults::HAND_KEYPOINTS;
use std::sync::Arc;
use tracing::{debug, warn};

/// Turns a decoded frame into the fixed-length landmark vector the
/// classifiers consume.
///
/// Detection failures degrade to an all-zero vector instead of failing the
/// stream: a frame where detection broke is indistinguishable, downstream,
/// from a frame with no hands in it, which is exactly the signal the
/// classifiers were trained on.
#[derive(Clone)]
pub struct LandmarkExtractor {
    detector: Arc<dyn HandDetector>,
}

impl LandmarkExtractor {
    pub fn new(detector: Arc<dyn HandDetector>) -> Self {
        Self { detector }
    }

    /// Extract the landmark vector for one frame.
    ///
    /// Never fails: detector errors and malformed detections produce zeros
    /// for the affected hand (or the whole vector).
    pub fn extract(&self, frame: &Frame) -> LandmarkVector {
        let mut vector = LandmarkVector::zeros();

        let hands = match self.detector.detect(frame) {
            Ok(hands) => hands,
            Err(e) => {
                warn!("hand detection failed, emitting zero vector: {e}");
                return vector;
            }
        };

        for hand in hands {
            if hand.points.len() != HAND_KEYPOINTS {
                warn!(
                    "detector returned {} keypoints for {:?} hand, expected {}; skipping",
                    hand.points.len(),
                    hand.handedness,
                    HAND_KEYPOINTS
                );
                continue;
            }
            vector.set_hand(hand.handedness, &hand.points);
        }

        if vector.is_zero() {
            debug!("no hands detected in frame");
        }
        vector
    }

    /// Decode a base64-encoded image payload and extract its landmark vector.
    ///
    /// A payload that cannot be decoded is a client error and is reported as
    /// such rather than degraded to zeros.
    pub fn extract_encoded(&self, encoded: &str) -> Result<LandmarkVector> {
        let frame = Frame::from_base64(encoded)?;
        Ok(self.extract(&frame))
    }

    pub fn is_ready(&self) -> bool {
        self.detector.is_ready()
    }
}
