//! Fixed-length per-frame landmark feature vector.

use crate::defaults::{COORDS_PER_KEYPOINT, HAND_KEYPOINTS, LANDMARK_DIM};
use crate::landmark::detector::Handedness;

/// Length in floats of one hand's half of the vector.
const HAND_SLOT_LEN: usize = HAND_KEYPOINTS * COORDS_PER_KEYPOINT;

/// Per-frame feature vector of `2 * 21 * 3 = 126` floats.
///
/// Slots `[0, 63)` hold the left hand's keypoints, `[63, 126)` the right
/// hand's, each as consecutive (x, y, z) triples. A hand that was not
/// detected leaves its half all-zero. The left/right placement is part of
/// the classifier's training contract and must never be swapped.
#[derive(Debug, Clone, PartialEq)]
pub struct LandmarkVector {
    values: Vec<f32>,
}

impl LandmarkVector {
    /// All-zero vector: no hands detected (or frame could not be decoded).
    pub fn zeros() -> Self {
        Self {
            values: vec![0.0; LANDMARK_DIM],
        }
    }

    /// Write one hand's keypoints into its fixed half of the vector.
    ///
    /// `points` must contain exactly [`HAND_KEYPOINTS`] entries; extra or
    /// missing points are a detector contract violation and are ignored by
    /// the caller before reaching here.
    pub fn set_hand(&mut self, handedness: Handedness, points: &[[f32; 3]]) {
        debug_assert_eq!(points.len(), HAND_KEYPOINTS);
        let base = match handedness {
            Handedness::Left => 0,
            Handedness::Right => HAND_SLOT_LEN,
        };
        for (i, point) in points.iter().take(HAND_KEYPOINTS).enumerate() {
            let offset = base + i * COORDS_PER_KEYPOINT;
            self.values[offset] = point[0];
            self.values[offset + 1] = point[1];
            self.values[offset + 2] = point[2];
        }
    }

    /// The left hand's half of the vector.
    pub fn left_hand(&self) -> &[f32] {
        &self.values[..HAND_SLOT_LEN]
    }

    /// The right hand's half of the vector.
    pub fn right_hand(&self) -> &[f32] {
        &self.values[HAND_SLOT_LEN..]
    }

    /// Whether the given hand's slots are all zero (hand absent).
    pub fn hand_is_zero(&self, handedness: Handedness) -> bool {
        let half = match handedness {
            Handedness::Left => self.left_hand(),
            Handedness::Right => self.right_hand(),
        };
        half.iter().all(|&v| v == 0.0)
    }

    /// Whether the whole vector is zero.
    pub fn is_zero(&self) -> bool {
        self.values.iter().all(|&v| v == 0.0)
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl Default for LandmarkVector {
    fn default() -> Self {
        Self::zeros()
    }
}
