//! Hand landmark detection behind a narrow numeric contract.
//!
//! The detector is a black box to the rest of the system: one RGB frame in,
//! zero, one, or two labeled hands out. `HandNet` is the candle-backed
//! implementation over the exported detector weights; `MockHandDetector`
//! exists for tests.

use crate::defaults::{
    DETECTOR_INPUT_SIZE, HAND_KEYPOINTS, HAND_PRESENCE_THRESHOLD, LANDMARK_DIM,
};
use crate::error::{Result, SignstreamError};
use crate::video::Frame;

use candle_core::{D, DType, Device, Tensor};
use candle_nn::{Conv2d, Conv2dConfig, Linear, Module, VarBuilder, conv2d, linear};
use std::path::Path;

/// Which hand a detection belongs to, as labeled by the detector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handedness {
    Left,
    Right,
}

/// One detected hand: its handedness label and 21 (x, y, z) keypoints.
#[derive(Debug, Clone)]
pub struct DetectedHand {
    pub handedness: Handedness,
    pub points: Vec<[f32; 3]>,
}

/// Trait for hand landmark detection.
///
/// This trait allows swapping implementations (real network vs mock).
pub trait HandDetector: Send + Sync {
    /// Detect hands in a single RGB frame.
    ///
    /// Returns at most one entry per handedness. Detection is best-effort;
    /// the detector itself may have internal non-determinism tolerances.
    fn detect(&self, frame: &Frame) -> Result<Vec<DetectedHand>>;

    /// Check if the detector is ready
    fn is_ready(&self) -> bool;
}

/// Channel widths of the HandNet convolutional backbone.
const BACKBONE_CHANNELS: [usize; 5] = [16, 32, 64, 128, 128];

/// Candle-backed hand landmark network.
///
/// Convolutional backbone over a fixed-size RGB input, with two heads:
/// a landmark regressor producing `2 × 21 × 3` coordinates and a presence
/// head scoring each hand slot. Slot 0 is the left hand, slot 1 the right —
/// the exported model's handedness convention.
pub struct HandNet {
    backbone: Vec<Conv2d>,
    landmark_head: Linear,
    presence_head: Linear,
    device: Device,
    model_name: String,
}

impl HandNet {
    /// Load detector weights from a safetensors file.
    pub fn load(path: &Path, device: &Device) -> Result<Self> {
        if !path.exists() {
            return Err(SignstreamError::ModelNotFound {
                path: path.display().to_string(),
            });
        }

        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[path], DType::F32, device).map_err(|e| {
                SignstreamError::ModelLoad {
                    message: format!("read {}: {e}", path.display()),
                }
            })?
        };

        let mut backbone = Vec::with_capacity(BACKBONE_CHANNELS.len());
        let mut in_channels = 3;
        for (i, &out_channels) in BACKBONE_CHANNELS.iter().enumerate() {
            let conv = conv2d(
                in_channels,
                out_channels,
                3,
                Conv2dConfig {
                    stride: 2,
                    padding: 1,
                    ..Default::default()
                },
                vb.pp("backbone").pp(format!("conv{i}")),
            )
            .map_err(|e| SignstreamError::ModelLoad {
                message: format!("backbone conv{i}: {e}"),
            })?;
            backbone.push(conv);
            in_channels = out_channels;
        }

        let features = *BACKBONE_CHANNELS
            .last()
            .unwrap_or(&0);
        let landmark_head = linear(features, LANDMARK_DIM, vb.pp("head").pp("landmarks"))
            .map_err(|e| SignstreamError::ModelLoad {
                message: format!("landmark head: {e}"),
            })?;
        let presence_head = linear(features, 2, vb.pp("head").pp("presence")).map_err(|e| {
            SignstreamError::ModelLoad {
                message: format!("presence head: {e}"),
            }
        })?;

        Ok(Self {
            backbone,
            landmark_head,
            presence_head,
            device: device.clone(),
            model_name: path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "hand_landmarks".to_string()),
        })
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    /// Resize the frame to the network input size and lay it out CHW.
    fn frame_to_tensor(&self, frame: &Frame) -> Result<Tensor> {
        let size = DETECTOR_INPUT_SIZE;
        let resized = frame.resized_rgb(size as u32, size as u32)?;

        let mut chw = vec![0f32; 3 * size * size];
        for (x, y, pixel) in resized.enumerate_pixels() {
            let (x, y) = (x as usize, y as usize);
            for c in 0..3 {
                chw[c * size * size + y * size + x] = pixel[c] as f32 / 255.0;
            }
        }

        Tensor::from_vec(chw, (1, 3, size, size), &self.device).map_err(|e| {
            SignstreamError::Inference {
                message: format!("detector input tensor: {e}"),
            }
        })
    }

    fn forward(&self, input: &Tensor) -> candle_core::Result<(Tensor, Tensor)> {
        let mut x = input.clone();
        for conv in &self.backbone {
            x = conv.forward(&x)?.relu()?;
        }
        // Global average pool over the spatial dims -> (1, features)
        let pooled = x.mean(D::Minus1)?.mean(D::Minus1)?;

        let landmarks = self
            .landmark_head
            .forward(&pooled)?
            .reshape((2, HAND_KEYPOINTS, 3))?;
        let presence = candle_nn::ops::sigmoid(&self.presence_head.forward(&pooled)?)?
            .squeeze(0)?;
        Ok((landmarks, presence))
    }
}

impl HandDetector for HandNet {
    fn detect(&self, frame: &Frame) -> Result<Vec<DetectedHand>> {
        let input = self.frame_to_tensor(frame)?;
        let (landmarks, presence) =
            self.forward(&input)
                .map_err(|e| SignstreamError::Inference {
                    message: format!("hand detector forward: {e}"),
                })?;

        let presence: Vec<f32> =
            presence
                .to_vec1()
                .map_err(|e| SignstreamError::Inference {
                    message: format!("presence scores: {e}"),
                })?;
        let coords: Vec<Vec<Vec<f32>>> =
            landmarks
                .to_vec3()
                .map_err(|e| SignstreamError::Inference {
                    message: format!("landmark coordinates: {e}"),
                })?;

        let mut hands = Vec::new();
        for (slot, handedness) in [(0, Handedness::Left), (1, Handedness::Right)] {
            if presence.get(slot).copied().unwrap_or(0.0) < HAND_PRESENCE_THRESHOLD {
                continue;
            }
            let points = coords[slot]
                .iter()
                .map(|p| [p[0], p[1], p[2]])
                .collect::<Vec<_>>();
            hands.push(DetectedHand { handedness, points });
        }
        Ok(hands)
    }

    fn is_ready(&self) -> bool {
        true
    }
}

/// Mock detector for testing
#[derive(Debug, Clone, Default)]
pub struct MockHandDetector {
    hands: Vec<(Handedness, f32)>,
    should_fail: bool,
}

impl MockHandDetector {
    /// Create a mock that detects no hands at all.
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the mock to report a hand with every coordinate set to `fill`.
    pub fn with_hand(mut self, handedness: Handedness, fill: f32) -> Self {
        self.hands.push((handedness, fill));
        self
    }

    /// Configure the mock to fail on detect
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }
}

impl HandDetector for MockHandDetector {
    fn detect(&self, _frame: &Frame) -> Result<Vec<DetectedHand>> {
        if self.should_fail {
            return Err(SignstreamError::Inference {
                message: "mock detection failure".to_string(),
            });
        }
        Ok(self
            .hands
            .iter()
            .map(|&(handedness, fill)| DetectedHand {
                handedness,
                points: vec![[fill; 3]; HAND_KEYPOINTS],
            })
            .collect())
    }

    fn is_ready(&self) -> bool {
        !self.should_fail
    }
}
