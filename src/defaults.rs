//! Default configuration constants for signstream.
//!
//! This module provides shared constants used across different configuration
//! types to ensure consistency and eliminate duplication.

/// Number of tracked keypoints per hand.
///
/// 21 keypoints per hand is the layout produced by the landmark-detection
/// model (wrist, 4 joints per finger). Both classifier weight sets were
/// trained against this layout.
pub const HAND_KEYPOINTS: usize = 21;

/// Coordinates per keypoint (x, y, z).
pub const COORDS_PER_KEYPOINT: usize = 3;

/// Length of one per-frame landmark feature vector.
///
/// Two hands × 21 keypoints × 3 coordinates = 126. Slots `[0, 63)` hold the
/// left hand, `[63, 126)` the right hand; an undetected hand's half is
/// all-zero. This length is part of the classifier's input contract and is
/// constant for the process lifetime.
pub const LANDMARK_DIM: usize = 2 * HAND_KEYPOINTS * COORDS_PER_KEYPOINT;

/// Window size (in frames) for word and sentence analysis.
pub const WORD_WINDOW_FRAMES: usize = 150;

/// Window size (in frames) for character analysis.
///
/// Single characters are much shorter gestures than words, so half the
/// word-mode window keeps character-mode latency reasonable.
pub const CHAR_WINDOW_FRAMES: usize = 75;

/// Interval between per-session heartbeat events in milliseconds.
pub const HEARTBEAT_INTERVAL_MS: u64 = 2000;

/// Delay before a heartbeat task retries after a failed tick.
///
/// Longer than the normal interval so a persistently failing session does
/// not spin. The task never dies on a tick failure; a dead notifier would be
/// indistinguishable from a dead session.
pub const HEARTBEAT_ERROR_BACKOFF_MS: u64 = 5000;

/// Upper bound on a single classification call in milliseconds.
///
/// No SLA is defined for inference, but an unbounded call would wedge the
/// session it belongs to. A timed-out window is dropped and reported to that
/// session as a processing error.
pub const INFERENCE_TIMEOUT_MS: u64 = 10_000;

/// Frame rate assumed when estimating a clip's duration from its frame count.
pub const ASSUMED_CLIP_FPS: f64 = 60.0;

/// Accepted container extensions for uploaded clips.
pub const ACCEPTED_CLIP_EXTENSIONS: [&str; 3] = ["mp4", "webm", "mov"];

/// Square edge length the hand-landmark network expects as input.
pub const DETECTOR_INPUT_SIZE: usize = 256;

/// Minimum presence score for a hand slot to count as detected.
pub const HAND_PRESENCE_THRESHOLD: f32 = 0.5;

/// Hidden size of each LSTM direction in the sequence classifier.
pub const LSTM_HIDDEN: usize = 128;

/// Number of stacked bidirectional LSTM layers in the sequence classifier.
pub const LSTM_LAYERS: usize = 2;

/// Default gateway bind host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default gateway port.
pub const DEFAULT_PORT: u16 = 8000;

/// Report the compute backend compiled into this build.
///
/// Only one GPU backend can be active at a time; without one, inference runs
/// on the CPU.
pub fn compute_backend() -> &'static str {
    if cfg!(feature = "cuda") { "CUDA" } else { "CPU" }
}
