//! Hand landmark extraction: per-frame detection and feature vector layout.

pub mod detector;
pub mod extractor;
pub mod vector;

pub use detector::{DetectedHand, HandDetector, HandNet, Handedness, MockHandDetector};
pub use extractor::LandmarkExtractor;
pub use vector::LandmarkVector;
