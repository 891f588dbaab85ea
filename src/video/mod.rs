//! Video decoding: single encoded frames and whole uploaded clips.

pub mod decoder;
pub mod frame;

pub use decoder::{ClipDecoder, FfmpegClipDecoder, MockClipDecoder};
pub use frame::Frame;
