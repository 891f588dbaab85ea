//! Clip decoding for the one-shot translation path.

use crate::defaults::DETECTOR_INPUT_SIZE;
use crate::error::{Result, SignstreamError};
use crate::video::Frame;

use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tracing::debug;

/// Trait for decoding an uploaded clip into its frames.
#[async_trait]
pub trait ClipDecoder: Send + Sync {
    /// Decode every frame of the clip at `path`, in order.
    async fn decode(&self, path: &Path) -> Result<Vec<Frame>>;
}

/// Decodes clips by shelling out to ffmpeg.
///
/// Frames are emitted as raw RGB24 scaled to a fixed square size, so the
/// frame boundaries in the output stream are known without probing the
/// container first.
#[derive(Debug, Clone)]
pub struct FfmpegClipDecoder {
    ffmpeg_path: String,
    output_size: u32,
}

impl Default for FfmpegClipDecoder {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            output_size: DETECTOR_INPUT_SIZE as u32,
        }
    }
}

impl FfmpegClipDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ffmpeg_path(mut self, path: impl Into<String>) -> Self {
        self.ffmpeg_path = path.into();
        self
    }
}

#[async_trait]
impl ClipDecoder for FfmpegClipDecoder {
    async fn decode(&self, path: &Path) -> Result<Vec<Frame>> {
        let size = self.output_size;
        let mut child = Command::new(&self.ffmpeg_path)
            .arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .arg("-i")
            .arg(path)
            .arg("-f")
            .arg("rawvideo")
            .arg("-pix_fmt")
            .arg("rgb24")
            .arg("-vf")
            .arg(format!("scale={size}:{size}"))
            .arg("pipe:1")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| SignstreamError::FrameDecode {
                message: format!("failed to spawn {}: {e}", self.ffmpeg_path),
            })?;

        let mut stdout = child.stdout.take().ok_or_else(|| {
            SignstreamError::FrameDecode {
                message: "decoder stdout unavailable".to_string(),
            }
        })?;

        let mut raw = Vec::new();
        stdout
            .read_to_end(&mut raw)
            .await
            .map_err(|e| SignstreamError::FrameDecode {
                message: format!("reading decoder output: {e}"),
            })?;

        let status = child.wait().await?;
        if !status.success() {
            let mut stderr_text = String::new();
            if let Some(mut stderr) = child.stderr.take() {
                let _ = stderr.read_to_string(&mut stderr_text).await;
            }
            return Err(SignstreamError::FrameDecode {
                message: format!(
                    "decoder exited with {status}: {}",
                    stderr_text.trim()
                ),
            });
        }

        let frame_len = size as usize * size as usize * 3;
        if raw.len() % frame_len != 0 {
            // Trailing partial frame from a truncated stream is dropped.
            debug!(
                "decoder output has {} trailing bytes, dropping partial frame",
                raw.len() % frame_len
            );
        }

        let mut frames = Vec::with_capacity(raw.len() / frame_len);
        for chunk in raw.chunks_exact(frame_len) {
            frames.push(Frame::from_rgb(size, size, chunk.to_vec())?);
        }
        debug!("decoded {} frames from {}", frames.len(), path.display());
        Ok(frames)
    }
}

/// Mock decoder for testing
#[derive(Debug, Default)]
pub struct MockClipDecoder {
    frames: Vec<Frame>,
    should_fail: bool,
    calls: std::sync::Mutex<Vec<std::path::PathBuf>>,
}

impl MockClipDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the mock to yield `count` solid-gray frames.
    pub fn with_frame_count(mut self, count: usize) -> Self {
        self.frames = (0..count)
            .map(|_| {
                Frame::from_rgb(2, 2, vec![128u8; 2 * 2 * 3])
                    .unwrap_or_else(|_| unreachable!("buffer length matches dimensions"))
            })
            .collect();
        self
    }

    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Paths this mock has been asked to decode.
    pub fn calls(&self) -> Vec<std::path::PathBuf> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ClipDecoder for MockClipDecoder {
    async fn decode(&self, path: &Path) -> Result<Vec<Frame>> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(path.to_path_buf());
        }
        if self.should_fail {
            return Err(SignstreamError::FrameDecode {
                message: "mock decode failure".to_string(),
            });
        }
        Ok(self.frames.clone())
    }
}
