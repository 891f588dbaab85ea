//! Rolling per-session frame buffer.

use crate::classify::Window;
use crate::landmark::LandmarkVector;

/// Accumulates landmark vectors until a full window is available.
///
/// The buffer hands out exactly one window per `window_size` appended frames
/// and resets itself afterwards; no frame is ever part of two windows.
#[derive(Debug, Clone)]
pub struct SessionBuffer {
    vectors: Vec<LandmarkVector>,
    window_size: usize,
}

impl SessionBuffer {
    pub fn new(window_size: usize) -> Self {
        Self {
            vectors: Vec::with_capacity(window_size),
            window_size,
        }
    }

    /// Append one frame's vector; returns a window when the buffer fills.
    pub fn append(&mut self, vector: LandmarkVector) -> Option<Window> {
        self.vectors.push(vector);
        if self.vectors.len() < self.window_size {
            return None;
        }
        let vectors = std::mem::replace(&mut self.vectors, Vec::with_capacity(self.window_size));
        Some(Window::from_sequence(vectors, self.window_size))
    }

    /// Retarget the buffer for a mode change.
    ///
    /// Any partial progress is discarded: a window is never classified with
    /// frames collected under two different modes.
    pub fn retarget(&mut self, window_size: usize) {
        self.window_size = window_size;
        self.vectors.clear();
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    /// Frames currently accumulated toward the next window.
    pub fn pending(&self) -> usize {
        self.vectors.len()
    }
}
